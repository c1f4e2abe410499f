use std::collections::BTreeMap;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

use crate::camera::Camera;
use crate::codec::{self, MapFormatError};
use crate::config::WorldContext;
use crate::geometry::{GridPosition, GridSize, PixelPosition, PixelSize};
use crate::persist::Persistable;
use crate::sprite::SpriteSource;
use crate::tile::Tile;
use crate::viewport::{visible_window, ViewportWindow};

/// Fixed-size rectangular map of independently owned tiles.
///
/// Storage is row-major: the tile at `(x, y)` lives at `y * width + x`.
/// Every accessor is bounds-guarded; writes outside the grid fail with
/// [`TileGridError::OutOfBounds`] instead of clamping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    size: GridSize,
    tiles: Vec<Tile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TileGridError {
    #[error("grid dimensions must be at least 1x1, got {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },
    #[error("grid position ({x}, {y}) is outside {width}x{height}")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
}

/// Outcome of resolving every tile's sprite against a source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphicsReload {
    pub resolved: usize,
    pub unresolved: usize,
    /// Distinct keys the source could not resolve, sorted.
    pub missing_keys: Vec<String>,
}

impl TileGrid {
    /// Allocates `size.width * size.height` distinct tiles, each resolved
    /// against `sprite_source`.
    pub fn new<S: SpriteSource + ?Sized>(
        size: GridSize,
        sprite_source: &S,
    ) -> Result<Self, TileGridError> {
        ensure_non_empty(size)?;
        let mut tiles = (0..size.cell_count())
            .map(|_| Tile::default())
            .collect::<Vec<_>>();
        let reload = resolve_tiles(&mut tiles, sprite_source);
        debug!(
            width = size.width,
            height = size.height,
            resolved = reload.resolved,
            "tile_grid_created"
        );
        Ok(Self { size, tiles })
    }

    /// Builds a grid from row-major `tiles`.
    pub fn from_tiles(size: GridSize, tiles: Vec<Tile>) -> Result<Self, TileGridError> {
        ensure_non_empty(size)?;
        let expected = size.cell_count();
        let actual = tiles.len();
        if expected != actual {
            return Err(TileGridError::TileCountMismatch { expected, actual });
        }
        Ok(Self { size, tiles })
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn tile_count_x(&self) -> u32 {
        self.size.width
    }

    pub fn tile_count_y(&self) -> u32 {
        self.size.height
    }

    pub fn width_px(&self, context: &WorldContext) -> u32 {
        self.pixel_size(context).width
    }

    pub fn height_px(&self, context: &WorldContext) -> u32 {
        self.pixel_size(context).height
    }

    pub fn pixel_size(&self, context: &WorldContext) -> PixelSize {
        context.grid_to_pixel_size(self.size)
    }

    /// All tiles, row-major. The slice cannot grow or shrink the grid.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridPosition, &Tile)> + '_ {
        let width = self.size.width as usize;
        self.tiles.iter().enumerate().map(move |(index, tile)| {
            let position = GridPosition {
                x: (index % width) as i32,
                y: (index / width) as i32,
            };
            (position, tile)
        })
    }

    pub fn grid_within_bounds(&self, grid_x: i32, grid_y: i32) -> bool {
        self.size.contains(GridPosition {
            x: grid_x,
            y: grid_y,
        })
    }

    fn index_of(&self, position: GridPosition) -> Option<usize> {
        if !self.size.contains(position) {
            return None;
        }
        Some(position.y as usize * self.size.width as usize + position.x as usize)
    }

    pub fn tile(&self, position: GridPosition) -> Option<&Tile> {
        self.index_of(position)
            .and_then(|index| self.tiles.get(index))
    }

    pub fn tile_mut(&mut self, position: GridPosition) -> Option<&mut Tile> {
        let index = self.index_of(position)?;
        self.tiles.get_mut(index)
    }

    /// Replaces the tile at `position` and returns the previous one.
    pub fn set_tile(&mut self, position: GridPosition, tile: Tile) -> Result<Tile, TileGridError> {
        let size = self.size;
        let slot = self
            .tile_mut(position)
            .ok_or(TileGridError::OutOfBounds {
                x: position.x,
                y: position.y,
                width: size.width,
                height: size.height,
            })?;
        Ok(std::mem::replace(slot, tile))
    }

    /// Asks every tile to re-resolve its sprite. Tiles whose key is missing
    /// keep what they had; each missing key is warned about once.
    pub fn reload_graphics<S: SpriteSource + ?Sized>(
        &mut self,
        sprite_source: &S,
    ) -> GraphicsReload {
        let reload = resolve_tiles(&mut self.tiles, sprite_source);
        debug!(
            resolved = reload.resolved,
            unresolved = reload.unresolved,
            "tile_grid_graphics_reloaded"
        );
        reload
    }

    /// Uniform sample over the map's continuous pixel area,
    /// `[0, width_px) x [0, height_px)`.
    pub fn random_position<R: Rng + ?Sized>(
        &self,
        context: &WorldContext,
        rng: &mut R,
    ) -> PixelPosition {
        let size = self.pixel_size(context);
        PixelPosition {
            x: sample_axis(rng, size.width),
            y: sample_axis(rng, size.height),
        }
    }

    pub fn visible_window<C: Camera + ?Sized>(
        &self,
        camera: &C,
        context: &WorldContext,
    ) -> ViewportWindow {
        visible_window(camera.position(), camera.size(), self.size, context)
    }
}

impl Persistable for TileGrid {
    type Error = MapFormatError;

    fn serialize(&self) -> String {
        codec::serialize_grid(self)
    }

    fn apply_serialized_data(&mut self, data: &str) -> Result<(), Self::Error> {
        *self = codec::deserialize_grid(data)?;
        Ok(())
    }
}

fn ensure_non_empty(size: GridSize) -> Result<(), TileGridError> {
    if size.is_empty() {
        return Err(TileGridError::EmptyDimensions {
            width: size.width,
            height: size.height,
        });
    }
    Ok(())
}

fn resolve_tiles<S: SpriteSource + ?Sized>(
    tiles: &mut [Tile],
    sprite_source: &S,
) -> GraphicsReload {
    let mut resolved = 0usize;
    let mut missing = BTreeMap::<String, usize>::new();
    for tile in tiles.iter_mut() {
        if tile.reload_graphics(sprite_source) {
            resolved += 1;
        } else if let Some(count) = missing.get_mut(tile.sprite_key()) {
            *count += 1;
        } else {
            missing.insert(tile.sprite_key().to_string(), 1);
        }
    }

    for (sprite_key, tile_count) in &missing {
        warn!(sprite_key = %sprite_key, tile_count, "tile_sprite_missing");
    }
    let unresolved = missing.values().sum();
    GraphicsReload {
        resolved,
        unresolved,
        missing_keys: missing.into_keys().collect(),
    }
}

fn sample_axis<R: Rng + ?Sized>(rng: &mut R, extent_px: u32) -> f32 {
    if extent_px == 0 {
        return 0.0;
    }
    let extent = extent_px as f32;
    let sample = rng.gen_range(0.0..extent);
    // f32 rounding can land exactly on the upper bound for large extents.
    if sample < extent {
        sample
    } else {
        largest_below(extent)
    }
}

fn largest_below(value: f32) -> f32 {
    if value <= 0.0 {
        return 0.0;
    }
    f32::from_bits(value.to_bits() - 1)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::sprite::{Sprite, SpriteLibrary};
    use crate::tile::DEFAULT_TILE_KEY;

    fn sprites() -> SpriteLibrary {
        SpriteLibrary::new()
            .with_sprite(DEFAULT_TILE_KEY, Sprite::solid(1, 1, [0, 200, 0, 255]))
            .expect("grass")
            .with_sprite("tile/water", Sprite::solid(1, 1, [0, 0, 200, 255]))
            .expect("water")
    }

    fn grid(width: u32, height: u32) -> TileGrid {
        TileGrid::new(GridSize::new(width, height), &sprites()).expect("grid")
    }

    #[test]
    fn construction_fills_every_cell() {
        for (width, height) in [(1, 1), (3, 2), (7, 5)] {
            let grid = grid(width, height);
            assert_eq!(grid.tiles().len(), (width * height) as usize);
            assert!(grid
                .tiles()
                .iter()
                .all(|tile| tile.sprite_key() == DEFAULT_TILE_KEY));
        }
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let err = TileGrid::new(GridSize::new(0, 3), &sprites()).expect_err("err");
        assert_eq!(
            err,
            TileGridError::EmptyDimensions {
                width: 0,
                height: 3
            }
        );
    }

    #[test]
    fn mutating_one_cell_leaves_neighbours_alone() {
        let mut grid = grid(3, 3);
        let target = GridPosition::new(1, 1);
        grid.tile_mut(target)
            .expect("tile")
            .apply_serialized_data("tile/water")
            .expect("apply");

        for (position, tile) in grid.iter() {
            let expected = if position == target {
                "tile/water"
            } else {
                DEFAULT_TILE_KEY
            };
            assert_eq!(tile.sprite_key(), expected, "{position:?}");
        }
    }

    #[test]
    fn scenario_pixel_dimensions_scale_by_tile_size() {
        let grid = grid(3, 2);
        let context = WorldContext::new(32).expect("context");
        assert_eq!(grid.width_px(&context), 96);
        assert_eq!(grid.height_px(&context), 64);
        assert_eq!(grid.tile_count_x(), 3);
        assert_eq!(grid.tile_count_y(), 2);
    }

    #[test]
    fn grid_within_bounds_matches_half_open_ranges() {
        let grid = grid(4, 3);
        for x in -3..8 {
            for y in -3..6 {
                let expected = (0..4).contains(&x) && (0..3).contains(&y);
                assert_eq!(grid.grid_within_bounds(x, y), expected, "({x}, {y})");
            }
        }
        assert!(!grid.grid_within_bounds(i32::MIN, 0));
        assert!(!grid.grid_within_bounds(0, i32::MAX));
    }

    #[test]
    fn set_tile_replaces_and_returns_previous() {
        let sprites = sprites();
        let mut grid = grid(2, 2);
        let water = Tile::with_key("tile/water", &sprites).expect("water");
        let previous = grid
            .set_tile(GridPosition::new(1, 0), water.clone())
            .expect("set");
        assert_eq!(previous.sprite_key(), DEFAULT_TILE_KEY);
        assert_eq!(grid.tile(GridPosition::new(1, 0)), Some(&water));
        assert_eq!(grid.tiles()[1], water);
    }

    #[test]
    fn set_tile_out_of_bounds_fails_fast() {
        let mut grid = grid(2, 2);
        let before = grid.clone();
        for position in [
            GridPosition::new(-1, 0),
            GridPosition::new(0, -1),
            GridPosition::new(2, 0),
            GridPosition::new(0, 2),
        ] {
            let err = grid
                .set_tile(position, Tile::default())
                .expect_err("out of bounds");
            assert_eq!(
                err,
                TileGridError::OutOfBounds {
                    x: position.x,
                    y: position.y,
                    width: 2,
                    height: 2
                }
            );
            assert!(grid.tile(position).is_none());
        }
        assert_eq!(grid, before);
    }

    #[test]
    fn from_tiles_rejects_invalid_tile_count() {
        let err = TileGrid::from_tiles(GridSize::new(2, 2), vec![Tile::default(); 3])
            .expect_err("err");
        assert_eq!(
            err,
            TileGridError::TileCountMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn iter_reports_row_major_positions() {
        let tiles = ["a", "b", "c", "d", "e", "f"]
            .into_iter()
            .map(|key| Tile::unresolved(key).expect("tile"))
            .collect::<Vec<_>>();
        let grid = TileGrid::from_tiles(GridSize::new(3, 2), tiles).expect("grid");
        assert_eq!(
            grid.tile(GridPosition::new(2, 1)).map(Tile::sprite_key),
            Some("f")
        );
        let positions = grid.iter().map(|(position, _)| position).collect::<Vec<_>>();
        assert_eq!(positions[3], GridPosition::new(0, 1));
    }

    #[test]
    fn reload_graphics_swaps_sprites_and_keeps_missing() {
        let mut grid = grid(2, 1);
        let original = grid.tiles()[0]
            .graphics_handle()
            .cloned()
            .expect("resolved");

        let replacement = SpriteLibrary::new()
            .with_sprite(DEFAULT_TILE_KEY, Sprite::solid(1, 1, [255, 0, 0, 255]))
            .expect("replacement");
        assert_eq!(grid.reload_graphics(&replacement).resolved, 2);
        let swapped = grid.tiles()[0].graphics_handle().expect("swapped");
        assert!(!Arc::ptr_eq(&original, swapped));

        assert_eq!(grid.reload_graphics(&SpriteLibrary::new()).resolved, 0);
        assert!(grid.tiles().iter().all(|tile| tile.graphics().is_some()));
    }

    #[test]
    fn empty_library_reports_every_tile_once_per_key() {
        let mut grid = TileGrid::new(GridSize::new(4, 3), &SpriteLibrary::new()).expect("grid");
        grid.set_tile(GridPosition::new(2, 1), Tile::unresolved("tile/water").expect("water"))
            .expect("set");
        grid.set_tile(GridPosition::new(3, 2), Tile::unresolved("tile/water").expect("water"))
            .expect("set");

        let reload = grid.reload_graphics(&SpriteLibrary::new());
        assert_eq!(
            reload,
            GraphicsReload {
                resolved: 0,
                unresolved: 12,
                missing_keys: vec![DEFAULT_TILE_KEY.to_string(), "tile/water".to_string()],
            }
        );
        assert!(grid.tiles().iter().all(|tile| tile.graphics().is_none()));

        let reload = grid.reload_graphics(&sprites());
        assert_eq!((reload.resolved, reload.unresolved), (12, 0));
        assert!(reload.missing_keys.is_empty());
    }

    #[test]
    fn random_positions_stay_inside_pixel_area() {
        let grid = grid(3, 2);
        let context = WorldContext::new(32).expect("context");
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let position = grid.random_position(&context, &mut rng);
            assert!((0.0..96.0).contains(&position.x), "{position:?}");
            assert!((0.0..64.0).contains(&position.y), "{position:?}");
        }
    }

    #[test]
    fn largest_below_steps_one_ulp_down() {
        assert_eq!(largest_below(16_777_216.0), 16_777_215.0);
        assert_eq!(largest_below(0.0), 0.0);
        assert!(largest_below(96.0) < 96.0);
    }

    #[test]
    fn visible_window_uses_grid_dimensions() {
        let grid = grid(4, 4);
        let context = WorldContext::new(32).expect("context");
        let camera = crate::camera::Camera2D::new(
            PixelPosition::new(0.0, 0.0),
            PixelSize::new(640, 640),
        );
        let window = grid.visible_window(&camera, &context);
        assert_eq!(window.start, GridPosition::new(0, 0));
        assert_eq!(window.end, GridPosition::new(4, 4));
    }

    #[test]
    fn failed_apply_keeps_existing_grid() {
        let mut grid = grid(2, 2);
        let before = grid.clone();
        assert!(grid.apply_serialized_data("GameMap|2|2|#broken").is_err());
        assert_eq!(grid, before);

        grid.apply_serialized_data("GameMap|1|2|#a,b,;")
            .expect("apply");
        assert_eq!(grid.size(), GridSize::new(1, 2));
        assert_eq!(
            grid.tile(GridPosition::new(0, 1)).map(Tile::sprite_key),
            Some("b")
        );
    }
}
