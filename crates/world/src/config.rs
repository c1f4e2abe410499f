use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{GridPosition, GridSize, PixelPosition, PixelSize};

pub const DEFAULT_TILE_SIZE_PX: u32 = 64;
pub const DEFAULT_VIEWPORT_MARGIN_TILES: u32 = 2;

/// Scale and culling parameters shared by every unit conversion in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldContext {
    pub tile_size_px: u32,
    pub viewport_margin_tiles: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WorldContextError {
    #[error("tile size must be greater than zero pixels")]
    ZeroTileSize,
}

impl Default for WorldContext {
    fn default() -> Self {
        Self {
            tile_size_px: DEFAULT_TILE_SIZE_PX,
            viewport_margin_tiles: DEFAULT_VIEWPORT_MARGIN_TILES,
        }
    }
}

impl WorldContext {
    pub fn new(tile_size_px: u32) -> Result<Self, WorldContextError> {
        let context = Self {
            tile_size_px,
            ..Self::default()
        };
        context.validate()?;
        Ok(context)
    }

    pub fn with_viewport_margin(mut self, viewport_margin_tiles: u32) -> Self {
        self.viewport_margin_tiles = viewport_margin_tiles;
        self
    }

    pub fn validate(&self) -> Result<(), WorldContextError> {
        if self.tile_size_px == 0 {
            return Err(WorldContextError::ZeroTileSize);
        }
        Ok(())
    }

    pub fn grid_to_pixel_size(&self, size: GridSize) -> PixelSize {
        PixelSize {
            width: size.width.saturating_mul(self.tile_size_px),
            height: size.height.saturating_mul(self.tile_size_px),
        }
    }

    /// Cell containing `position`. Floors, so pixels left of the origin land
    /// in negative cells.
    pub fn pixel_to_grid(&self, position: PixelPosition) -> GridPosition {
        let tile = self.tile_size_f32();
        GridPosition {
            x: (position.x / tile).floor() as i32,
            y: (position.y / tile).floor() as i32,
        }
    }

    /// Top-left pixel corner of the cell at `position`.
    pub fn grid_to_pixel(&self, position: GridPosition) -> PixelPosition {
        let tile = self.tile_size_f32();
        PixelPosition {
            x: position.x as f32 * tile,
            y: position.y as f32 * tile,
        }
    }

    pub(crate) fn tile_size_f32(&self) -> f32 {
        self.tile_size_px.max(1) as f32
    }
}
