use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use world::{
    load_map, Camera2D, MapFileFormat, MapStorageError, PixelPosition, SpriteLibrary, Tile,
    TileGrid, TileGridError,
};

use super::cli::CliOptions;
use super::config::{load_game_config, ConfigError, GameConfig, ScatterRule};
use super::paths::{resolve_app_paths, AppPaths};

pub(crate) struct AppWiring {
    pub(crate) config: GameConfig,
    pub(crate) map: TileGrid,
    pub(crate) camera: Camera2D,
    pub(crate) rng: StdRng,
    pub(crate) save_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    LoadMap(#[from] MapStorageError),
    #[error("failed to create map: {0}")]
    CreateMap(#[from] TileGridError),
}

pub(crate) fn build_app(options: CliOptions) -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Tile World Startup ===");

    let mut config = match &options.config_path {
        Some(path) => load_game_config(path)?,
        None => GameConfig::default(),
    };
    if let Some(frames) = options.frames {
        config.frames = frames;
    }
    if let Some(seed) = options.seed {
        config.rng_seed = Some(seed);
    }

    let app_paths = match resolve_app_paths() {
        Ok(paths) => {
            info!(root = %paths.root.display(), "project_root_resolved");
            Some(paths)
        }
        Err(error) => {
            warn!(error = %error, "project_root_unresolved");
            None
        }
    };
    let in_saves = |path: PathBuf| match &app_paths {
        Some(paths) => paths.save_file(&path),
        None => path,
    };
    let load_path = options.load_path.map(in_saves);
    let save_path = options.save_path.map(in_saves);

    let sprites = load_sprites(options.sprites_dir, app_paths.as_ref());
    let mut rng = match config.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let map = match &load_path {
        Some(path) => {
            let mut map = load_map(path, MapFileFormat::from_path(path))?;
            let reload = map.reload_graphics(&sprites);
            debug!(
                resolved = reload.resolved,
                unresolved = reload.unresolved,
                "loaded_map_graphics_resolved"
            );
            map
        }
        None => {
            let mut map = TileGrid::new(config.map_size(), &sprites)?;
            scatter_tiles(&mut map, &config, &sprites, &mut rng);
            map
        }
    };

    let mut camera = Camera2D::new(PixelPosition::default(), config.window_size());
    let spawn = map.random_position(&config.world, &mut rng);
    camera.center_on(spawn);
    camera.clamp_within(map.pixel_size(&config.world));
    info!(
        map_width = map.tile_count_x(),
        map_height = map.tile_count_y(),
        spawn_x = spawn.x,
        spawn_y = spawn.y,
        "world_ready"
    );

    Ok(AppWiring {
        config,
        map,
        camera,
        rng,
        save_path,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn load_sprites(sprites_dir: Option<PathBuf>, app_paths: Option<&AppPaths>) -> SpriteLibrary {
    let fallback = app_paths.map(|paths| paths.sprites_dir.clone());
    let Some(dir) = sprites_dir.or(fallback) else {
        warn!("sprite_dir_unknown_using_placeholders");
        return SpriteLibrary::new();
    };
    match SpriteLibrary::load_dir(&dir) {
        Ok(library) => {
            info!(dir = %dir.display(), sprite_count = library.len(), "sprites_loaded");
            library
        }
        Err(error) => {
            warn!(error = %error, "sprite_library_unavailable_using_placeholders");
            SpriteLibrary::new()
        }
    }
}

/// Paints each rule's tiles at random pixel positions, snapped to the cell
/// under each sample. Rules with an unusable key are skipped.
pub(crate) fn scatter_tiles<R: rand::Rng + ?Sized>(
    map: &mut TileGrid,
    config: &GameConfig,
    sprites: &SpriteLibrary,
    rng: &mut R,
) -> usize {
    let mut painted = 0usize;
    for ScatterRule { sprite_key, count } in &config.scatter {
        let tile = match Tile::with_key(sprite_key, sprites) {
            Ok(tile) => tile,
            Err(error) => {
                warn!(sprite_key = %sprite_key, error = %error, "scatter_rule_skipped");
                continue;
            }
        };
        for _ in 0..*count {
            let cell = config
                .world
                .pixel_to_grid(map.random_position(&config.world, rng));
            if !map.grid_within_bounds(cell.x, cell.y) {
                continue;
            }
            if map.set_tile(cell, tile.clone()).is_ok() {
                painted += 1;
            }
        }
    }
    debug!(painted, "scatter_tiles_painted");
    painted
}

#[cfg(test)]
mod tests {
    use world::{GridSize, WorldContext, DEFAULT_TILE_KEY};

    use super::*;

    #[test]
    fn scatter_paints_only_valid_rules_inside_the_map() {
        let sprites = SpriteLibrary::new();
        let mut map = TileGrid::new(GridSize::new(8, 6), &sprites).expect("map");
        let config = GameConfig {
            world: WorldContext::new(16).expect("context"),
            scatter: vec![
                ScatterRule {
                    sprite_key: "tile/water".to_string(),
                    count: 20,
                },
                ScatterRule {
                    sprite_key: "bad,key".to_string(),
                    count: 20,
                },
            ],
            ..GameConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(3);

        let painted = scatter_tiles(&mut map, &config, &sprites, &mut rng);
        assert_eq!(painted, 20);
        assert!(map
            .tiles()
            .iter()
            .all(|tile| tile.sprite_key() == DEFAULT_TILE_KEY || tile.sprite_key() == "tile/water"));
        assert!(map
            .tiles()
            .iter()
            .any(|tile| tile.sprite_key() == "tile/water"));
    }
}
