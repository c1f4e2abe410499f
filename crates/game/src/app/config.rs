use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use world::{GridSize, PixelSize, WorldContext, WorldContextError};

/// Largest map the demo will allocate (2048 x 2048 tiles).
pub(crate) const MAX_MAP_CELLS: usize = 2048 * 2048;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameConfig {
    pub(crate) world: WorldContext,
    pub(crate) map_width_tiles: u32,
    pub(crate) map_height_tiles: u32,
    pub(crate) window_width: u32,
    pub(crate) window_height: u32,
    pub(crate) frames: u32,
    pub(crate) target_tps: u32,
    pub(crate) camera_speed_px_per_frame: f32,
    pub(crate) metrics_log_interval_frames: u32,
    pub(crate) cast_interval_frames: u32,
    pub(crate) rng_seed: Option<u64>,
    pub(crate) scatter: Vec<ScatterRule>,
}

/// Paints `count` randomly placed cells with `sprite_key` on a fresh map.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ScatterRule {
    pub(crate) sprite_key: String,
    pub(crate) count: u32,
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("config file {path} has invalid world settings: {source}")]
    World {
        path: PathBuf,
        #[source]
        source: WorldContextError,
    },
    #[error("config file {path} sets an empty map ({width}x{height} tiles)")]
    EmptyMap {
        path: PathBuf,
        width: u32,
        height: u32,
    },
    #[error("config file {path} sets a {width}x{height} map; at most {max} tiles are allowed")]
    MapTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max: usize,
    },
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world: WorldContext::default(),
            map_width_tiles: 64,
            map_height_tiles: 48,
            window_width: 1280,
            window_height: 720,
            frames: 600,
            target_tps: 60,
            camera_speed_px_per_frame: 4.0,
            metrics_log_interval_frames: 120,
            cast_interval_frames: 90,
            rng_seed: None,
            scatter: vec![
                ScatterRule {
                    sprite_key: "tile/dirt".to_string(),
                    count: 48,
                },
                ScatterRule {
                    sprite_key: "tile/water".to_string(),
                    count: 24,
                },
            ],
        }
    }
}

impl GameConfig {
    pub(crate) fn map_size(&self) -> GridSize {
        GridSize::new(self.map_width_tiles, self.map_height_tiles)
    }

    pub(crate) fn window_size(&self) -> PixelSize {
        PixelSize::new(self.window_width, self.window_height)
    }

    pub(crate) fn frame_dt_seconds(&self) -> f32 {
        1.0 / self.target_tps.max(1) as f32
    }
}

pub(crate) fn load_game_config(path: &Path) -> Result<GameConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_game_config_json(&raw).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })?;
    config.world.validate().map_err(|source| ConfigError::World {
        path: path.to_path_buf(),
        source,
    })?;
    if config.map_size().is_empty() {
        return Err(ConfigError::EmptyMap {
            path: path.to_path_buf(),
            width: config.map_width_tiles,
            height: config.map_height_tiles,
        });
    }
    if config.map_size().cell_count() > MAX_MAP_CELLS {
        return Err(ConfigError::MapTooLarge {
            path: path.to_path_buf(),
            width: config.map_width_tiles,
            height: config.map_height_tiles,
            max: MAX_MAP_CELLS,
        });
    }
    Ok(config)
}

fn parse_game_config_json(raw: &str) -> Result<GameConfig, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, GameConfig>(&mut deserializer) {
        Ok(config) => Ok(config),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(format!("parse config json: {source}"))
            } else {
                Err(format!("parse config json at {path}: {source}"))
            }
        }
    }
}
