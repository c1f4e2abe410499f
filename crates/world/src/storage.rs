use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::codec::{
    decode_grid_binary, deserialize_grid, encode_grid_binary, serialize_grid, MapFormatError,
};
use crate::grid::TileGrid;

pub const TEXT_MAP_EXTENSION: &str = "map";
pub const BINARY_MAP_EXTENSION: &str = "mapbin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapFileFormat {
    Text,
    Binary,
}

impl MapFileFormat {
    /// `.mapbin` is binary; everything else is treated as text.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case(BINARY_MAP_EXTENSION) => Self::Binary,
            _ => Self::Text,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Binary => "binary",
        }
    }
}

#[derive(Debug, Error)]
pub enum MapStorageError {
    #[error("failed to read/write map file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("map file {path} is malformed: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: MapFormatError,
    },
    #[error("map file {path} is not valid UTF-8 text")]
    NotUtf8 { path: PathBuf },
}

pub fn save_map(path: &Path, grid: &TileGrid, format: MapFileFormat) -> Result<(), MapStorageError> {
    let bytes = match format {
        MapFileFormat::Text => serialize_grid(grid).into_bytes(),
        MapFileFormat::Binary => encode_grid_binary(grid).map_err(|source| MapStorageError::Format {
            path: path.to_path_buf(),
            source,
        })?,
    };
    write_bytes_atomic(path, &bytes).map_err(|source| MapStorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        format = format.label(),
        width = grid.tile_count_x(),
        height = grid.tile_count_y(),
        bytes = bytes.len(),
        "map_saved"
    );
    Ok(())
}

pub fn load_map(path: &Path, format: MapFileFormat) -> Result<TileGrid, MapStorageError> {
    let bytes = fs::read(path).map_err(|source| MapStorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed = match format {
        MapFileFormat::Text => {
            let text = std::str::from_utf8(&bytes).map_err(|_| MapStorageError::NotUtf8 {
                path: path.to_path_buf(),
            })?;
            deserialize_grid(text.trim_end_matches(['\r', '\n']))
        }
        MapFileFormat::Binary => decode_grid_binary(&bytes),
    };
    let grid = parsed.map_err(|source| MapStorageError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        format = format.label(),
        width = grid.tile_count_x(),
        height = grid.tile_count_y(),
        "map_loaded"
    );
    Ok(grid)
}

/// Writes to a sibling temp file first so a crash mid-write never leaves a
/// truncated save behind.
fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, bytes)?;
    if let Err(error) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("map");
    path.with_file_name(format!("{file_name}.tmp"))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::geometry::{GridPosition, GridSize};
    use crate::tile::Tile;

    fn sample_grid() -> TileGrid {
        let tiles = ["tile/grass", "tile/dirt", "tile/water", "tile/grass"]
            .into_iter()
            .map(|key| Tile::unresolved(key).expect("tile"))
            .collect::<Vec<_>>();
        TileGrid::from_tiles(GridSize::new(2, 2), tiles).expect("grid")
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            MapFileFormat::from_path(Path::new("saves/world.mapbin")),
            MapFileFormat::Binary
        );
        assert_eq!(
            MapFileFormat::from_path(Path::new("saves/world.MAPBIN")),
            MapFileFormat::Binary
        );
        assert_eq!(
            MapFileFormat::from_path(Path::new("saves/world.map")),
            MapFileFormat::Text
        );
        assert_eq!(
            MapFileFormat::from_path(Path::new("world")),
            MapFileFormat::Text
        );
    }

    #[test]
    fn text_save_round_trips_and_overwrites() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("nested").join("world.map");
        let grid = sample_grid();

        save_map(&path, &grid, MapFileFormat::Text).expect("save");
        assert_eq!(
            fs::read_to_string(&path).expect("read"),
            "GameMap|2|2|#tile/grass,tile/water,;tile/dirt,tile/grass,;"
        );

        let mut changed = grid.clone();
        changed
            .set_tile(GridPosition::new(0, 0), Tile::unresolved("tile/sand").expect("sand"))
            .expect("set");
        save_map(&path, &changed, MapFileFormat::Text).expect("overwrite");
        assert_eq!(load_map(&path, MapFileFormat::Text).expect("load"), changed);
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn binary_save_round_trips() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("world.mapbin");
        let grid = sample_grid();
        save_map(&path, &grid, MapFileFormat::Binary).expect("save");
        assert_eq!(load_map(&path, MapFileFormat::Binary).expect("load"), grid);
    }

    #[test]
    fn trailing_newline_in_text_file_is_tolerated() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("hand_edited.map");
        fs::write(&path, "GameMap|1|1|#tile/dirt,;\n").expect("write");
        let grid = load_map(&path, MapFileFormat::Text).expect("load");
        assert_eq!(grid.tiles()[0].sprite_key(), "tile/dirt");
    }

    #[test]
    fn malformed_and_missing_files_report_path() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("broken.map");
        fs::write(&path, "GameMap|1|1|").expect("write");
        match load_map(&path, MapFileFormat::Text) {
            Err(MapStorageError::Format { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected format error, got {other:?}"),
        }

        let missing = temp.path().join("missing.map");
        assert!(matches!(
            load_map(&missing, MapFileFormat::Text),
            Err(MapStorageError::Io { .. })
        ));
    }
}
