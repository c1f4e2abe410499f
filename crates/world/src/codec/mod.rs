mod binary;
mod text;

use thiserror::Error;

use crate::grid::TileGridError;
use crate::tile::TilePayloadError;

pub use binary::{decode_grid_binary, encode_grid_binary, MAP_PACK_FORMAT_VERSION};
pub use text::{deserialize_grid, serialize_grid};

/// Type tag written at the head of every saved map, in both encodings.
pub const MAP_TYPE_TAG: &str = "GameMap";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapFormatError {
    #[error("missing '{delimiter}' between map header and tile section")]
    MissingSection { delimiter: char },
    #[error("{segment} is not terminated by '{delimiter}'")]
    MissingTerminator {
        segment: &'static str,
        delimiter: char,
    },
    #[error("map header has {actual} fields, expected {expected}")]
    HeaderFieldCount { expected: usize, actual: usize },
    #[error("unknown map type tag '{tag}'")]
    UnknownTypeTag { tag: String },
    #[error("map {field} '{value}' is not a valid tile count")]
    InvalidDimension { field: &'static str, value: String },
    #[error("map dimensions must be at least 1x1, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },
    #[error("map has {actual} columns, expected {expected}")]
    ColumnCount { expected: usize, actual: usize },
    #[error("map column {column} has {actual} tiles, expected {expected}")]
    TileCount {
        column: usize,
        expected: usize,
        actual: usize,
    },
    #[error("tile ({x}, {y}) is invalid: {source}")]
    Tile {
        x: usize,
        y: usize,
        #[source]
        source: TilePayloadError,
    },
    #[error("invalid map pack: {message}")]
    InvalidPack { message: String },
    #[error("unsupported map pack format version {version}")]
    UnsupportedVersion { version: u16 },
    #[error(transparent)]
    Grid(#[from] TileGridError),
}

pub(crate) fn invalid_pack(message: &str) -> MapFormatError {
    MapFormatError::InvalidPack {
        message: message.to_string(),
    }
}
