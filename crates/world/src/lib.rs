pub mod action;
pub mod camera;
pub mod codec;
pub mod config;
pub mod geometry;
pub mod grid;
pub mod persist;
pub mod sprite;
pub mod storage;
pub mod tile;
pub mod viewport;

pub use action::{Action, ActionKind, AudioSink};
pub use camera::{Camera, Camera2D};
pub use codec::{
    decode_grid_binary, deserialize_grid, encode_grid_binary, serialize_grid, MapFormatError,
    MAP_TYPE_TAG,
};
pub use config::{WorldContext, WorldContextError, DEFAULT_TILE_SIZE_PX};
pub use geometry::{GridPosition, GridSize, PixelPosition, PixelSize};
pub use grid::{GraphicsReload, TileGrid, TileGridError};
pub use persist::Persistable;
pub use sprite::{
    validate_sprite_key, Sprite, SpriteHandle, SpriteKeyError, SpriteLibrary, SpriteLibraryError,
    SpriteSource,
};
pub use storage::{load_map, save_map, MapFileFormat, MapStorageError};
pub use tile::{Tile, TilePayloadError, DEFAULT_TILE_KEY};
pub use viewport::{visible_window, ViewportWindow};
