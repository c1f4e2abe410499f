use thiserror::Error;
use tracing::debug;

use crate::persist::{is_reserved_delimiter, Persistable};
use crate::sprite::{Sprite, SpriteHandle, SpriteSource};

pub const DEFAULT_TILE_KEY: &str = "tile/grass";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TilePayloadError {
    #[error("tile payload must not be empty")]
    Empty,
    #[error("tile payload contains reserved delimiter '{character}'")]
    ReservedCharacter { character: char },
    #[error("tile payload contains control character {character:?}")]
    ControlCharacter { character: char },
}

/// One map cell. Its persisted payload is the sprite key; the resolved
/// sprite is derived state and is never written out.
#[derive(Debug, Clone)]
pub struct Tile {
    sprite_key: String,
    graphics: Option<SpriteHandle>,
}

impl Tile {
    pub fn new<S: SpriteSource + ?Sized>(sprite_source: &S) -> Self {
        let mut tile = Self::unresolved_default();
        tile.reload_graphics(sprite_source);
        tile
    }

    pub fn with_key<S: SpriteSource + ?Sized>(
        sprite_key: &str,
        sprite_source: &S,
    ) -> Result<Self, TilePayloadError> {
        let mut tile = Self::unresolved(sprite_key)?;
        tile.reload_graphics(sprite_source);
        Ok(tile)
    }

    /// Tile with a payload but no resolved graphics yet.
    pub fn unresolved(sprite_key: &str) -> Result<Self, TilePayloadError> {
        validate_tile_payload(sprite_key)?;
        Ok(Self {
            sprite_key: sprite_key.to_string(),
            graphics: None,
        })
    }

    fn unresolved_default() -> Self {
        Self {
            sprite_key: DEFAULT_TILE_KEY.to_string(),
            graphics: None,
        }
    }

    pub fn sprite_key(&self) -> &str {
        &self.sprite_key
    }

    pub fn graphics(&self) -> Option<&Sprite> {
        self.graphics.as_deref()
    }

    pub fn graphics_handle(&self) -> Option<&SpriteHandle> {
        self.graphics.as_ref()
    }

    /// Re-resolves the visual from `sprite_source`. A missing key keeps the
    /// previous visual so a render pass never loses a tile. Returns whether
    /// the lookup succeeded.
    pub fn reload_graphics<S: SpriteSource + ?Sized>(&mut self, sprite_source: &S) -> bool {
        match sprite_source.lookup(&self.sprite_key) {
            Some(sprite) => {
                self.graphics = Some(sprite);
                true
            }
            None => {
                debug!(
                    sprite_key = %self.sprite_key,
                    has_previous = self.graphics.is_some(),
                    "tile_sprite_missing_keeping_previous"
                );
                false
            }
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::unresolved_default()
    }
}

impl PartialEq for Tile {
    fn eq(&self, other: &Self) -> bool {
        self.sprite_key == other.sprite_key
    }
}

impl Eq for Tile {}

impl Persistable for Tile {
    type Error = TilePayloadError;

    fn serialize(&self) -> String {
        self.sprite_key.clone()
    }

    fn apply_serialized_data(&mut self, data: &str) -> Result<(), Self::Error> {
        validate_tile_payload(data)?;
        if self.sprite_key != data {
            self.sprite_key = data.to_string();
            self.graphics = None;
        }
        Ok(())
    }
}

pub fn validate_tile_payload(payload: &str) -> Result<(), TilePayloadError> {
    if payload.is_empty() {
        return Err(TilePayloadError::Empty);
    }
    for character in payload.chars() {
        if is_reserved_delimiter(character) {
            return Err(TilePayloadError::ReservedCharacter { character });
        }
        if character.is_control() {
            return Err(TilePayloadError::ControlCharacter { character });
        }
    }
    Ok(())
}
