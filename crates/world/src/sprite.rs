use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use thiserror::Error;
use tracing::{debug, warn};

/// Decoded RGBA8 pixels for a single sprite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Sprite {
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = width as usize * height as usize;
        let mut rgba = Vec::with_capacity(pixel_count * 4);
        for _ in 0..pixel_count {
            rgba.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            rgba,
        }
    }
}

/// Shared, immutable sprite payload. Cloning only bumps a refcount.
pub type SpriteHandle = Arc<Sprite>;

/// Resolves sprite keys to visual payloads.
pub trait SpriteSource {
    fn lookup(&self, key: &str) -> Option<SpriteHandle>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteKeyError {
    #[error("sprite key must not be empty")]
    Empty,
    #[error("sprite key must not start with '/'")]
    LeadingSlash,
    #[error("sprite key must not contain '..'")]
    ParentTraversal,
    #[error("sprite key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

#[derive(Debug, Error)]
pub enum SpriteLibraryError {
    #[error("sprite directory does not exist: {0}")]
    MissingDir(PathBuf),
    #[error("failed to read sprite directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid sprite key: {0}")]
    InvalidKey(#[from] SpriteKeyError),
}

/// Lowercase ASCII, digits, `_`, `-` and `/` separators; relative only.
pub fn validate_sprite_key(key: &str) -> Result<(), SpriteKeyError> {
    if key.is_empty() {
        return Err(SpriteKeyError::Empty);
    }
    if key.starts_with('/') {
        return Err(SpriteKeyError::LeadingSlash);
    }
    if key.contains("..") {
        return Err(SpriteKeyError::ParentTraversal);
    }
    match key
        .chars()
        .find(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-')))
    {
        Some(character) => Err(SpriteKeyError::InvalidCharacter { character }),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpriteLibrary {
    sprites: HashMap<String, SpriteHandle>,
}

impl SpriteLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `.png` under `dir`, keyed by its relative path without
    /// the extension (`tile/grass.png` -> `tile/grass`). Files with invalid
    /// keys or that fail to decode are skipped.
    pub fn load_dir(dir: &Path) -> Result<Self, SpriteLibraryError> {
        if !dir.is_dir() {
            return Err(SpriteLibraryError::MissingDir(dir.to_path_buf()));
        }
        let mut files = Vec::<(String, PathBuf)>::new();
        collect_png_files(dir, dir, &mut files)?;
        files.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut library = Self::new();
        for (key, path) in files {
            if let Err(error) = validate_sprite_key(&key) {
                warn!(
                    sprite_key = %key,
                    path = %path.display(),
                    reason = %error,
                    "sprite_library_skipping_invalid_key"
                );
                continue;
            }
            match load_sprite_rgba(&path) {
                Ok(sprite) => {
                    library.sprites.insert(key, Arc::new(sprite));
                }
                Err(reason) => warn!(
                    sprite_key = %key,
                    path = %path.display(),
                    reason = %reason,
                    "sprite_library_decode_failed"
                ),
            }
        }
        debug!(
            dir = %dir.display(),
            sprite_count = library.len(),
            "sprite_library_loaded"
        );
        Ok(library)
    }

    pub fn insert(&mut self, key: &str, sprite: Sprite) -> Result<(), SpriteKeyError> {
        validate_sprite_key(key)?;
        self.sprites.insert(key.to_string(), Arc::new(sprite));
        Ok(())
    }

    pub fn with_sprite(mut self, key: &str, sprite: Sprite) -> Result<Self, SpriteKeyError> {
        self.insert(key, sprite)?;
        Ok(self)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.sprites.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
}

impl SpriteSource for SpriteLibrary {
    fn lookup(&self, key: &str) -> Option<SpriteHandle> {
        self.sprites.get(key).cloned()
    }
}

fn collect_png_files(
    root: &Path,
    current: &Path,
    files: &mut Vec<(String, PathBuf)>,
) -> Result<(), SpriteLibraryError> {
    let entries = fs::read_dir(current).map_err(|source| SpriteLibraryError::ReadDir {
        path: current.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| SpriteLibraryError::ReadDir {
            path: current.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_png_files(root, &path, files)?;
            continue;
        }
        let is_png = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if !is_png {
            continue;
        }
        if let Some(key) = sprite_key_for_path(root, &path) {
            files.push((key, path));
        }
    }
    Ok(())
}

fn sprite_key_for_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?.with_extension("");
    let parts = relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

fn load_sprite_rgba(path: &Path) -> Result<Sprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(Sprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}
