use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub(crate) const ROOT_ENV_VAR: &str = "TILEWORLD_ROOT";

/// Where the demo reads sprites from and writes saves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AppPaths {
    pub(crate) root: PathBuf,
    pub(crate) sprites_dir: PathBuf,
    pub(crate) saves_dir: PathBuf,
}

#[derive(Debug, Error)]
pub(crate) enum PathsError {
    #[error("cannot locate the game executable: {0}")]
    CurrentExe(#[source] io::Error),
    #[error("TILEWORLD_ROOT={path} is not a tileworld checkout (needs Cargo.toml plus assets/ or crates/)")]
    InvalidEnvRoot { path: PathBuf },
    #[error("no tileworld checkout found above {start}; set TILEWORLD_ROOT to the directory holding assets/sprites")]
    RootNotFound { start: PathBuf },
    #[error("cannot create save directory {path}: {source}")]
    CreateSavesDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl AppPaths {
    pub(crate) fn under(root: PathBuf) -> Self {
        Self {
            sprites_dir: root.join("assets").join("sprites"),
            saves_dir: root.join("saves"),
            root,
        }
    }

    /// Bare file names (`world.map`) land in the saves directory; anything
    /// with a directory component is used as given.
    pub(crate) fn save_file(&self, path: &Path) -> PathBuf {
        let bare = path
            .parent()
            .map_or(true, |parent| parent.as_os_str().is_empty());
        if bare && !path.is_absolute() {
            self.saves_dir.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

/// Finds the checkout from `TILEWORLD_ROOT`, or by walking up from the
/// executable, and makes sure the saves directory exists.
pub(crate) fn resolve_app_paths() -> Result<AppPaths, PathsError> {
    let root = match env::var_os(ROOT_ENV_VAR) {
        Some(value) => {
            let path = canonical_or_raw(Path::new(&value));
            if !looks_like_checkout(&path) {
                return Err(PathsError::InvalidEnvRoot { path });
            }
            path
        }
        None => {
            let exe = env::current_exe().map_err(PathsError::CurrentExe)?;
            let start = exe.parent().unwrap_or(exe.as_path()).to_path_buf();
            find_checkout_above(&start).ok_or(PathsError::RootNotFound { start })?
        }
    };

    let paths = AppPaths::under(root);
    fs::create_dir_all(&paths.saves_dir).map_err(|source| PathsError::CreateSavesDir {
        path: paths.saves_dir.clone(),
        source,
    })?;
    Ok(paths)
}

fn find_checkout_above(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| looks_like_checkout(candidate))
        .map(canonical_or_raw)
}

fn looks_like_checkout(path: &Path) -> bool {
    path.join("Cargo.toml").is_file()
        && (path.join("assets").is_dir() || path.join("crates").is_dir())
}

fn canonical_or_raw(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
