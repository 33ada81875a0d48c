//! File and path helpers shared by the config loaders.

use crate::ConfigError;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a config file, naming it in the error.
pub(super) fn read_config(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse JSON5 text for the layer called `layer`.
pub(super) fn parse_layer(contents: &str, layer: &str) -> Result<Value, ConfigError> {
    json5::from_str(contents).map_err(|source| ConfigError::ParseFailed {
        layer: layer.to_string(),
        source,
    })
}

/// Canonical form of the lookup directory; a missing one is used as given.
pub(super) fn normalize_path(path: &Path) -> Result<PathBuf, ConfigError> {
    match path.canonicalize() {
        Ok(path) => Ok(path),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(path.to_path_buf()),
        Err(source) => Err(ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Key used to skip a layer file already loaded under another name.
pub(super) fn unique_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Nearest ancestor of `cwd` holding one of the project markers (e.g. `.git`).
pub(super) fn find_project_root(cwd: &Path, markers: &[String]) -> Option<PathBuf> {
    cwd.ancestors()
        .find(|ancestor| markers.iter().any(|marker| ancestor.join(marker).exists()))
        .map(Path::to_path_buf)
}
