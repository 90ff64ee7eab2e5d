//! Loading of external files: raw assets, tag-delimited config blocks and
//! textures.
//!
//! Every path is resolved against an asset root, `./assets` unless the game
//! is configured otherwise.

use std::path::{Path, PathBuf};

use anyhow::Context;

pub mod tags;
pub mod texture;

/// Asset root used when none is configured.
pub const DEFAULT_ASSET_ROOT: &str = "./assets";

/// Directory holding the tag-delimited config files below the asset root.
pub const CONFIG_DIR: &str = "files";

pub fn asset_path(root: &Path, file_name: &str) -> PathBuf {
    root.join(file_name)
}

pub fn config_path(root: &Path, file_name: &str) -> PathBuf {
    root.join(CONFIG_DIR).join(file_name)
}

pub fn load_binary(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}
