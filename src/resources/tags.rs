//! Tag-delimited config files.
//!
//! Widget, terrain and input settings live in plain text files made of named
//! blocks:
//!
//! ```text
//! TYPE >> MenuBackground
//! - lines starting with a dash are comments
//! tag:menu
//! sprite:	menu_background.png
//! transform.x:0
//! ----------END----------
//! <
//! ```
//!
//! A block starts at a `TYPE >> <name>` header and ends at the end marker (or at
//! the next header, or at the end of the input). A line starting with `<` marks
//! the end of the file. Values have their tabs removed; when a key repeats the
//! first value wins.

use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
    str::FromStr,
};

pub const TYPE_BEGIN: &str = "TYPE >>";
pub const TYPE_END: &str = "----------END----------";
pub const END_OF_FILE: &str = "<";
pub const LINE_BREAK: &str = "-";
pub const DIVIDER: char = ':';

#[derive(Debug)]
pub enum TagError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The end of the file was reached without meeting the requested block.
    BlockNotFound { name: String },
    MissingKey { block: String, key: String },
    InvalidValue {
        block: String,
        key: String,
        value: String,
    },
}

impl Display for TagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagError::Io { path, source } => {
                write!(f, "could not read config file {}: {}", path.display(), source)
            }
            TagError::BlockNotFound { name } => write!(f, "object not found in file: {}", name),
            TagError::MissingKey { block, key } => {
                write!(f, "block {} has no key {}", block, key)
            }
            TagError::InvalidValue { block, key, value } => {
                write!(f, "block {} has an invalid value for {}: {:?}", block, key, value)
            }
        }
    }
}

impl std::error::Error for TagError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TagError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// The key/value pairs of one block, in file order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TagBlock {
    name: String,
    entries: Vec<(String, String)>,
}

impl TagBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds `key` unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.contains(&key) {
            return false;
        }
        self.entries.push((key, value.into()));
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get(&self, key: &str) -> Result<&str, TagError> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .ok_or_else(|| TagError::MissingKey {
                block: self.name.clone(),
                key: key.to_string(),
            })
    }

    pub fn parse<T: FromStr>(&self, key: &str) -> Result<T, TagError> {
        let value = self.get(key)?;
        value.parse().map_err(|_| TagError::InvalidValue {
            block: self.name.clone(),
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    pub fn get_f32(&self, key: &str) -> Result<f32, TagError> {
        self.parse(key)
    }

    /// Like [`get_f32`](Self::get_f32) but falls back to `default` when the key
    /// is absent. A present but malformed value is still an error.
    pub fn get_f32_or(&self, key: &str, default: f32) -> Result<f32, TagError> {
        if self.contains(key) {
            self.get_f32(key)
        } else {
            Ok(default)
        }
    }

    /// Accepts `true`/`false`, `1`/`0` and `on`/`off`.
    pub fn get_bool(&self, key: &str) -> Result<bool, TagError> {
        let value = self.get(key)?;
        match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "on" => Ok(true),
            "false" | "0" | "off" => Ok(false),
            _ => Err(TagError::InvalidValue {
                block: self.name.clone(),
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }
}

/// Reads the block called `name` out of `text`.
pub fn object_data(text: &str, name: &str) -> Result<TagBlock, TagError> {
    let mut block: Option<TagBlock> = None;

    for line in text.lines() {
        let line = line.trim_end_matches('\r');

        if let Some(header) = line.strip_prefix(TYPE_BEGIN) {
            if block.is_some() {
                // The block ran into the next header without an end marker.
                break;
            }
            if header.trim() == name {
                block = Some(TagBlock::new(name));
            }
        } else if line.starts_with(TYPE_END) && block.is_some() {
            break;
        } else if let Some(block) = block.as_mut() {
            if line.starts_with(LINE_BREAK) || line.trim().is_empty() {
                continue;
            }
            match line.split_once(DIVIDER) {
                Some((key, value)) => {
                    let value: String = value.chars().filter(|c| *c != '\t').collect();
                    if !block.insert(key.trim(), value.trim()) {
                        log::debug!("Ignoring repeated key {} in block {}", key.trim(), name);
                    }
                }
                None => log::warn!("Skipping line without a divider in block {}: {:?}", name, line),
            }
        } else if line.starts_with(END_OF_FILE) {
            break;
        }
    }

    block.ok_or_else(|| {
        log::error!("Object not found in file: {}", name);
        TagError::BlockNotFound {
            name: name.to_string(),
        }
    })
}

/// A config file loaded into memory.
#[derive(Clone, Debug)]
pub struct TagFile {
    path: PathBuf,
    text: String,
}

impl TagFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TagError> {
        let path = path.as_ref().to_path_buf();
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                log::info!("Config file opened: {}", path.display());
                Ok(Self { path, text })
            }
            Err(source) => {
                log::error!("Config file could not be opened: {}", path.display());
                Err(TagError::Io { path, source })
            }
        }
    }

    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn block(&self, name: &str) -> Result<TagBlock, TagError> {
        object_data(&self.text, name)
    }

    /// Names of every block header, in file order.
    pub fn block_names(&self) -> Vec<&str> {
        self.text
            .lines()
            .take_while(|line| !line.starts_with(END_OF_FILE))
            .filter_map(|line| line.trim_end_matches('\r').strip_prefix(TYPE_BEGIN))
            .map(str::trim)
            .collect()
    }
}
