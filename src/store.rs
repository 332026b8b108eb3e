//! Cached title and filename store.
//!
//! The project-status file is owned by another tool; this crate only reads
//! and writes two optional keys in it. Writes are read-modify-write and not
//! atomic, so two generations racing on one project keep the last write.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

/// Keys this crate writes into the status store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    GeneratedTitle,
    OutputFilename,
}

impl StoreKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::GeneratedTitle => "generated_title",
            StoreKey::OutputFilename => "epub_filename",
        }
    }
}

/// Key-value collaborator holding the cached title and output filename.
pub trait TitleStore {
    /// Read a value. Missing or unreadable entries are `None`.
    fn get(&self, key: StoreKey) -> Option<String>;

    /// Write a value.
    fn set(&mut self, key: StoreKey, value: &str) -> io::Result<()>;
}

/// In-memory store, for tests and one-off runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<StoreKey, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TitleStore for MemoryStore {
    fn get(&self, key: StoreKey) -> Option<String> {
        self.values.get(&key).cloned()
    }

    fn set(&mut self, key: StoreKey, value: &str) -> io::Result<()> {
        self.values.insert(key, value.to_string());
        Ok(())
    }
}

/// Store backed by a JSON object on disk. Unrelated keys are preserved.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_object(&self) -> io::Result<Map<String, Value>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }
        match serde_json::from_slice(&bytes)? {
            Value::Object(map) => Ok(map),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} is not a JSON object", self.path.display()),
            )),
        }
    }
}

impl TitleStore for JsonFileStore {
    fn get(&self, key: StoreKey) -> Option<String> {
        let map = self.read_object().ok()?;
        map.get(key.as_str())
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn set(&mut self, key: StoreKey, value: &str) -> io::Result<()> {
        let mut map = self.read_object()?;
        map.insert(key.as_str().to_string(), Value::String(value.to_string()));
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(&Value::Object(map))?;
        fs::write(&self.path, json)
    }
}
