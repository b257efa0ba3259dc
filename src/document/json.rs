//! JSON document helper

use std::fs::{self, File};
use std::io::Write;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::durable::sync_parent_dir;
use crate::error::Result;

/// A value loaded from (and saved back to) a JSON file
#[derive(Debug, Clone)]
pub struct JsonDocument<T> {
    value: T,
    source: PathBuf,
}

impl<T: Serialize + DeserializeOwned> JsonDocument<T> {
    /// Wrap a value that will be saved to `source`
    pub fn new(value: T, source: impl Into<PathBuf>) -> Self {
        Self {
            value,
            source: source.into(),
        }
    }

    /// Load a document and remember its path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let value = serde_json::from_str(&json)?;

        tracing::debug!("Loaded document {}", path.display());
        Ok(Self::new(value, path))
    }

    /// Save back to the path the document came from
    pub fn save(&self) -> Result<()> {
        self.save_to(&self.source)
    }

    /// Save to another path; the remembered source does not change
    ///
    /// Writes a sibling temp file and renames it into place.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.value)?;

        let tmp_path = path.with_extension("tmp");
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(json.as_bytes())?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, path)?;
        sync_parent_dir(path)?;

        tracing::debug!("Saved document {}", path.display());
        Ok(())
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for JsonDocument<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for JsonDocument<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}
