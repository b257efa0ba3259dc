//! Storage Provider
//!
//! Section allocation on top of a storage root.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::block::{BinaryBlock, BlockMode, FileStream};
use crate::config::{Config, RetryPolicy};
use crate::durable::sync_dir;
use crate::error::{Result, StoreError};
use crate::index::{ArchiveIndex, IndexProvider, SectionId};

/// Owns one storage root: its data directory and its index
///
/// ## Concurrency:
/// - `create_section` is safe to call from many threads; file creation is
///   exclusive, so two callers can never receive the same id
/// - The index serializes its own operations
/// - Do not open the same root twice at once; the index file lock makes a
///   second opener wait and then fail with `LockTimeout`
pub struct StorageProvider<I: IndexProvider = ArchiveIndex> {
    /// Storage root directory
    root: PathBuf,

    /// `<root>/data`, one file per section
    data_dir: PathBuf,

    /// Key → section id index for this root
    index: I,

    /// Lock retry used when opening section files
    open_retry: RetryPolicy,
}

impl<I: IndexProvider> StorageProvider<I> {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const INDEX_FILENAME: &'static str = "index";
    const DATA_DIR: &'static str = "data";

    /// Open or create the storage root described by `config`
    ///
    /// - Missing root, or a root with neither index nor data directory, or
    ///   an empty data directory and no index: create the layout and a
    ///   fresh index
    /// - Root with both: reopen the index (replaying it) and keep the data
    /// - Anything in between is rejected with `InvalidStorageRoot`
    pub fn initialize(config: Config) -> Result<Self> {
        let root = config.root_dir.clone();
        let index_path = root.join(Self::INDEX_FILENAME);
        let data_dir = root.join(Self::DATA_DIR);

        let fresh = Self::inspect_root(&root, &index_path, &data_dir)?;

        if fresh {
            fs::create_dir_all(&data_dir)?;
            tracing::info!("Initializing storage root {}", root.display());
        } else {
            tracing::info!("Reopening storage root {}", root.display());
        }

        let index = I::open(&index_path, &config.index)?;
        if fresh {
            sync_dir(&root)?;
        }

        Ok(Self {
            root,
            data_dir,
            index,
            open_retry: config.open_retry,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified root directory
    pub fn open(root: &Path) -> Result<Self> {
        let config = Config::builder().root_dir(root).build();
        Self::initialize(config)
    }

    /// Allocate a new, empty section and return its id
    ///
    /// The id is not added to the index.
    pub fn create_section(&self) -> Result<SectionId> {
        loop {
            let id = Uuid::new_v4();
            let path = self.section_path(id);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    file.sync_all()?;
                    sync_dir(&self.data_dir)?;
                    tracing::debug!("Created section {}", id);
                    return Ok(id);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::warn!("Section id collision on {}, generating another", id);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Create a section and register it under `key`
    ///
    /// The section file is durable before the index entry is written. If
    /// registration fails the new file is removed again.
    pub fn register_section(&self, key: &str) -> Result<SectionId> {
        let id = self.create_section()?;

        if let Err(e) = self.index.create([(key, id)]) {
            if let Err(remove_err) = fs::remove_file(self.section_path(id)) {
                tracing::warn!("Failed to remove orphan section {}: {}", id, remove_err);
            }
            return Err(e);
        }

        Ok(id)
    }

    /// Open an existing section through a block
    pub fn open_section(&self, id: SectionId, mode: BlockMode) -> Result<BinaryBlock<FileStream>> {
        let path = self.section_path(id);
        if !path.is_file() {
            return Err(StoreError::SectionNotFound(id));
        }
        BinaryBlock::open(&path, mode, &self.open_retry)
    }

    /// Path of the section file for `id`
    pub fn section_path(&self, id: SectionId) -> PathBuf {
        self.data_dir.join(id.hyphenated().to_string())
    }

    pub fn section_exists(&self, id: SectionId) -> bool {
        self.section_path(id).is_file()
    }

    /// Ids of all section files, registered or not
    ///
    /// Files whose names are not section ids are ignored.
    pub fn list_sections(&self) -> Result<Vec<SectionId>> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(id) = Self::parse_section_id(&entry.path()) {
                ids.push(id);
            }
        }

        ids.sort();
        Ok(ids)
    }

    /// The root's index provider
    pub fn index(&self) -> &I {
        &self.index
    }

    /// Get the storage root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Close the index and release the root
    pub fn close(self) -> Result<()> {
        self.index.close()?;
        tracing::info!("Closed storage root {}", self.root.display());
        Ok(())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Decide whether the root needs a fresh layout; reject half-built roots
    fn inspect_root(root: &Path, index_path: &Path, data_dir: &Path) -> Result<bool> {
        if !root.exists() {
            fs::create_dir_all(root)?;
            return Ok(true);
        }
        if !root.is_dir() {
            return Err(StoreError::InvalidStorageRoot(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        match (index_path.exists(), data_dir.exists()) {
            (false, false) => Ok(true),
            (true, true) => {
                if !index_path.is_file() {
                    return Err(StoreError::InvalidStorageRoot(format!(
                        "{} is not a file",
                        index_path.display()
                    )));
                }
                if !data_dir.is_dir() {
                    return Err(StoreError::InvalidStorageRoot(format!(
                        "{} is not a directory",
                        data_dir.display()
                    )));
                }
                Ok(false)
            }
            (true, false) => Err(StoreError::InvalidStorageRoot(format!(
                "index present but {} is missing",
                data_dir.display()
            ))),
            // Initialization stopped before the index was created
            (false, true) if data_dir.is_dir() && fs::read_dir(data_dir)?.next().is_none() => {
                tracing::warn!(
                    "Storage root {} has an empty data directory and no index, initializing",
                    root.display()
                );
                Ok(true)
            }
            (false, true) => Err(StoreError::InvalidStorageRoot(format!(
                "{} present but index is missing",
                data_dir.display()
            ))),
        }
    }

    /// Only canonical hyphenated names count as sections
    fn parse_section_id(path: &Path) -> Option<SectionId> {
        let name = path.file_name()?.to_str()?;
        Uuid::try_parse(name)
            .ok()
            .filter(|id| id.hyphenated().to_string() == name)
    }
}
