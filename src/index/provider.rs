//! Archive-backed index provider

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::IndexOptions;
use crate::error::{Result, StoreError};

use super::archive::Archive;
use super::{IndexProvider, SectionId, NIL_SECTION};

/// Index stored in a single append-only archive file
///
/// ## Concurrency:
/// - One coarse mutex per instance; queries and mutations never overlap
/// - A query resolves every key under the mutex and releases it before
///   returning, so the caller may use the index while iterating
/// - The archive file is held under an exclusive OS lock while open
pub struct ArchiveIndex {
    path: PathBuf,
    archive: Mutex<Archive>,
    compact_min_stale: u64,
}

impl ArchiveIndex {
    /// Path of the archive file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the archive with live entries only
    pub fn compact(&self) -> Result<()> {
        self.archive.lock().compact()
    }

    /// Superseded records still taking space in the archive
    pub fn stale_records(&self) -> u64 {
        self.archive.lock().stale()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn collect<I, K>(entries: I) -> Vec<(String, SectionId)>
    where
        I: IntoIterator<Item = (K, SectionId)>,
        K: Into<String>,
    {
        entries.into_iter().map(|(k, id)| (k.into(), id)).collect()
    }

    /// Append, then compact if enough stale records piled up (lock held)
    ///
    /// Once the append is durable the batch has succeeded; a failed
    /// compaction leaves the archive as it was and is retried on a later
    /// mutation.
    fn commit(&self, archive: &mut Archive, batch: &[(String, SectionId)]) -> Result<()> {
        archive.append(batch)?;

        let stale = archive.stale();
        if stale >= self.compact_min_stale && stale > archive.len() {
            if let Err(e) = archive.compact() {
                tracing::warn!(
                    "Index {}: compaction of {} stale records failed: {}",
                    self.path.display(),
                    stale,
                    e
                );
            }
        }
        Ok(())
    }
}

impl IndexProvider for ArchiveIndex {
    fn open(path: &Path, options: &IndexOptions) -> Result<Self> {
        let archive = Archive::open(path, &options.open_retry)?;

        Ok(Self {
            path: path.to_path_buf(),
            archive: Mutex::new(archive),
            compact_min_stale: options.compact_min_stale,
        })
    }

    fn query<K>(&self, keys: K) -> impl Iterator<Item = (String, SectionId)>
    where
        K: IntoIterator,
        K::Item: Into<String>,
    {
        let archive = self.archive.lock();
        let resolved: Vec<(String, SectionId)> = keys
            .into_iter()
            .map(|key| {
                let key = key.into();
                let id = archive.get(&key).unwrap_or(NIL_SECTION);
                (key, id)
            })
            .collect();
        resolved.into_iter()
    }

    fn create<I, K>(&self, entries: I) -> Result<u64>
    where
        I: IntoIterator<Item = (K, SectionId)>,
        K: Into<String>,
    {
        let batch = Self::collect(entries);
        let mut archive = self.archive.lock();

        // Validate the whole batch before writing anything
        let mut seen = HashSet::with_capacity(batch.len());
        for (key, _) in &batch {
            if archive.contains(key) || !seen.insert(key.as_str()) {
                return Err(StoreError::DuplicateKey(key.clone()));
            }
        }

        self.commit(&mut archive, &batch)?;
        tracing::debug!("Index created {} entries, {} total", batch.len(), archive.len());
        Ok(archive.len())
    }

    fn update<I, K>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, SectionId)>,
        K: Into<String>,
    {
        let batch = Self::collect(entries);
        let mut archive = self.archive.lock();

        if let Some((key, _)) = batch.iter().find(|(key, _)| !archive.contains(key)) {
            return Err(StoreError::NotFound(key.clone()));
        }

        self.commit(&mut archive, &batch)?;
        tracing::debug!("Index updated {} entries", batch.len());
        Ok(())
    }

    fn upsert<I, K>(&self, entries: I) -> Result<u64>
    where
        I: IntoIterator<Item = (K, SectionId)>,
        K: Into<String>,
    {
        let batch = Self::collect(entries);
        let mut archive = self.archive.lock();

        self.commit(&mut archive, &batch)?;
        tracing::debug!("Index upserted {} entries, {} total", batch.len(), archive.len());
        Ok(archive.len())
    }

    fn count(&self) -> u64 {
        self.archive.lock().len()
    }

    fn close(self) -> Result<()> {
        let mut archive = self.archive.into_inner();
        archive.sync()?;
        tracing::debug!("Closed index {}", self.path.display());
        Ok(())
    }
}
