//! Index Module
//!
//! Persistent mapping from caller keys to section identifiers.
//!
//! ## Responsibilities
//! - Resolve keys to section ids (all-zero id when absent)
//! - Create, update and upsert entries in batches
//! - Flush every mutation durably before returning
//!
//! ## Archive Format
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │ Header (6 bytes)                                      │
//! │   Magic: "SIDX" (4) | Version: u16 (2)                │
//! ├───────────────────────────────────────────────────────┤
//! │ Record                                                │
//! │   [CRC32 (4)][KeyLen: u32 (4)][Key (UTF-8)][Id (16)]  │
//! │   ... appended per mutation, later records win ...    │
//! └───────────────────────────────────────────────────────┘
//! ```
//! The CRC covers KeyLen, Key and Id. A torn tail left by a crash is cut
//! off on the next open.

mod archive;
mod provider;

use std::path::Path;

use uuid::Uuid;

use crate::config::IndexOptions;
use crate::error::Result;

pub use provider::ArchiveIndex;

/// 128-bit section identifier
pub type SectionId = Uuid;

/// Identifier returned for keys that are not in the index
pub const NIL_SECTION: SectionId = Uuid::nil();

/// A durable key → section id mapping
///
/// Implementations serialize all operations on one instance and flush each
/// mutation before it returns.
pub trait IndexProvider: Send + Sync + Sized {
    /// Open the index stored at `path`, creating it if absent
    fn open(path: &Path, options: &IndexOptions) -> Result<Self>;

    /// Resolve `keys` in order, yielding `NIL_SECTION` for missing ones.
    ///
    /// All keys are resolved against one snapshot of the index before the
    /// sequence is returned; later mutations are not reflected in it.
    fn query<K>(&self, keys: K) -> impl Iterator<Item = (String, SectionId)>
    where
        K: IntoIterator,
        K::Item: Into<String>;

    /// Add new entries. Fails with `DuplicateKey` if any key exists.
    /// Returns the entry count afterwards.
    fn create<I, K>(&self, entries: I) -> Result<u64>
    where
        I: IntoIterator<Item = (K, SectionId)>,
        K: Into<String>;

    /// Replace ids of existing entries. Fails with `NotFound` if any key is missing.
    fn update<I, K>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, SectionId)>,
        K: Into<String>;

    /// Update existing entries, create the rest. Returns the entry count afterwards.
    fn upsert<I, K>(&self, entries: I) -> Result<u64>
    where
        I: IntoIterator<Item = (K, SectionId)>,
        K: Into<String>;

    /// Number of entries
    fn count(&self) -> u64;

    /// Flush and release the backing container
    fn close(self) -> Result<()>;

    /// Resolve a single key
    fn resolve(&self, key: &str) -> SectionId {
        self.query([key])
            .next()
            .map(|(_, id)| id)
            .unwrap_or(NIL_SECTION)
    }
}
