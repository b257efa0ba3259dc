//! Storage Module
//!
//! Owns a storage root and allocates sections inside it.
//!
//! ## Responsibilities
//! - Create a fresh root, or reopen and validate an existing one
//! - Allocate section ids and their empty backing files
//! - Hold the root's index provider
//!
//! ## Disk Layout
//! ```text
//! <root>/
//!   ├── index            (key → section id archive)
//!   └── data/
//!         ├── <uuid>     (raw bytes of one section)
//!         └── ...
//! ```
//! Creating a section does not register it; callers add the index entry
//! afterwards. A crash in between leaves an inert orphan file, never an
//! index entry pointing at a missing section.

mod provider;

pub use provider::StorageProvider;
