//! # SectionDB
//!
//! A minimal sectioned object store with:
//! - Opaque byte sections, one file each, named by a UUID
//! - A persistent key → section id index, flushed on every mutation
//! - Mode-gated, cursor-addressed block I/O over section files
//! - A typed value codec for primitives stored inside sections
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Caller / Document Layer                │
//! └──────────────┬───────────────────────────────┬──────────────┘
//!                │ key                           │ Value
//!                ▼                               ▼
//!   ┌─────────────────────────┐        ┌───────────────────┐
//!   │    StorageProvider      │        │    Value Codec    │
//!   │  (root, data/, index)   │        │  (tagged buffers) │
//!   └──────┬───────────┬──────┘        └─────────┬─────────┘
//!          │           │                         │ bytes
//!          ▼           ▼                         ▼
//!   ┌─────────────┐  ┌──────────────────────────────────────┐
//!   │ArchiveIndex │  │            BinaryBlock               │
//!   │ (key → id)  │  │  (Cursor-addressed section file I/O) │
//!   └─────────────┘  └──────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod block;
pub mod codec;
pub mod index;
pub mod storage;
pub mod document;

mod durable;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{StoreError, Result};
pub use config::{Config, RetryPolicy};
pub use block::{BinaryBlock, BlockMode, Cursor};
pub use codec::{DataType, Datum, Value};
pub use index::{ArchiveIndex, IndexProvider, SectionId, NIL_SECTION};
pub use storage::StorageProvider;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of SectionDB
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
