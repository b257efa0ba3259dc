//! Error types for SectionDB
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::block::BlockMode;
use crate::codec::DataType;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for SectionDB operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Block Errors
    // -------------------------------------------------------------------------
    #[error("Block is in {mode} mode, but {required} mode is required")]
    Capability { mode: BlockMode, required: BlockMode },

    #[error("Write length mismatch: cursor expects {expected} bytes, buffer has {actual}")]
    LengthMismatch { expected: u64, actual: usize },

    #[error("Short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: u64, actual: u64 },

    #[error("Timed out waiting for lock on {} after {attempts} attempts", path.display())]
    LockTimeout { path: PathBuf, attempts: u32 },

    #[error("Block is closed")]
    Closed,

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    // -------------------------------------------------------------------------
    // Index Errors
    // -------------------------------------------------------------------------
    #[error("Index entry not found: {0}")]
    NotFound(String),

    #[error("Index entry already exists: {0}")]
    DuplicateKey(String),

    #[error("Index corruption detected: {0}")]
    IndexCorruption(String),

    // -------------------------------------------------------------------------
    // Value Errors
    // -------------------------------------------------------------------------
    #[error("{0:?} is not supported")]
    UnsupportedType(DataType),

    #[error("Value is empty")]
    EmptyValue,

    #[error("Type mismatch: requested {expected:?}, value holds {actual:?}")]
    TypeMismatch { expected: DataType, actual: DataType },

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Invalid storage root: {0}")]
    InvalidStorageRoot(String),

    #[error("Section not found: {0}")]
    SectionNotFound(uuid::Uuid),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
