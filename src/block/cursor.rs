//! Cursor
//!
//! Describes a byte range inside a stream. Never holds data.

use crate::error::{Result, StoreError};

/// A (position, length) descriptor of a byte range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cursor {
    position: u64,
    length: u64,
}

impl Cursor {
    pub const fn new(position: u64, length: u64) -> Self {
        Self { position, length }
    }

    /// Build a cursor from signed offsets, rejecting negative values
    pub fn from_signed(position: i64, length: i64) -> Result<Self> {
        let position = u64::try_from(position).map_err(|_| {
            StoreError::InvalidCursor(format!("negative position {}", position))
        })?;
        let length = u64::try_from(length)
            .map_err(|_| StoreError::InvalidCursor(format!("negative length {}", length)))?;

        Ok(Self { position, length })
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// First byte past the range
    pub fn end(&self) -> Result<u64> {
        self.position.checked_add(self.length).ok_or_else(|| {
            StoreError::InvalidCursor(format!(
                "range {}+{} overflows",
                self.position, self.length
            ))
        })
    }

    /// The range directly following this one
    pub fn next(&self, length: u64) -> Result<Self> {
        Ok(Self::new(self.end()?, length))
    }
}
