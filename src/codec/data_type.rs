//! Data type tags

use std::any::TypeId;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use crate::error::{Result, StoreError};

/// Closed set of types a `Value` can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataType {
    Unknown = 0x00,
    Text = 0x01,
    Number = 0x02,
    Boolean = 0x03,
    DateTime = 0x04,
    Bytes = 0x05,
}

impl DataType {
    /// Map a Rust type to its tag; anything unsupported is `Unknown`
    pub fn of<T: ?Sized + 'static>() -> DataType {
        let id = TypeId::of::<T>();

        if id == TypeId::of::<String>() || id == TypeId::of::<str>() {
            DataType::Text
        } else if id == TypeId::of::<i64>() || id == TypeId::of::<i32>() {
            DataType::Number
        } else if id == TypeId::of::<bool>() {
            DataType::Boolean
        } else if id == TypeId::of::<DateTime<Utc>>() {
            DataType::DateTime
        } else if id == TypeId::of::<Vec<u8>>() || id == TypeId::of::<[u8]>() {
            DataType::Bytes
        } else {
            DataType::Unknown
        }
    }

    /// One-byte tag for on-disk headers
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x00 => Some(DataType::Unknown),
            0x01 => Some(DataType::Text),
            0x02 => Some(DataType::Number),
            0x03 => Some(DataType::Boolean),
            0x04 => Some(DataType::DateTime),
            0x05 => Some(DataType::Bytes),
            _ => None,
        }
    }

    /// Encoded width for fixed-width types
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            DataType::Number | DataType::DateTime => Some(8),
            DataType::Boolean => Some(1),
            DataType::Text | DataType::Bytes | DataType::Unknown => None,
        }
    }
}

impl FromStr for DataType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(DataType::Text),
            "number" => Ok(DataType::Number),
            "boolean" | "bool" => Ok(DataType::Boolean),
            "datetime" => Ok(DataType::DateTime),
            "bytes" => Ok(DataType::Bytes),
            other => Err(StoreError::Config(format!("unknown data type: {}", other))),
        }
    }
}
