//! Primitive encoders
//!
//! One `Primitive` impl per Rust type a value can decode into.

use chrono::{DateTime, Utc};

use crate::error::{Result, StoreError};

use super::DataType;

/// A Rust type with a fixed `DataType` tag and byte encoding
pub trait Primitive: Sized {
    const DATA_TYPE: DataType;

    fn encode(&self) -> Vec<u8>;

    /// Decode from a non-empty buffer of this type's tag
    fn decode(bytes: &[u8]) -> Result<Self>;
}

fn fixed<const N: usize>(bytes: &[u8], data_type: DataType) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| {
        StoreError::InvalidEncoding(format!(
            "{:?} needs {} bytes, got {}",
            data_type,
            N,
            bytes.len()
        ))
    })
}

impl Primitive for String {
    const DATA_TYPE: DataType = DataType::Text;

    fn encode(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| StoreError::InvalidEncoding(format!("text is not UTF-8: {}", e)))
    }
}

impl Primitive for i64 {
    const DATA_TYPE: DataType = DataType::Number;

    fn encode(&self) -> Vec<u8> {
        self.to_le_bytes().to_vec()
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(i64::from_le_bytes(fixed::<8>(bytes, Self::DATA_TYPE)?))
    }
}

impl Primitive for i32 {
    const DATA_TYPE: DataType = DataType::Number;

    fn encode(&self) -> Vec<u8> {
        i64::from(*self).encode()
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let wide = i64::decode(bytes)?;
        i32::try_from(wide)
            .map_err(|_| StoreError::InvalidEncoding(format!("{} does not fit in i32", wide)))
    }
}

impl Primitive for bool {
    const DATA_TYPE: DataType = DataType::Boolean;

    fn encode(&self) -> Vec<u8> {
        vec![u8::from(*self)]
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let [b] = fixed::<1>(bytes, Self::DATA_TYPE)?;
        Ok(b != 0)
    }
}

impl Primitive for DateTime<Utc> {
    const DATA_TYPE: DataType = DataType::DateTime;

    fn encode(&self) -> Vec<u8> {
        self.timestamp_millis().to_le_bytes().to_vec()
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let millis = i64::from_le_bytes(fixed::<8>(bytes, Self::DATA_TYPE)?);
        DateTime::from_timestamp_millis(millis).ok_or_else(|| {
            StoreError::InvalidEncoding(format!("timestamp {} ms is out of range", millis))
        })
    }
}

impl Primitive for Vec<u8> {
    const DATA_TYPE: DataType = DataType::Bytes;

    fn encode(&self) -> Vec<u8> {
        self.clone()
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bytes.to_vec())
    }
}

// =============================================================================
// Datum
// =============================================================================

/// A decoded value of whichever type its tag names
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Text(String),
    Number(i64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Bytes(Vec<u8>),
}

impl Datum {
    pub fn data_type(&self) -> DataType {
        match self {
            Datum::Text(_) => DataType::Text,
            Datum::Number(_) => DataType::Number,
            Datum::Boolean(_) => DataType::Boolean,
            Datum::DateTime(_) => DataType::DateTime,
            Datum::Bytes(_) => DataType::Bytes,
        }
    }
}
