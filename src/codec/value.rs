//! Value
//!
//! A tagged byte buffer that owns its bytes and wipes them on drop.

use std::fmt;
use std::io::{Read, Seek, SeekFrom, Write};

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::block::read_full;
use crate::error::{Result, StoreError};

use super::{DataType, Datum, Primitive};

/// One encoded primitive
///
/// The buffer is only ever lent out by reference (`as_bytes`, `write_to`),
/// so the wipe on drop covers every copy the value handed out itself.
pub struct Value {
    bytes: Zeroizing<Vec<u8>>,
    data_type: DataType,
}

impl Value {
    /// The empty value (tag `Unknown`)
    pub fn empty() -> Self {
        Self {
            bytes: Zeroizing::new(Vec::new()),
            data_type: DataType::Unknown,
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self::tagged(text.as_bytes().to_vec(), DataType::Text)
    }

    pub fn from_number(number: i64) -> Self {
        Self::tagged(number.encode(), DataType::Number)
    }

    pub fn from_boolean(boolean: bool) -> Self {
        Self::tagged(boolean.encode(), DataType::Boolean)
    }

    pub fn from_date_time(date_time: DateTime<Utc>) -> Self {
        Self::tagged(date_time.encode(), DataType::DateTime)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::tagged(bytes, DataType::Bytes)
    }

    /// Encode any primitive
    pub fn from_primitive<T: Primitive>(value: &T) -> Self {
        Self::tagged(value.encode(), T::DATA_TYPE)
    }

    /// Wrap raw bytes under `data_type`, checking the length fits the tag
    pub fn from_raw(bytes: Vec<u8>, data_type: DataType) -> Result<Self> {
        let value = Self::tagged(bytes, data_type);
        value.validate()?;
        Ok(value)
    }

    /// Read a value of `data_type` from the stream's current position.
    ///
    /// Takes `length` bytes, or everything left in the stream when
    /// `length <= 0` or `length` runs past the end.
    pub fn consume<R: Read + Seek>(stream: &mut R, data_type: DataType, length: i64) -> Result<Self> {
        let position = stream.stream_position()?;
        let end = stream.seek(SeekFrom::End(0))?;
        stream.seek(SeekFrom::Start(position))?;

        let remaining = end.saturating_sub(position);
        let wanted = match u64::try_from(length) {
            Ok(n) if n > 0 && n <= remaining => n,
            _ => remaining,
        };
        let wanted = usize::try_from(wanted).map_err(|_| StoreError::ShortRead {
            expected: wanted,
            actual: 0,
        })?;

        let mut buffer = Zeroizing::new(vec![0u8; wanted]);
        let read = read_full(stream, &mut buffer)?;
        if read != wanted {
            return Err(StoreError::ShortRead {
                expected: wanted as u64,
                actual: read as u64,
            });
        }

        let value = Self {
            bytes: buffer,
            data_type,
        };
        value.validate()?;
        Ok(value)
    }

    /// Write the raw buffer verbatim
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.bytes)?;
        Ok(())
    }

    /// Decode into `T`
    pub fn to<T: Primitive>(&self) -> Result<T> {
        self.check_decodable()?;
        if self.data_type != T::DATA_TYPE {
            return Err(StoreError::TypeMismatch {
                expected: T::DATA_TYPE,
                actual: self.data_type,
            });
        }
        T::decode(&self.bytes)
    }

    /// Decode into whatever the tag names
    pub fn to_datum(&self) -> Result<Datum> {
        self.check_decodable()?;
        let datum = match self.data_type {
            DataType::Text => Datum::Text(String::decode(&self.bytes)?),
            DataType::Number => Datum::Number(i64::decode(&self.bytes)?),
            DataType::Boolean => Datum::Boolean(bool::decode(&self.bytes)?),
            DataType::DateTime => Datum::DateTime(DateTime::<Utc>::decode(&self.bytes)?),
            DataType::Bytes => Datum::Bytes(Vec::<u8>::decode(&self.bytes)?),
            DataType::Unknown => return Err(StoreError::UnsupportedType(DataType::Unknown)),
        };
        Ok(datum)
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn tagged(bytes: Vec<u8>, data_type: DataType) -> Self {
        Self {
            bytes: Zeroizing::new(bytes),
            data_type,
        }
    }

    fn check_decodable(&self) -> Result<()> {
        if self.is_empty() {
            return Err(StoreError::EmptyValue);
        }
        if self.data_type == DataType::Unknown {
            return Err(StoreError::UnsupportedType(DataType::Unknown));
        }
        Ok(())
    }

    /// Non-empty values must carry a concrete tag and a matching width
    fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        if self.data_type == DataType::Unknown {
            return Err(StoreError::UnsupportedType(DataType::Unknown));
        }
        if let Some(width) = self.data_type.fixed_width() {
            if self.bytes.len() != width {
                return Err(StoreError::InvalidEncoding(format!(
                    "{:?} needs {} bytes, got {}",
                    self.data_type,
                    width,
                    self.bytes.len()
                )));
            }
        }
        Ok(())
    }
}

impl From<Datum> for Value {
    fn from(datum: Datum) -> Self {
        match datum {
            Datum::Text(text) => Self::tagged(text.into_bytes(), DataType::Text),
            Datum::Number(number) => Self::from_number(number),
            Datum::Boolean(boolean) => Self::from_boolean(boolean),
            Datum::DateTime(date_time) => Self::from_date_time(date_time),
            Datum::Bytes(bytes) => Self::from_bytes(bytes),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::empty()
    }
}

// Never print the payload
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("data_type", &self.data_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
