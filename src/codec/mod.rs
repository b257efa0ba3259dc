//! Value Codec
//!
//! Tagged byte buffers holding one primitive value.
//!
//! ## Encodings
//! ```text
//! ┌──────────┬──────────┬──────────────────────────────────────┐
//! │ Type     │ Width    │ Layout                               │
//! ├──────────┼──────────┼──────────────────────────────────────┤
//! │ Text     │ variable │ UTF-8 bytes                          │
//! │ Number   │ 8        │ i64 little-endian                    │
//! │ Boolean  │ 1        │ 0 = false, anything else = true      │
//! │ DateTime │ 8        │ i64 LE milliseconds since epoch, UTC │
//! │ Bytes    │ variable │ raw payload                          │
//! └──────────┴──────────┴──────────────────────────────────────┘
//! ```
//!
//! A `Value` owns its buffer, lends it out only by reference, and wipes it
//! when dropped.

mod data_type;
mod primitive;
mod value;

pub use data_type::DataType;
pub use primitive::{Datum, Primitive};
pub use value::Value;
