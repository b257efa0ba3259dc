//! Block Module
//!
//! Cursor-addressed random-access I/O over a single stream.
//!
//! ## Responsibilities
//! - Gate reads and writes by the mode the block was opened with
//! - Address byte ranges with a `Cursor` (position + length)
//! - Serialize all operations on one stream
//! - Take advisory OS locks on files, retrying while another holder has them
//!
//! ## Modes
//! ```text
//! ┌───────────┬──────┬──────┐
//! │ Mode      │ get  │ put  │
//! ├───────────┼──────┼──────┤
//! │ READ      │  ✓   │  ✗   │
//! │ WRITE     │  ✗   │  ✓   │
//! │ READ_WRITE│  ✓   │  ✓   │
//! └───────────┴──────┴──────┘
//! ```
//! File locks: READ takes a shared lock, anything writable takes an
//! exclusive lock.

mod binary;
mod cursor;
mod lock;
mod mode;
mod stream;

pub use binary::BinaryBlock;
pub use cursor::Cursor;
pub use mode::BlockMode;
pub use stream::{BlockStream, FileStream, MemoryStream};

pub(crate) use binary::read_full;
pub(crate) use lock::{lock_file, LockKind};
