//! Binary Block
//!
//! Mode-gated random access over one stream.

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use parking_lot::Mutex;

use crate::config::RetryPolicy;
use crate::error::{Result, StoreError};

use super::{lock_file, BlockMode, BlockStream, Cursor, FileStream, LockKind};

/// Zero-fill is written in chunks of this size
const ZERO_CHUNK: usize = 64 * 1024;

/// Cursor-addressed I/O unit over a single stream
///
/// ## Concurrency:
/// - The stream sits behind one mutex; every operation holds it from seek
///   to the last byte, so callers sharing a block never interleave
/// - `close()` takes the stream out; later calls fail with `Closed`
pub struct BinaryBlock<S: BlockStream> {
    /// `None` once the block has been closed
    stream: Mutex<Option<S>>,

    /// Declared mode, always a subset of the stream's capabilities
    mode: BlockMode,
}

impl<S: BlockStream> BinaryBlock<S> {
    /// Wrap a stream, checking it supports everything `mode` asks for
    pub fn attach(stream: S, mode: BlockMode) -> Result<Self> {
        if mode.is_empty() {
            return Err(StoreError::Config("block mode must not be empty".to_string()));
        }

        let supported = stream.capabilities();
        if !supported.contains(mode) {
            return Err(StoreError::Capability {
                mode: supported,
                required: mode,
            });
        }

        Ok(Self {
            stream: Mutex::new(Some(stream)),
            mode,
        })
    }

    /// Mode the block was opened with
    pub fn mode(&self) -> BlockMode {
        self.mode
    }

    /// Read exactly `cursor.length()` bytes starting at `cursor.position()`
    pub fn get(&self, cursor: Cursor) -> Result<Vec<u8>> {
        self.with_stream(BlockMode::READ, |stream| {
            let end = cursor.end()?;
            let stream_len = stream.seek(SeekFrom::End(0))?;
            if end > stream_len {
                return Err(StoreError::ShortRead {
                    expected: cursor.length(),
                    actual: stream_len.saturating_sub(cursor.position()),
                });
            }

            let len = usize::try_from(cursor.length()).map_err(|_| {
                StoreError::InvalidCursor(format!("length {} exceeds memory", cursor.length()))
            })?;

            stream.seek(SeekFrom::Start(cursor.position()))?;
            let mut buffer = vec![0u8; len];
            let read = read_full(stream, &mut buffer)?;
            if read != len {
                return Err(StoreError::ShortRead {
                    expected: cursor.length(),
                    actual: read as u64,
                });
            }

            Ok(buffer)
        })
    }

    /// Write `bytes` over the range; the buffer must be exactly the range's length
    pub fn put(&self, cursor: Cursor, bytes: &[u8]) -> Result<()> {
        self.check_mode(BlockMode::WRITE)?;
        if bytes.len() as u64 != cursor.length() {
            return Err(StoreError::LengthMismatch {
                expected: cursor.length(),
                actual: bytes.len(),
            });
        }

        self.with_stream(BlockMode::WRITE, |stream| {
            cursor.end()?;
            stream.seek(SeekFrom::Start(cursor.position()))?;
            stream.write_all(bytes)?;
            Ok(())
        })
    }

    /// Overwrite the range with zero bytes
    pub fn zero(&self, cursor: Cursor) -> Result<()> {
        self.with_stream(BlockMode::WRITE, |stream| {
            cursor.end()?;
            stream.seek(SeekFrom::Start(cursor.position()))?;

            let chunk = [0u8; ZERO_CHUNK];
            let mut remaining = cursor.length();
            while remaining > 0 {
                let n = remaining.min(ZERO_CHUNK as u64) as usize;
                stream.write_all(&chunk[..n])?;
                remaining -= n as u64;
            }
            Ok(())
        })
    }

    /// Current length of the underlying stream
    pub fn len(&self) -> Result<u64> {
        self.with_stream(BlockMode::empty(), |stream| {
            Ok(stream.seek(SeekFrom::End(0))?)
        })
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Push written bytes down to durable storage
    pub fn flush(&self) -> Result<()> {
        self.with_stream(BlockMode::WRITE, |stream| Ok(stream.sync()?))
    }

    /// Release the stream. Writable blocks are flushed first.
    pub fn close(&self) -> Result<()> {
        let stream = self.stream.lock().take();
        match stream {
            Some(mut stream) => {
                if self.mode.can_write() {
                    stream.sync()?;
                }
                Ok(())
            }
            None => Err(StoreError::Closed),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.stream.lock().is_none()
    }

    /// Take the stream back out of the block
    pub fn into_inner(self) -> Result<S> {
        self.stream.into_inner().ok_or(StoreError::Closed)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn check_mode(&self, required: BlockMode) -> Result<()> {
        if self.mode.contains(required) {
            Ok(())
        } else {
            Err(StoreError::Capability {
                mode: self.mode,
                required,
            })
        }
    }

    /// Run `f` on the stream with the block lock held
    fn with_stream<T>(
        &self,
        required: BlockMode,
        f: impl FnOnce(&mut S) -> Result<T>,
    ) -> Result<T> {
        self.check_mode(required)?;
        let mut guard = self.stream.lock();
        let stream = guard.as_mut().ok_or(StoreError::Closed)?;
        f(stream)
    }
}

impl BinaryBlock<FileStream> {
    /// Open a file-backed block
    ///
    /// - READ opens an existing file and takes a shared lock
    /// - WRITE / READ_WRITE open or create the file and take an exclusive lock
    ///
    /// While another holder has a conflicting lock, waits `policy.delay`
    /// between attempts and gives up with `LockTimeout` after
    /// `policy.attempts` retries.
    pub fn open(path: &Path, mode: BlockMode, policy: &RetryPolicy) -> Result<Self> {
        if mode.is_empty() {
            return Err(StoreError::Config("block mode must not be empty".to_string()));
        }

        let file = OpenOptions::new()
            .read(mode.can_read())
            .write(mode.can_write())
            .create(mode.can_write())
            .open(path)?;

        let kind = if mode.can_write() {
            LockKind::Exclusive
        } else {
            LockKind::Shared
        };
        lock_file(&file, path, kind, policy)?;

        tracing::debug!("Opened block {} in {} mode", path.display(), mode);

        Self::attach(FileStream::new(file, mode), mode)
    }
}

/// Read until `buf` is full or the stream ends; returns bytes read
pub(crate) fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
