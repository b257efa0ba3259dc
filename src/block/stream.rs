//! Streams a block can wrap
//!
//! A stream reports which capabilities it supports so a block can refuse
//! a mode the stream cannot honour.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

use super::BlockMode;

/// A seekable byte stream with known capabilities
pub trait BlockStream: Read + Write + Seek + Send {
    /// What this stream can do
    fn capabilities(&self) -> BlockMode;

    /// Make written bytes durable. Defaults to a plain flush.
    fn sync(&mut self) -> io::Result<()> {
        self.flush()
    }
}

// =============================================================================
// File Stream
// =============================================================================

/// A file together with the access it was opened with
#[derive(Debug)]
pub struct FileStream {
    file: File,
    access: BlockMode,
}

impl FileStream {
    pub fn new(file: File, access: BlockMode) -> Self {
        Self { file, access }
    }

    pub fn file(&self) -> &File {
        &self.file
    }
}

impl Read for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for FileStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Seek for FileStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

impl BlockStream for FileStream {
    fn capabilities(&self) -> BlockMode {
        self.access
    }

    fn sync(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_data()
    }
}

// =============================================================================
// Memory Stream
// =============================================================================

/// In-memory stream, mostly useful for tests and staging buffers
#[derive(Debug)]
pub struct MemoryStream {
    inner: io::Cursor<Vec<u8>>,
    access: BlockMode,
}

impl MemoryStream {
    /// Readable and writable stream over `bytes`
    pub fn new(bytes: Vec<u8>) -> Self {
        Self::with_access(bytes, BlockMode::READ_WRITE)
    }

    pub fn read_only(bytes: Vec<u8>) -> Self {
        Self::with_access(bytes, BlockMode::READ)
    }

    pub fn write_only() -> Self {
        Self::with_access(Vec::new(), BlockMode::WRITE)
    }

    pub fn with_access(bytes: Vec<u8>, access: BlockMode) -> Self {
        Self {
            inner: io::Cursor::new(bytes),
            access,
        }
    }

    pub fn get_ref(&self) -> &[u8] {
        self.inner.get_ref()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.inner.into_inner()
    }
}

impl Read for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.access.can_read() {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "stream is not readable",
            ));
        }
        self.inner.read(buf)
    }
}

impl Write for MemoryStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.access.can_write() {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "stream is not writable",
            ));
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for MemoryStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl BlockStream for MemoryStream {
    fn capabilities(&self) -> BlockMode {
        self.access
    }
}
