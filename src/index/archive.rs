//! Index archive file
//!
//! Append-only record log replayed into memory on open.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bytes::{Buf, BufMut, BytesMut};

use crate::block::{lock_file, LockKind};
use crate::config::RetryPolicy;
use crate::durable::sync_parent_dir;
use crate::error::{Result, StoreError};

use super::SectionId;

/// Magic bytes identifying an index archive
pub(crate) const MAGIC: &[u8; 4] = b"SIDX";

/// Current archive format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) = 6 bytes
pub(crate) const HEADER_SIZE: u64 = 6;

/// Record prefix: CRC (4) + KeyLen (4)
const RECORD_PREFIX: usize = 8;

/// Raw identifier width
const ID_SIZE: usize = 16;

/// Open archive: the locked file plus its replayed contents
pub(crate) struct Archive {
    path: PathBuf,
    file: File,
    retry: RetryPolicy,
    /// Live entries
    entries: HashMap<String, SectionId>,
    /// Records in the file, including superseded ones
    records: u64,
    /// Offset the next record is appended at
    end: u64,
}

impl Archive {
    /// Open or create the archive at `path` and replay it
    ///
    /// On open:
    /// 1. Take an exclusive lock (retrying per `retry`)
    /// 2. Write a header if the file is new, or holds only part of a
    ///    header left by a crash during creation
    /// 3. Replay records, cutting off a torn or corrupt tail
    pub(crate) fn open(path: &Path, retry: &RetryPolicy) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        lock_file(&file, path, LockKind::Exclusive, retry)?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;

        let mut header = BytesMut::with_capacity(HEADER_SIZE as usize);
        put_header(&mut header);

        if contents.len() < header.len() && header.starts_with(&contents) {
            if !contents.is_empty() {
                tracing::warn!(
                    "Index {}: rewriting partial header of {} bytes",
                    path.display(),
                    contents.len()
                );
                file.set_len(0)?;
            }
            file.seek(SeekFrom::Start(0))?;
            file.write_all(&header)?;
            file.sync_all()?;

            tracing::debug!("Created index archive {}", path.display());
            return Ok(Self {
                path: path.to_path_buf(),
                file,
                retry: retry.clone(),
                entries: HashMap::new(),
                records: 0,
                end: HEADER_SIZE,
            });
        }

        check_header(&contents)?;
        let replayed = replay(&contents[HEADER_SIZE as usize..]);
        let end = HEADER_SIZE + replayed.valid_len;

        if end < contents.len() as u64 {
            tracing::warn!(
                "Index {}: discarding {} bytes of torn or corrupt tail after {} records",
                path.display(),
                contents.len() as u64 - end,
                replayed.records
            );
            file.set_len(end)?;
            file.sync_all()?;
        }

        tracing::info!(
            "Loaded index {}: {} entries from {} records",
            path.display(),
            replayed.entries.len(),
            replayed.records
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            retry: retry.clone(),
            entries: replayed.entries,
            records: replayed.records,
            end,
        })
    }

    pub(crate) fn get(&self, key: &str) -> Option<SectionId> {
        self.entries.get(key).copied()
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Live entry count
    pub(crate) fn len(&self) -> u64 {
        self.entries.len() as u64
    }

    /// Superseded records still in the file
    pub(crate) fn stale(&self) -> u64 {
        self.records - self.len()
    }

    /// Append a batch as one write and sync it before applying it in memory
    pub(crate) fn append(&mut self, batch: &[(String, SectionId)]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut buf = BytesMut::new();
        for (key, id) in batch {
            encode_record(&mut buf, key, id)?;
        }

        if let Err(e) = self.write_at_end(&buf) {
            // Leave no half-written record behind
            if let Err(truncate_err) = self.file.set_len(self.end) {
                tracing::warn!(
                    "Index {}: failed to roll back partial append: {}",
                    self.path.display(),
                    truncate_err
                );
            }
            return Err(e);
        }

        self.end += buf.len() as u64;
        self.records += batch.len() as u64;
        for (key, id) in batch {
            self.entries.insert(key.clone(), *id);
        }

        Ok(())
    }

    /// Rewrite the archive with only the live entries
    ///
    /// Writes and locks a sibling temp file, then renames it over the
    /// archive. The open handle follows the rename, so the archive keeps a
    /// locked handle on whichever file `path` names. On failure before the
    /// rename the old archive stays in use untouched.
    pub(crate) fn compact(&mut self) -> Result<()> {
        let tmp_path = self.path.with_extension("compact");

        let mut buf = BytesMut::with_capacity(HEADER_SIZE as usize);
        put_header(&mut buf);

        let mut live: Vec<(&String, &SectionId)> = self.entries.iter().collect();
        live.sort();
        for (key, id) in live {
            encode_record(&mut buf, key, id)?;
        }

        let file = match self.write_replacement(&tmp_path, &buf) {
            Ok(file) => file,
            Err(e) => {
                if tmp_path.is_file() {
                    if let Err(remove_err) = fs::remove_file(&tmp_path) {
                        tracing::warn!(
                            "Index {}: failed to remove {}: {}",
                            self.path.display(),
                            tmp_path.display(),
                            remove_err
                        );
                    }
                }
                return Err(e);
            }
        };

        tracing::info!(
            "Compacted index {}: {} records -> {}",
            self.path.display(),
            self.records,
            self.entries.len()
        );

        self.file = file;
        self.records = self.len();
        self.end = buf.len() as u64;

        sync_parent_dir(&self.path)
    }

    pub(crate) fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Create, fill, sync and lock the temp file, then rename it into place
    fn write_replacement(&self, tmp_path: &Path, buf: &[u8]) -> Result<File> {
        let mut tmp = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(tmp_path)?;
        lock_file(&tmp, tmp_path, LockKind::Exclusive, &self.retry)?;
        tmp.write_all(buf)?;
        tmp.sync_all()?;

        fs::rename(tmp_path, &self.path)?;
        Ok(tmp)
    }

    fn write_at_end(&mut self, buf: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(self.end))?;
        self.file.write_all(buf)?;
        self.file.sync_data()?;
        Ok(())
    }
}

// =============================================================================
// Record Encoding
// =============================================================================

fn put_header(buf: &mut BytesMut) {
    buf.put_slice(MAGIC);
    buf.put_u16_le(VERSION);
}

/// Encode one record: [crc][key_len][key][id]
pub(crate) fn encode_record(buf: &mut BytesMut, key: &str, id: &SectionId) -> Result<()> {
    let key_len = u32::try_from(key.len()).map_err(|_| {
        StoreError::InvalidEncoding(format!("index key of {} bytes is too long", key.len()))
    })?;

    let mut body = BytesMut::with_capacity(4 + key.len() + ID_SIZE);
    body.put_u32_le(key_len);
    body.put_slice(key.as_bytes());
    body.put_slice(id.as_bytes());

    buf.put_u32_le(crc32fast::hash(&body));
    buf.put_slice(&body);
    Ok(())
}

/// Outcome of replaying the record area
pub(crate) struct Replayed {
    pub(crate) entries: HashMap<String, SectionId>,
    pub(crate) records: u64,
    /// Bytes of the record area covered by valid records
    pub(crate) valid_len: u64,
}

/// Replay records until the data ends or the first invalid record
pub(crate) fn replay(data: &[u8]) -> Replayed {
    let mut entries = HashMap::new();
    let mut records = 0u64;
    let mut cursor = data;

    loop {
        let offset = data.len() - cursor.remaining();
        match decode_record(&mut cursor) {
            Some((key, id)) => {
                entries.insert(key, id);
                records += 1;
            }
            None => {
                return Replayed {
                    entries,
                    records,
                    valid_len: offset as u64,
                };
            }
        }
    }
}

/// Decode one record, or `None` if the remaining bytes do not hold a valid one
fn decode_record(cursor: &mut &[u8]) -> Option<(String, SectionId)> {
    if cursor.remaining() < RECORD_PREFIX {
        return None;
    }

    let mut peek = *cursor;
    let crc = peek.get_u32_le();
    let body = peek;
    let key_len = peek.get_u32_le() as usize;

    let body_len = 4usize.checked_add(key_len)?.checked_add(ID_SIZE)?;
    if body.len() < body_len {
        return None;
    }
    let body = &body[..body_len];
    if crc32fast::hash(body) != crc {
        return None;
    }

    let key = std::str::from_utf8(&body[4..4 + key_len]).ok()?.to_string();
    let id_bytes: [u8; ID_SIZE] = body[4 + key_len..].try_into().ok()?;

    cursor.advance(4 + body_len);
    Some((key, SectionId::from_bytes(id_bytes)))
}

fn check_header(contents: &[u8]) -> Result<()> {
    if contents.len() < HEADER_SIZE as usize {
        return Err(StoreError::IndexCorruption(format!(
            "header truncated: {} bytes",
            contents.len()
        )));
    }

    let mut header = &contents[..HEADER_SIZE as usize];
    if &header[..4] != MAGIC {
        return Err(StoreError::IndexCorruption(format!(
            "invalid magic: expected SIDX, got {:?}",
            &header[..4]
        )));
    }
    header.advance(4);

    let version = header.get_u16_le();
    if version != VERSION {
        return Err(StoreError::IndexCorruption(format!(
            "unsupported version: {}",
            version
        )));
    }

    Ok(())
}
