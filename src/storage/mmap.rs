//! Read-only memory-mapped files in the [`StructWriter`](super::StructWriter) layout.

use std::fs::File;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use memmap2::{Mmap, MmapOptions};

use crate::error::{LexiclassError, Result};
use crate::storage::structured::CHECKSUM_LEN;
use crate::storage::traits::StorageError;

const HEADER_LEN: usize = 8;

/// A memory-mapped file whose header and checksum trailer have been verified.
///
/// The mapping is released when the value is dropped.
#[derive(Debug)]
pub struct MappedFile {
    mmap: Mmap,
}

impl MappedFile {
    /// Map `path`, then check the magic number, format version and CRC32 trailer.
    pub fn open<P: AsRef<Path>>(path: P, magic: u32, version: u32) -> Result<Self> {
        let path = path.as_ref();
        let name = path.display().to_string();

        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::FileNotFound(name.clone())
            } else {
                StorageError::IoError(e.to_string())
            }
        })?;

        // SAFETY: dictionary directories are written once and never modified
        // in place; a concurrent writer always goes through a staging directory.
        let mmap = unsafe {
            MmapOptions::new()
                .map(&file)
                .map_err(|e| LexiclassError::storage(format!("Failed to mmap file {name}: {e}")))?
        };

        if mmap.len() < HEADER_LEN + CHECKSUM_LEN as usize {
            return Err(LexiclassError::index(format!("File too short: {name}")));
        }

        let payload_len = mmap.len() - CHECKSUM_LEN as usize;
        let stored = LittleEndian::read_u32(&mmap[payload_len..]);
        let computed = crc32fast::hash(&mmap[..payload_len]);
        if stored != computed {
            return Err(LexiclassError::index(format!(
                "Checksum mismatch in {name}: stored {stored:#010x}, computed {computed:#010x}"
            )));
        }

        let found_magic = LittleEndian::read_u32(&mmap[0..4]);
        if found_magic != magic {
            return Err(LexiclassError::index(format!(
                "Bad magic number in {name}: {found_magic:#010x}"
            )));
        }
        let found_version = LittleEndian::read_u32(&mmap[4..8]);
        if found_version != version {
            return Err(LexiclassError::index(format!(
                "Unsupported format version {found_version} in {name}"
            )));
        }

        Ok(MappedFile { mmap })
    }

    /// The bytes between the header and the checksum trailer.
    pub fn body(&self) -> &[u8] {
        &self.mmap[HEADER_LEN..self.mmap.len() - CHECKSUM_LEN as usize]
    }

    /// Total mapped length, header and trailer included.
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Whether the file carries no body bytes.
    pub fn is_empty(&self) -> bool {
        self.body().is_empty()
    }
}
