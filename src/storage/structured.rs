//! Structured binary I/O for dictionary files.
//!
//! Every file written through [`StructWriter`] starts with a magic number and a
//! format version and ends with a CRC32 of all preceding bytes. Integers are
//! little-endian; counts and lengths are varints.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher;

use crate::error::{LexiclassError, Result};
use crate::storage::{StorageInput, StorageOutput};
use crate::util::varint::{self, encode_u64};

/// Size of the CRC32 trailer appended by [`StructWriter::close`].
pub const CHECKSUM_LEN: u64 = 4;

/// A structured file writer for binary data.
pub struct StructWriter<W: StorageOutput> {
    writer: W,
    hasher: Hasher,
    position: u64,
}

impl<W: StorageOutput> StructWriter<W> {
    /// Create a new structured file writer.
    pub fn new(writer: W) -> Self {
        StructWriter {
            writer,
            hasher: Hasher::new(),
            position: 0,
        }
    }

    /// Write the magic number and format version.
    pub fn write_header(&mut self, magic: u32, version: u32) -> Result<()> {
        self.write_u32(magic)?;
        self.write_u32(version)
    }

    /// Write a u8 value.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.writer.write_u8(value)?;
        self.track(&[value]);
        Ok(())
    }

    /// Write a u32 value (little-endian).
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.writer.write_u32::<LittleEndian>(value)?;
        self.track(&value.to_le_bytes());
        Ok(())
    }

    /// Write a u64 value (little-endian).
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.writer.write_u64::<LittleEndian>(value)?;
        self.track(&value.to_le_bytes());
        Ok(())
    }

    /// Write a variable-length integer.
    pub fn write_varint(&mut self, value: u64) -> Result<()> {
        let encoded = encode_u64(value);
        self.write_raw(&encoded)
    }

    /// Write a string with a varint length prefix.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        let bytes = value.as_bytes();
        self.write_varint(bytes.len() as u64)?;
        self.write_raw(bytes)
    }

    /// Write an optional string as a presence flag followed by the string.
    pub fn write_opt_string(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => {
                self.write_u8(1)?;
                self.write_string(value)
            }
            None => self.write_u8(0),
        }
    }

    /// Write raw bytes without length prefix.
    pub fn write_raw(&mut self, value: &[u8]) -> Result<()> {
        self.writer.write_all(value)?;
        self.track(value);
        Ok(())
    }

    /// Bytes written so far, excluding the trailer.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// CRC32 of the bytes written so far.
    pub fn checksum(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    fn track(&mut self, data: &[u8]) {
        self.hasher.update(data);
        self.position += data.len() as u64;
    }

    /// Write the checksum trailer, then flush, sync and close the output.
    pub fn close(mut self) -> Result<()> {
        let checksum = self.checksum();
        self.writer.write_u32::<LittleEndian>(checksum)?;
        self.writer.flush_and_sync()?;
        self.writer.close()
    }
}

/// A structured file reader for binary data.
pub struct StructReader<R: StorageInput> {
    reader: R,
    hasher: Hasher,
    position: u64,
    file_size: u64,
}

impl<R: StorageInput> StructReader<R> {
    /// Create a new structured file reader.
    pub fn new(reader: R) -> Result<Self> {
        let file_size = reader.size()?;
        if file_size < CHECKSUM_LEN {
            return Err(LexiclassError::index("File too short for checksum"));
        }
        Ok(StructReader {
            reader,
            hasher: Hasher::new(),
            position: 0,
            file_size,
        })
    }

    /// Read and check the magic number and format version.
    pub fn read_header(&mut self, magic: u32, version: u32) -> Result<()> {
        let found = self.read_u32()?;
        if found != magic {
            return Err(LexiclassError::index(format!(
                "Bad magic number: expected {magic:#010x}, found {found:#010x}"
            )));
        }
        let found = self.read_u32()?;
        if found != version {
            return Err(LexiclassError::index(format!(
                "Unsupported format version {found} (expected {version})"
            )));
        }
        Ok(())
    }

    /// Read a u8 value.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure_available(1)?;
        let value = self.reader.read_u8()?;
        self.track(&[value]);
        Ok(value)
    }

    /// Read a u32 value (little-endian).
    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure_available(4)?;
        let value = self.reader.read_u32::<LittleEndian>()?;
        self.track(&value.to_le_bytes());
        Ok(value)
    }

    /// Read a u64 value (little-endian).
    pub fn read_u64(&mut self) -> Result<u64> {
        self.ensure_available(8)?;
        let value = self.reader.read_u64::<LittleEndian>()?;
        self.track(&value.to_le_bytes());
        Ok(value)
    }

    /// Read a variable-length integer.
    pub fn read_varint(&mut self) -> Result<u64> {
        let (value, bytes) = varint::read_u64(&mut self.reader)?;
        if self.position + bytes.len() as u64 > self.payload_len() {
            return Err(LexiclassError::index("Unexpected end of file"));
        }
        self.track(&bytes);
        Ok(value)
    }

    /// Read a varint that must fit in a `usize` bounded by the remaining payload.
    pub fn read_len(&mut self) -> Result<usize> {
        let len = self.read_varint()?;
        if len > self.payload_len() {
            return Err(LexiclassError::index(format!("Implausible length {len}")));
        }
        Ok(len as usize)
    }

    /// Read a string with a varint length prefix.
    pub fn read_string(&mut self) -> Result<String> {
        let length = self.read_len()?;
        let bytes = self.read_raw(length)?;

        String::from_utf8(bytes).map_err(|e| LexiclassError::index(format!("Invalid UTF-8: {e}")))
    }

    /// Read an optional string written by [`StructWriter::write_opt_string`].
    pub fn read_opt_string(&mut self) -> Result<Option<String>> {
        match self.read_u8()? {
            0 => Ok(None),
            1 => self.read_string().map(Some),
            flag => Err(LexiclassError::index(format!(
                "Invalid presence flag {flag}"
            ))),
        }
    }

    /// Read exact number of raw bytes.
    pub fn read_raw(&mut self, length: usize) -> Result<Vec<u8>> {
        self.ensure_available(length as u64)?;
        let mut bytes = vec![0u8; length];
        self.reader.read_exact(&mut bytes)?;
        self.track(&bytes);
        Ok(bytes)
    }

    /// Current position in the payload.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Whether the whole payload has been consumed.
    pub fn is_eof(&self) -> bool {
        self.position >= self.payload_len()
    }

    fn payload_len(&self) -> u64 {
        self.file_size - CHECKSUM_LEN
    }

    fn ensure_available(&self, len: u64) -> Result<()> {
        if self.position + len > self.payload_len() {
            Err(LexiclassError::index("Unexpected end of file"))
        } else {
            Ok(())
        }
    }

    fn track(&mut self, data: &[u8]) {
        self.hasher.update(data);
        self.position += data.len() as u64;
    }

    /// Check that the payload was fully consumed and matches the stored trailer.
    pub fn verify_checksum(&mut self) -> Result<()> {
        if !self.is_eof() {
            return Err(LexiclassError::index(format!(
                "Trailing data: {} of {} payload bytes consumed",
                self.position,
                self.payload_len()
            )));
        }

        let stored = self.reader.read_u32::<LittleEndian>()?;
        let computed = self.hasher.clone().finalize();
        if stored != computed {
            return Err(LexiclassError::index(format!(
                "Checksum mismatch: stored {stored:#010x}, computed {computed:#010x}"
            )));
        }
        Ok(())
    }

    /// Close the reader.
    pub fn close(mut self) -> Result<()> {
        self.reader.close()
    }
}
