//! Read-only dictionary served from an on-disk index.
//!
//! An index directory holds four files:
//!
//! - `dictionary.meta`: JSON metadata (format version, name, feature setting,
//!   category names, entry and term counts, creation time),
//! - `counts.bin`: per-category document and term counts,
//! - `terms.bin`: one record per term in term order: the term string, the
//!   number of categories it occurs in, then `(category index, count)` varint
//!   pairs,
//! - `terms.idx`: the little-endian `u64` offset of every record in
//!   `terms.bin`, relative to the end of its header.
//!
//! The binary files share the [`StructWriter`] layout (magic, version, body,
//! CRC32 trailer). `terms.bin` and `terms.idx` are memory-mapped on open and
//! lookups binary-search the offset table.
//!
//! An index is built once in a staging directory next to the target and
//! renamed into place, so a target directory is either complete or absent.

use std::cmp::Ordering;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use byteorder::{ByteOrder, LittleEndian};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::feature_setting::FeatureSetting;
use crate::classification::category::{CategoryEntries, CategoryEntry};
use crate::dictionary::{DictionaryEntry, DictionaryModel, EntryIter};
use crate::error::{LexiclassError, Result};
use crate::storage::file::FileStorage;
use crate::storage::mmap::MappedFile;
use crate::storage::structured::{StructReader, StructWriter};
use crate::storage::traits::{Storage, StorageConfig, StorageError, StorageOutput};
use crate::util::varint;

pub const FORMAT_VERSION: u32 = 1;

const META_FILE: &str = "dictionary.meta";
const COUNTS_FILE: &str = "counts.bin";
const TERMS_FILE: &str = "terms.bin";
const OFFSETS_FILE: &str = "terms.idx";

const COUNTS_MAGIC: u32 = 0x4C58_434E; // "LXCN"
const TERMS_MAGIC: u32 = 0x4C58_5452; // "LXTR"
const OFFSETS_MAGIC: u32 = 0x4C58_4F46; // "LXOF"

const OFFSET_WIDTH: usize = 8;

/// Contents of `dictionary.meta`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DictionaryMeta {
    pub format_version: u32,
    pub name: Option<String>,
    pub feature_setting: Option<FeatureSetting>,
    /// Sorted category names; record category indices refer to this list.
    pub categories: Vec<String>,
    pub num_entries: usize,
    pub num_unique_terms: usize,
    pub created_at: DateTime<Utc>,
}

/// The mapped term tables, present until the dictionary is closed.
#[derive(Debug)]
struct TermTable {
    terms: MappedFile,
    offsets: MappedFile,
}

/// A dictionary index opened from disk.
///
/// Lookups are served from memory maps, so dictionaries larger than memory
/// work. The mappings are released by [`close`](Self::close) or on drop;
/// after `close` every lookup fails with a storage-closed error.
///
/// # Examples
///
/// ```no_run
/// use lexiclass::dictionary::{DictionaryBuilder, DictionaryModel, PersistedDictionary};
///
/// let mut builder = DictionaryBuilder::new();
/// builder.add_document(&["cheap", "pills"], "spam").unwrap();
/// let index = builder.create().index("/tmp/spam-index").unwrap();
///
/// let reopened = PersistedDictionary::open("/tmp/spam-index").unwrap();
/// assert_eq!(reopened.category_entries("cheap").unwrap().count("spam"), 1);
/// # drop(index);
/// ```
#[derive(Debug)]
pub struct PersistedDictionary {
    directory: PathBuf,
    meta: DictionaryMeta,
    document_counts: CategoryEntries,
    term_counts: CategoryEntries,
    table: Option<TermTable>,
}

impl PersistedDictionary {
    /// Write an index of `model` into the new directory `target` and open it.
    ///
    /// Fails with [`StorageError::FileExists`] if `target` already exists.
    pub fn index<M, P>(model: &M, target: P) -> Result<PersistedDictionary>
    where
        M: DictionaryModel + ?Sized,
        P: AsRef<Path>,
    {
        let target = target.as_ref();
        if target.exists() {
            return Err(StorageError::FileExists(target.display().to_string()).into());
        }

        let file_name = target
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                LexiclassError::invalid_config(format!(
                    "Index path has no usable file name: {}",
                    target.display()
                ))
            })?;
        let parent = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let staging = parent.join(format!(".{file_name}.staging-{}", Uuid::new_v4()));
        let mut guard = StagingGuard::new(staging.clone());

        let storage = FileStorage::new(&staging, StorageConfig::default())?;
        let (num_entries, num_unique_terms) = write_tables(model, &storage)?;

        let meta = DictionaryMeta {
            format_version: FORMAT_VERSION,
            name: model.name().map(str::to_string),
            feature_setting: model.feature_setting().cloned(),
            categories: model.categories(),
            num_entries,
            num_unique_terms,
            created_at: Utc::now(),
        };
        let mut output = storage.create_output(META_FILE)?;
        serde_json::to_writer_pretty(&mut output, &meta)?;
        output.write_all(b"\n")?;
        output.close()?;
        storage.sync()?;

        if target.exists() {
            return Err(StorageError::FileExists(target.display().to_string()).into());
        }
        fs::rename(&staging, target)?;
        guard.disarm();

        info!(
            "indexed dictionary to {} ({num_unique_terms} terms, {num_entries} entries)",
            target.display()
        );
        PersistedDictionary::open(target)
    }

    /// Open an index directory written by [`index`](Self::index).
    ///
    /// Any number of handles may be open on the same directory at once.
    pub fn open<P: AsRef<Path>>(directory: P) -> Result<PersistedDictionary> {
        let directory = directory.as_ref();
        let storage = FileStorage::open(directory, StorageConfig::default())?;

        let meta: DictionaryMeta = serde_json::from_reader(storage.open_input(META_FILE)?)?;
        if meta.format_version != FORMAT_VERSION {
            return Err(LexiclassError::index(format!(
                "Unsupported index format version {} (expected {FORMAT_VERSION})",
                meta.format_version
            )));
        }

        let (document_counts, term_counts) = read_counts(&storage, &meta.categories)?;

        let terms = MappedFile::open(storage.file_path(TERMS_FILE), TERMS_MAGIC, FORMAT_VERSION)?;
        let offsets =
            MappedFile::open(storage.file_path(OFFSETS_FILE), OFFSETS_MAGIC, FORMAT_VERSION)?;
        if offsets.body().len() != meta.num_unique_terms * OFFSET_WIDTH {
            return Err(LexiclassError::index(format!(
                "Offset table holds {} bytes, expected {} terms",
                offsets.body().len(),
                meta.num_unique_terms
            )));
        }

        info!(
            "opened dictionary index {} ({} terms, {} categories)",
            directory.display(),
            meta.num_unique_terms,
            meta.categories.len()
        );

        Ok(PersistedDictionary {
            directory: directory.to_path_buf(),
            meta,
            document_counts,
            term_counts,
            table: Some(TermTable { terms, offsets }),
        })
    }

    /// Release the memory maps. Calling it again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.table.take().is_some() {
            info!("closed dictionary index {}", self.directory.display());
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.table.is_none()
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn meta(&self) -> &DictionaryMeta {
        &self.meta
    }

    fn table(&self) -> Result<&TermTable> {
        self.table
            .as_ref()
            .ok_or_else(|| StorageError::StorageClosed.into())
    }

    fn record_offset(table: &TermTable, i: usize) -> usize {
        let start = i * OFFSET_WIDTH;
        LittleEndian::read_u64(&table.offsets.body()[start..start + OFFSET_WIDTH]) as usize
    }

    /// Index of `term` in the sorted record list and the cursor after its term string.
    fn find<'a>(&self, table: &'a TermTable, term: &str) -> Result<Option<RecordCursor<'a>>> {
        let body = table.terms.body();
        let (mut low, mut high) = (0usize, self.meta.num_unique_terms);
        while low < high {
            let mid = low + (high - low) / 2;
            let mut cursor = RecordCursor::at(body, Self::record_offset(table, mid))?;
            let candidate = cursor.read_str()?;
            match candidate.as_bytes().cmp(term.as_bytes()) {
                Ordering::Less => low = mid + 1,
                Ordering::Greater => high = mid,
                Ordering::Equal => return Ok(Some(cursor)),
            }
        }
        Ok(None)
    }

    fn decode_counts(&self, cursor: &mut RecordCursor<'_>) -> Result<CategoryEntries> {
        let num_pairs = cursor.read_varint()? as usize;
        let mut entries = Vec::with_capacity(num_pairs.min(self.meta.categories.len()));
        for _ in 0..num_pairs {
            let id = cursor.read_varint()? as usize;
            let count = cursor.read_varint()?;
            let name = self.meta.categories.get(id).ok_or_else(|| {
                LexiclassError::index(format!("Category index {id} out of range"))
            })?;
            entries.push(CategoryEntry::new(name.as_str(), count as f64));
        }
        Ok(CategoryEntries::from_unique(entries))
    }

    fn decode_entry(&self, table: &TermTable, i: usize) -> Result<DictionaryEntry> {
        let mut cursor = RecordCursor::at(table.terms.body(), Self::record_offset(table, i))?;
        let term = cursor.read_str()?;
        let counts = self.decode_counts(&mut cursor)?;
        Ok(DictionaryEntry::new(term, counts))
    }
}

impl DictionaryModel for PersistedDictionary {
    fn name(&self) -> Option<&str> {
        self.meta.name.as_deref()
    }

    fn feature_setting(&self) -> Option<&FeatureSetting> {
        self.meta.feature_setting.as_ref()
    }

    fn category_entries(&self, term: &str) -> Result<CategoryEntries> {
        let table = self.table()?;
        match self.find(table, term)? {
            Some(mut cursor) => self.decode_counts(&mut cursor),
            None => Ok(CategoryEntries::empty()),
        }
    }

    fn document_counts(&self) -> &CategoryEntries {
        &self.document_counts
    }

    fn term_counts(&self) -> &CategoryEntries {
        &self.term_counts
    }

    fn num_unique_terms(&self) -> usize {
        self.meta.num_unique_terms
    }

    fn num_entries(&self) -> usize {
        self.meta.num_entries
    }

    fn categories(&self) -> Vec<String> {
        self.meta.categories.clone()
    }

    fn num_categories(&self) -> usize {
        self.meta.categories.len()
    }

    fn entries(&self) -> EntryIter<'_> {
        match self.table() {
            Ok(table) => {
                Box::new((0..self.meta.num_unique_terms).map(move |i| self.decode_entry(table, i)))
            }
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }
}

/// Write `counts.bin`, `terms.bin` and `terms.idx`; returns the entry and term counts.
fn write_tables<M: DictionaryModel + ?Sized>(
    model: &M,
    storage: &FileStorage,
) -> Result<(usize, usize)> {
    let categories = model.categories();
    let category_index: AHashMap<&str, u64> = categories
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i as u64))
        .collect();

    let mut counts = StructWriter::new(storage.create_output(COUNTS_FILE)?);
    counts.write_header(COUNTS_MAGIC, FORMAT_VERSION)?;
    counts.write_varint(categories.len() as u64)?;
    for category in &categories {
        counts.write_varint(model.document_counts().count(category))?;
    }
    for category in &categories {
        counts.write_varint(model.term_counts().count(category))?;
    }
    counts.close()?;

    let mut entries = model.entries().collect::<Result<Vec<_>>>()?;
    entries.sort_unstable_by(|a, b| a.term.cmp(&b.term));
    if let Some(pair) = entries.windows(2).find(|w| w[0].term == w[1].term) {
        return Err(LexiclassError::index(format!(
            "Duplicate term in dictionary: {}",
            pair[0].term
        )));
    }

    let mut terms = StructWriter::new(storage.create_output(TERMS_FILE)?);
    terms.write_header(TERMS_MAGIC, FORMAT_VERSION)?;
    let body_start = terms.position();
    let mut offsets = Vec::with_capacity(entries.len());
    let mut num_entries = 0;

    for entry in &entries {
        let mut pairs = Vec::with_capacity(entry.category_entries.len());
        for category in &entry.category_entries {
            let id = category_index.get(category.name()).ok_or_else(|| {
                LexiclassError::index(format!(
                    "Term {} refers to unknown category {}",
                    entry.term,
                    category.name()
                ))
            })?;
            let count = category.score().round() as u64;
            if count > 0 {
                pairs.push((*id, count));
            }
        }
        pairs.sort_unstable();

        offsets.push(terms.position() - body_start);
        terms.write_string(&entry.term)?;
        terms.write_varint(pairs.len() as u64)?;
        for (id, count) in &pairs {
            terms.write_varint(*id)?;
            terms.write_varint(*count)?;
        }
        num_entries += pairs.len();
    }
    terms.close()?;

    let mut table = StructWriter::new(storage.create_output(OFFSETS_FILE)?);
    table.write_header(OFFSETS_MAGIC, FORMAT_VERSION)?;
    for offset in &offsets {
        table.write_u64(*offset)?;
    }
    table.close()?;

    debug!(
        "wrote {} term records into {}",
        entries.len(),
        storage.directory().display()
    );
    Ok((num_entries, entries.len()))
}

fn read_counts(
    storage: &FileStorage,
    categories: &[String],
) -> Result<(CategoryEntries, CategoryEntries)> {
    let mut reader = StructReader::new(storage.open_input(COUNTS_FILE)?)?;
    reader.read_header(COUNTS_MAGIC, FORMAT_VERSION)?;

    let num_categories = reader.read_len()?;
    if num_categories != categories.len() {
        return Err(LexiclassError::index(format!(
            "counts.bin lists {num_categories} categories, metadata lists {}",
            categories.len()
        )));
    }

    let mut document_counts = Vec::with_capacity(num_categories);
    for category in categories {
        document_counts.push(CategoryEntry::new(category.as_str(), reader.read_varint()? as f64));
    }
    let mut term_counts = Vec::with_capacity(num_categories);
    for category in categories {
        term_counts.push(CategoryEntry::new(category.as_str(), reader.read_varint()? as f64));
    }

    reader.verify_checksum()?;
    reader.close()?;
    Ok((
        CategoryEntries::from_unique(document_counts),
        CategoryEntries::from_unique(term_counts),
    ))
}

/// Bounds-checked decoding of a `terms.bin` record.
struct RecordCursor<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> RecordCursor<'a> {
    fn at(bytes: &'a [u8], position: usize) -> Result<Self> {
        if position >= bytes.len() {
            return Err(LexiclassError::index(format!(
                "Record offset {position} beyond end of term table"
            )));
        }
        Ok(RecordCursor { bytes, position })
    }

    fn read_varint(&mut self) -> Result<u64> {
        let (value, read) = varint::decode_u64(&self.bytes[self.position..])?;
        self.position += read;
        Ok(value)
    }

    fn read_str(&mut self) -> Result<&'a str> {
        let len = self.read_varint()? as usize;
        let end = self
            .position
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| LexiclassError::index("Truncated term record"))?;
        let value = std::str::from_utf8(&self.bytes[self.position..end])
            .map_err(|e| LexiclassError::index(format!("Invalid UTF-8 in term record: {e}")))?;
        self.position = end;
        Ok(value)
    }
}

/// Removes the staging directory unless disarmed.
struct StagingGuard {
    path: PathBuf,
    armed: bool,
}

impl StagingGuard {
    fn new(path: PathBuf) -> Self {
        StagingGuard { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for StagingGuard {
    fn drop(&mut self) {
        if !self.armed || !self.path.exists() {
            return;
        }
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!("removed staging directory {}", self.path.display()),
            Err(e) => warn!(
                "failed to remove staging directory {}: {e}",
                self.path.display()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{DictionaryBuilder, InMemoryDictionary};
    use tempfile::TempDir;

    fn sample() -> InMemoryDictionary {
        let mut builder =
            DictionaryBuilder::with_feature_setting(FeatureSetting::words(1, 1).build().unwrap());
        builder.set_name("mail");
        builder.add_document(&["cheap", "pills", "now"], "spam").unwrap();
        builder.add_document(&["cheap", "room"], "ham").unwrap();
        builder.add_document(&["meeting", "room", "now"], "ham").unwrap();
        builder.add_document(&["über", "cheap"], "news").unwrap();
        builder.create()
    }

    #[test]
    fn test_index_matches_memory() {
        let dir = TempDir::new().unwrap();
        let memory = sample();
        let persisted = memory.index(dir.path().join("mail")).unwrap();

        assert_eq!(persisted.name(), Some("mail"));
        assert_eq!(persisted.feature_setting(), memory.feature_setting());
        assert_eq!(persisted.categories(), memory.categories());
        assert_eq!(persisted.num_unique_terms(), memory.num_unique_terms());
        assert_eq!(persisted.num_entries(), memory.num_entries());
        assert_eq!(persisted.document_counts(), memory.document_counts());
        assert_eq!(persisted.term_counts(), memory.term_counts());

        for term in ["cheap", "meeting", "now", "pills", "room", "über", "missing", ""] {
            assert_eq!(
                persisted.category_entries(term).unwrap(),
                memory.category_entries(term).unwrap(),
                "term {term}"
            );
        }

        let a: Vec<_> = persisted.entries().map(|e| e.unwrap()).collect();
        let b: Vec<_> = memory.entries().map(|e| e.unwrap()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_index_refuses_existing_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("mail");
        fs::create_dir(&target).unwrap();

        let err = PersistedDictionary::index(&sample(), &target).unwrap_err();
        assert!(err.to_string().contains("File already exists"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_meta_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("mail");
        sample().index(&target).unwrap();

        let json = fs::read_to_string(target.join(META_FILE)).unwrap();
        let meta: DictionaryMeta = serde_json::from_str(&json).unwrap();
        assert_eq!(meta.format_version, FORMAT_VERSION);
        assert_eq!(meta.categories, vec!["ham", "news", "spam"]);
        assert_eq!(meta.num_unique_terms, 6);
    }

    #[test]
    fn test_close_is_idempotent_and_blocks_reads() {
        let dir = TempDir::new().unwrap();
        let mut persisted = sample().index(dir.path().join("mail")).unwrap();

        persisted.close().unwrap();
        persisted.close().unwrap();
        assert!(persisted.is_closed());

        let err = persisted.category_entries("cheap").unwrap_err();
        assert!(err.to_string().contains("Storage is closed"));
        assert!(persisted.entries().next().unwrap().is_err());
    }

    #[test]
    fn test_concurrent_opens_and_reopen() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("mail");
        let mut first = sample().index(&target).unwrap();
        let second = PersistedDictionary::open(&target).unwrap();

        assert_eq!(
            first.category_entries("room").unwrap(),
            second.category_entries("room").unwrap()
        );

        first.close().unwrap();
        assert_eq!(second.category_entries("room").unwrap().count("ham"), 2);

        let reopened = PersistedDictionary::open(&target).unwrap();
        assert_eq!(reopened.category_entries("cheap").unwrap().len(), 3);
    }

    #[test]
    fn test_open_missing_directory() {
        let dir = TempDir::new().unwrap();
        assert!(PersistedDictionary::open(dir.path().join("absent")).is_err());
    }

    #[test]
    fn test_corrupt_terms_detected() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("mail");
        sample().index(&target).unwrap();

        let path = target.join(TERMS_FILE);
        let mut bytes = fs::read(&path).unwrap();
        bytes[10] ^= 0x40;
        fs::write(&path, bytes).unwrap();

        let err = PersistedDictionary::open(&target).unwrap_err();
        assert!(err.to_string().contains("Checksum mismatch"));
    }

    #[derive(Debug)]
    struct FailingModel {
        counts: CategoryEntries,
    }

    impl DictionaryModel for FailingModel {
        fn name(&self) -> Option<&str> {
            None
        }
        fn feature_setting(&self) -> Option<&FeatureSetting> {
            None
        }
        fn category_entries(&self, _term: &str) -> Result<CategoryEntries> {
            Ok(CategoryEntries::empty())
        }
        fn document_counts(&self) -> &CategoryEntries {
            &self.counts
        }
        fn term_counts(&self) -> &CategoryEntries {
            &self.counts
        }
        fn num_unique_terms(&self) -> usize {
            1
        }
        fn num_entries(&self) -> usize {
            1
        }
        fn entries(&self) -> EntryIter<'_> {
            Box::new(std::iter::once(Err(LexiclassError::other("read failure"))))
        }
    }

    #[test]
    fn test_failed_index_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let model = FailingModel {
            counts: vec![("ham", 1.0)].into_iter().collect(),
        };

        assert!(PersistedDictionary::index(&model, dir.path().join("mail")).is_err());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_dictionary() {
        let dir = TempDir::new().unwrap();
        let persisted = InMemoryDictionary::empty()
            .index(dir.path().join("empty"))
            .unwrap();
        assert_eq!(persisted.num_unique_terms(), 0);
        assert!(persisted.category_entries("any").unwrap().is_empty());
        assert_eq!(persisted.entries().count(), 0);
    }
}
