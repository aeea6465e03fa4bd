//! Hash-table backed dictionary.

use std::path::Path;

use ahash::AHashMap;
use log::{debug, info};

use crate::analysis::feature_setting::FeatureSetting;
use crate::classification::category::{CategoryEntries, CategoryEntry};
use crate::dictionary::builder::DictionaryBuilder;
use crate::dictionary::persisted::PersistedDictionary;
use crate::dictionary::{DictionaryEntry, DictionaryModel, EntryIter};
use crate::error::{LexiclassError, Result};
use crate::storage::file::FileStorage;
use crate::storage::structured::{StructReader, StructWriter};
use crate::storage::traits::{Storage, StorageConfig};

/// Magic number of the single-file dictionary format ("LXDC").
pub const DICTIONARY_MAGIC: u32 = 0x4C58_4443;
pub const DICTIONARY_VERSION: u32 = 1;

/// An immutable dictionary held in memory.
///
/// Created by [`DictionaryBuilder::create`]; use [`into_builder`](Self::into_builder)
/// to continue training. Two dictionaries are equal when their name, feature
/// setting, categories and counts are equal.
#[derive(Debug, Clone, PartialEq)]
pub struct InMemoryDictionary {
    name: Option<String>,
    feature_setting: Option<FeatureSetting>,
    /// Sorted by name; indices below refer to this vector.
    categories: Vec<Box<str>>,
    terms: AHashMap<Box<str>, Box<[(u32, u64)]>>,
    raw_document_counts: Vec<u64>,
    raw_term_counts: Vec<u64>,
    document_counts: CategoryEntries,
    term_counts: CategoryEntries,
    num_entries: usize,
}

impl InMemoryDictionary {
    pub(crate) fn from_parts(
        name: Option<String>,
        feature_setting: Option<FeatureSetting>,
        categories: Vec<Box<str>>,
        terms: AHashMap<Box<str>, Box<[(u32, u64)]>>,
        raw_document_counts: Vec<u64>,
        raw_term_counts: Vec<u64>,
    ) -> Self {
        let document_counts = counts_to_entries(&categories, &raw_document_counts);
        let term_counts = counts_to_entries(&categories, &raw_term_counts);
        let num_entries = terms.values().map(|counts| counts.len()).sum();
        InMemoryDictionary {
            name,
            feature_setting,
            categories,
            terms,
            raw_document_counts,
            raw_term_counts,
            document_counts,
            term_counts,
            num_entries,
        }
    }

    /// A dictionary with no categories and no terms.
    pub fn empty() -> Self {
        DictionaryBuilder::new().create()
    }

    fn entries_for(&self, counts: &[(u32, u64)]) -> CategoryEntries {
        CategoryEntries::from_unique(
            counts
                .iter()
                .map(|(id, count)| CategoryEntry::new(&*self.categories[*id as usize], *count as f64))
                .collect(),
        )
    }

    /// The dictionary holding the counts of both `self` and `other`.
    pub fn merge<M: DictionaryModel + ?Sized>(&self, other: &M) -> Result<InMemoryDictionary> {
        let mut builder = self.clone().into_builder()?;
        builder.add_dictionary(other)?;
        Ok(builder.create())
    }

    /// A builder pre-loaded with this dictionary's counts.
    pub fn into_builder(self) -> Result<DictionaryBuilder> {
        let mut builder = match &self.feature_setting {
            Some(setting) => DictionaryBuilder::with_feature_setting(setting.clone()),
            None => DictionaryBuilder::new(),
        };
        if let Some(name) = &self.name {
            builder.set_name(name.clone());
        }
        builder.add_dictionary(&self)?;
        Ok(builder)
    }

    /// Write an on-disk index of this dictionary at `target`.
    ///
    /// See [`PersistedDictionary::index`].
    pub fn index<P: AsRef<Path>>(&self, target: P) -> Result<PersistedDictionary> {
        PersistedDictionary::index(self, target)
    }

    /// Serialize as a single checksummed file named `name` in `storage`.
    pub fn write_to_storage(&self, storage: &dyn Storage, name: &str) -> Result<()> {
        let output = storage.create_output(name)?;
        let mut writer = StructWriter::new(output);

        writer.write_header(DICTIONARY_MAGIC, DICTIONARY_VERSION)?;
        writer.write_opt_string(self.name.as_deref())?;
        let setting = self
            .feature_setting
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        writer.write_opt_string(setting.as_deref())?;

        writer.write_varint(self.categories.len() as u64)?;
        for (i, category) in self.categories.iter().enumerate() {
            writer.write_string(category)?;
            writer.write_varint(self.raw_document_counts[i])?;
            writer.write_varint(self.raw_term_counts[i])?;
        }

        writer.write_varint(self.terms.len() as u64)?;
        for (term, counts) in self.sorted_terms() {
            writer.write_string(term)?;
            writer.write_varint(counts.len() as u64)?;
            for (id, count) in counts.iter() {
                writer.write_varint(*id as u64)?;
                writer.write_varint(*count)?;
            }
        }

        writer.close()?;
        debug!("wrote dictionary {name} with {} terms", self.terms.len());
        Ok(())
    }

    /// Inverse of [`write_to_storage`](Self::write_to_storage).
    pub fn read_from_storage(storage: &dyn Storage, name: &str) -> Result<InMemoryDictionary> {
        let input = storage.open_input(name)?;
        let mut reader = StructReader::new(input)?;

        reader.read_header(DICTIONARY_MAGIC, DICTIONARY_VERSION)?;
        let dictionary_name = reader.read_opt_string()?;
        let feature_setting = reader
            .read_opt_string()?
            .map(|json| serde_json::from_str::<FeatureSetting>(&json))
            .transpose()?;

        let num_categories = reader.read_len()?;
        let mut categories = Vec::with_capacity(num_categories);
        let mut document_counts = Vec::with_capacity(num_categories);
        let mut term_counts = Vec::with_capacity(num_categories);
        for _ in 0..num_categories {
            categories.push(reader.read_string()?.into_boxed_str());
            document_counts.push(reader.read_varint()?);
            term_counts.push(reader.read_varint()?);
        }
        if categories.windows(2).any(|w| w[0] >= w[1]) {
            return Err(LexiclassError::index("Categories are not sorted and unique"));
        }

        let num_terms = reader.read_len()?;
        let mut terms = AHashMap::with_capacity(num_terms);
        for _ in 0..num_terms {
            let term = reader.read_string()?;
            let num_pairs = reader.read_len()?;
            let mut counts = Vec::with_capacity(num_pairs);
            for _ in 0..num_pairs {
                let id = reader.read_varint()?;
                if id >= num_categories as u64 {
                    return Err(LexiclassError::index(format!(
                        "Category index {id} out of range for term {term}"
                    )));
                }
                counts.push((id as u32, reader.read_varint()?));
            }
            terms.insert(term.into_boxed_str(), counts.into_boxed_slice());
        }

        reader.verify_checksum()?;
        reader.close()?;

        Ok(InMemoryDictionary::from_parts(
            dictionary_name,
            feature_setting,
            categories,
            terms,
            document_counts,
            term_counts,
        ))
    }

    /// Save to `directory/file_name`, creating the directory if needed.
    pub fn save<P: AsRef<Path>>(&self, directory: P, file_name: &str) -> Result<()> {
        let storage = FileStorage::new(directory, StorageConfig::default())?;
        self.write_to_storage(&storage, file_name)?;
        storage.sync()?;
        info!(
            "saved dictionary to {}",
            storage.file_path(file_name).display()
        );
        Ok(())
    }

    /// Load a dictionary written by [`save`](Self::save).
    pub fn load<P: AsRef<Path>>(directory: P, file_name: &str) -> Result<InMemoryDictionary> {
        let storage = FileStorage::open(directory, StorageConfig::default())?;
        InMemoryDictionary::read_from_storage(&storage, file_name)
    }

    fn sorted_terms(&self) -> Vec<(&str, &[(u32, u64)])> {
        let mut terms: Vec<(&str, &[(u32, u64)])> = self
            .terms
            .iter()
            .map(|(term, counts)| (&**term, &**counts))
            .collect();
        terms.sort_unstable_by(|a, b| a.0.cmp(b.0));
        terms
    }
}

impl Default for InMemoryDictionary {
    fn default() -> Self {
        InMemoryDictionary::empty()
    }
}

impl DictionaryModel for InMemoryDictionary {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn feature_setting(&self) -> Option<&FeatureSetting> {
        self.feature_setting.as_ref()
    }

    fn category_entries(&self, term: &str) -> Result<CategoryEntries> {
        Ok(self
            .terms
            .get(term)
            .map_or_else(CategoryEntries::empty, |counts| self.entries_for(counts)))
    }

    fn document_counts(&self) -> &CategoryEntries {
        &self.document_counts
    }

    fn term_counts(&self) -> &CategoryEntries {
        &self.term_counts
    }

    fn num_unique_terms(&self) -> usize {
        self.terms.len()
    }

    fn num_entries(&self) -> usize {
        self.num_entries
    }

    fn categories(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.to_string()).collect()
    }

    fn num_categories(&self) -> usize {
        self.categories.len()
    }

    fn entries(&self) -> EntryIter<'_> {
        Box::new(
            self.sorted_terms()
                .into_iter()
                .map(|(term, counts)| Ok(DictionaryEntry::new(term, self.entries_for(counts)))),
        )
    }
}

fn counts_to_entries(categories: &[Box<str>], counts: &[u64]) -> CategoryEntries {
    CategoryEntries::from_unique(
        categories
            .iter()
            .zip(counts)
            .map(|(name, count)| CategoryEntry::new(&**name, *count as f64))
            .collect(),
    )
}
