//! Term dictionaries: the learned mapping from terms to per-category counts.
//!
//! [`DictionaryModel`] is the read contract shared by the two backends:
//!
//! - [`memory::InMemoryDictionary`], produced by [`builder::DictionaryBuilder::create`]
//!   and served from a hash table,
//! - [`persisted::PersistedDictionary`], an immutable on-disk index served
//!   through memory maps.
//!
//! Scorers and classifiers only ever see the trait, so the backends are
//! interchangeable at the call site.

use std::fmt;
use std::io::Write;

use csv::WriterBuilder;

use crate::analysis::feature_setting::FeatureSetting;
use crate::classification::category::CategoryEntries;
use crate::error::{LexiclassError, Result};

pub mod builder;
pub mod memory;
pub mod persisted;
pub mod pruning;

pub use builder::DictionaryBuilder;
pub use memory::InMemoryDictionary;
pub use persisted::PersistedDictionary;
pub use pruning::PruningStrategy;

/// A term together with its per-category counts.
#[derive(Clone, Debug, PartialEq)]
pub struct DictionaryEntry {
    pub term: String,
    pub category_entries: CategoryEntries,
}

impl DictionaryEntry {
    pub fn new<S: Into<String>>(term: S, category_entries: CategoryEntries) -> Self {
        DictionaryEntry {
            term: term.into(),
            category_entries,
        }
    }
}

impl fmt::Display for DictionaryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.term, self.category_entries)
    }
}

/// Iterator over the entries of a dictionary.
pub type EntryIter<'a> = Box<dyn Iterator<Item = Result<DictionaryEntry>> + 'a>;

/// Read-only access to a trained dictionary.
pub trait DictionaryModel: Send + Sync + fmt::Debug {
    /// Optional human-readable name.
    fn name(&self) -> Option<&str>;

    /// The setting the dictionary was trained with, if recorded.
    fn feature_setting(&self) -> Option<&FeatureSetting>;

    /// Per-category counts of `term`; empty when the term is unknown.
    fn category_entries(&self, term: &str) -> Result<CategoryEntries>;

    /// Number of training documents per category.
    fn document_counts(&self) -> &CategoryEntries;

    /// Number of term occurrences per category.
    fn term_counts(&self) -> &CategoryEntries;

    /// Number of distinct terms.
    fn num_unique_terms(&self) -> usize;

    /// Number of (term, category) pairs with a non-zero count.
    fn num_entries(&self) -> usize;

    /// Category names in ascending order.
    fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> =
            self.document_counts().names().map(str::to_string).collect();
        categories.sort();
        categories
    }

    fn num_categories(&self) -> usize {
        self.document_counts().len()
    }

    /// All entries, in an order that is stable for a given dictionary.
    fn entries(&self) -> EntryIter<'_>;

    /// Dump the dictionary as CSV: a `term,<category>...` header followed by
    /// one row of per-category probabilities per term.
    fn write_csv(&self, writer: &mut dyn Write) -> Result<()> {
        let categories = self.categories();
        let mut csv_writer = WriterBuilder::new().from_writer(writer);

        let mut header = Vec::with_capacity(categories.len() + 1);
        header.push("term");
        header.extend(categories.iter().map(String::as_str));
        csv_writer
            .write_record(&header)
            .map_err(|e| LexiclassError::storage(format!("Failed to write CSV header: {e}")))?;

        for entry in self.entries() {
            let entry = entry?;
            let mut record = Vec::with_capacity(categories.len() + 1);
            record.push(entry.term.clone());
            for category in &categories {
                record.push(entry.category_entries.probability(category).to_string());
            }
            csv_writer
                .write_record(&record)
                .map_err(|e| LexiclassError::storage(format!("Failed to write CSV record: {e}")))?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_csv() {
        let mut builder = DictionaryBuilder::new();
        builder.add_document(&["cheap", "pills"], "spam").unwrap();
        builder.add_document(&["cheap", "room"], "ham").unwrap();
        let dictionary = builder.create();

        let mut out = Vec::new();
        dictionary.write_csv(&mut out).unwrap();
        let csv = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "term,ham,spam");
        assert_eq!(lines[1], "cheap,0.5,0.5");
        assert_eq!(lines[2], "pills,0,1");
        assert_eq!(lines[3], "room,1,0");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_write_csv_quotes_fields() {
        let mut builder = DictionaryBuilder::new();
        builder.add_document(&["say \"hi\""], "news, local").unwrap();
        builder.add_document(&["plain"], "ham").unwrap();
        let dictionary = builder.create();

        let mut out = Vec::new();
        dictionary.write_csv(&mut out).unwrap();
        let csv = String::from_utf8(out).unwrap();

        assert_eq!(
            csv,
            "term,ham,\"news, local\"\nplain,1,0\n\"say \"\"hi\"\"\",0,1\n"
        );
    }

    #[test]
    fn test_entry_display() {
        let entry = DictionaryEntry::new(
            "cheap",
            vec![("spam", 1.0), ("ham", 1.0)].into_iter().collect(),
        );
        assert_eq!(entry.to_string(), "cheap [ham=1.0000, spam=1.0000]");
    }
}
