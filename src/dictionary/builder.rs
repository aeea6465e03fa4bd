//! Mutable dictionary accumulation.

use ahash::{AHashMap, AHashSet};
use log::{debug, info};

use crate::analysis::feature_setting::FeatureSetting;
use crate::classification::category::{CategoryEntries, CategoryEntry};
use crate::dictionary::memory::InMemoryDictionary;
use crate::dictionary::pruning::PruningStrategy;
use crate::dictionary::DictionaryModel;
use crate::error::{LexiclassError, Result};

/// Collects term counts from training documents.
///
/// A builder has a single writer; independent builders (one per training
/// shard, say) can be combined with [`add_dictionary`](Self::add_dictionary).
/// [`create`](Self::create) freezes it into an [`InMemoryDictionary`].
///
/// # Examples
///
/// ```
/// use lexiclass::dictionary::{DictionaryBuilder, DictionaryModel};
///
/// let mut builder = DictionaryBuilder::new();
/// builder.add_document(&["buy", "cheap", "pills"], "spam").unwrap();
/// builder.add_document(&["cheap", "meeting", "room"], "ham").unwrap();
///
/// let dictionary = builder.create();
/// assert_eq!(dictionary.num_unique_terms(), 5);
/// assert_eq!(dictionary.category_entries("cheap").unwrap().count("ham"), 1);
/// ```
#[derive(Debug, Default)]
pub struct DictionaryBuilder {
    name: Option<String>,
    feature_setting: Option<FeatureSetting>,
    categories: Vec<String>,
    category_index: AHashMap<String, u32>,
    /// Per term: (category index, count) pairs.
    terms: AHashMap<String, Vec<(u32, u64)>>,
    document_counts: Vec<u64>,
    term_counts: Vec<u64>,
    pruning: Option<PruningStrategy>,
}

impl DictionaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder that records `feature_setting` in the dictionary it creates.
    pub fn with_feature_setting(feature_setting: FeatureSetting) -> Self {
        DictionaryBuilder {
            feature_setting: Some(feature_setting),
            ..Self::default()
        }
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn set_feature_setting(&mut self, feature_setting: FeatureSetting) -> &mut Self {
        self.feature_setting = Some(feature_setting);
        self
    }

    /// Strategy applied by [`create`](Self::create).
    pub fn set_pruning_strategy(&mut self, strategy: PruningStrategy) -> &mut Self {
        self.pruning = Some(strategy);
        self
    }

    pub fn feature_setting(&self) -> Option<&FeatureSetting> {
        self.feature_setting.as_ref()
    }

    /// Number of documents added so far.
    pub fn num_documents(&self) -> u64 {
        self.document_counts.iter().sum()
    }

    pub fn num_unique_terms(&self) -> usize {
        self.terms.len()
    }

    /// Add a document with weight 1.
    pub fn add_document<S: AsRef<str>>(&mut self, terms: &[S], category: &str) -> Result<&mut Self> {
        self.add_weighted_document(terms, category, 1)
    }

    /// Add a document: every distinct term gains `weight` for `category`.
    ///
    /// Repeated terms within one document count once.
    pub fn add_weighted_document<S: AsRef<str>>(
        &mut self,
        terms: &[S],
        category: &str,
        weight: u64,
    ) -> Result<&mut Self> {
        if weight == 0 {
            return Err(LexiclassError::invalid_config(
                "document weight must be at least 1",
            ));
        }

        let category_id = self.category_id(category);
        let mut seen: AHashSet<&str> = AHashSet::with_capacity(terms.len());
        for term in terms {
            let term = term.as_ref();
            if seen.insert(term) {
                self.add_count(term, category_id, weight);
            }
        }

        self.document_counts[category_id as usize] += 1;
        self.term_counts[category_id as usize] += weight * seen.len() as u64;
        Ok(self)
    }

    /// Add all counts of `other` to this builder.
    ///
    /// Feature settings must match when both sides record one; a builder
    /// without a setting adopts the other's.
    pub fn add_dictionary<M: DictionaryModel + ?Sized>(&mut self, other: &M) -> Result<&mut Self> {
        match (&self.feature_setting, other.feature_setting()) {
            (Some(mine), Some(theirs)) if mine != theirs => {
                return Err(LexiclassError::invalid_config(format!(
                    "cannot merge dictionaries with different feature settings: {mine} vs {theirs}"
                )));
            }
            (None, Some(theirs)) => self.feature_setting = Some(theirs.clone()),
            _ => {}
        }

        // Read all entries first so a failing read leaves the builder untouched.
        let entries = other.entries().collect::<Result<Vec<_>>>()?;

        for entry in other.document_counts() {
            let id = self.category_id(entry.name());
            self.document_counts[id as usize] += entry.score().round() as u64;
        }
        for entry in other.term_counts() {
            let id = self.category_id(entry.name());
            self.term_counts[id as usize] += entry.score().round() as u64;
        }
        for entry in &entries {
            for category in &entry.category_entries {
                let id = self.category_id(category.name());
                self.add_count(&entry.term, id, category.score().round() as u64);
            }
        }

        debug!(
            "merged {} terms from {}, builder now has {} terms",
            entries.len(),
            other.name().unwrap_or("unnamed dictionary"),
            self.terms.len()
        );
        Ok(self)
    }

    fn category_id(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.category_index.get(name) {
            return id;
        }
        let id = self.categories.len() as u32;
        self.categories.push(name.to_string());
        self.category_index.insert(name.to_string(), id);
        self.document_counts.push(0);
        self.term_counts.push(0);
        id
    }

    fn add_count(&mut self, term: &str, category_id: u32, count: u64) {
        if let Some(counts) = self.terms.get_mut(term) {
            match counts.iter_mut().find(|(id, _)| *id == category_id) {
                Some((_, existing)) => *existing += count,
                None => counts.push((category_id, count)),
            }
            return;
        }
        self.terms.insert(term.to_string(), vec![(category_id, count)]);
    }

    /// Freeze into an [`InMemoryDictionary`], applying the pruning strategy.
    pub fn create(self) -> InMemoryDictionary {
        // Renumber categories in name order so the frozen form is canonical.
        let mut order: Vec<u32> = (0..self.categories.len() as u32).collect();
        order.sort_by(|a, b| self.categories[*a as usize].cmp(&self.categories[*b as usize]));
        let mut remap = vec![0u32; order.len()];
        for (new_id, old_id) in order.iter().enumerate() {
            remap[*old_id as usize] = new_id as u32;
        }

        let categories: Vec<Box<str>> = order
            .iter()
            .map(|&old| self.categories[old as usize].as_str().into())
            .collect();
        let document_counts: Vec<u64> = order
            .iter()
            .map(|&old| self.document_counts[old as usize])
            .collect();
        let term_counts: Vec<u64> = order
            .iter()
            .map(|&old| self.term_counts[old as usize])
            .collect();

        let num_categories = categories.len();
        let total_terms = self.terms.len();
        let mut terms = AHashMap::with_capacity(total_terms);
        for (term, counts) in self.terms {
            let mut counts: Vec<(u32, u64)> = counts
                .into_iter()
                .map(|(id, count)| (remap[id as usize], count))
                .collect();
            counts.sort_unstable_by_key(|(id, _)| *id);

            if let Some(strategy) = &self.pruning {
                let entries = CategoryEntries::from_unique(
                    counts
                        .iter()
                        .map(|(id, count)| CategoryEntry::new(&*categories[*id as usize], *count as f64))
                        .collect(),
                );
                if strategy.reject(&entries, num_categories) {
                    continue;
                }
            }
            terms.insert(term.into_boxed_str(), counts.into_boxed_slice());
        }

        if let Some(strategy) = &self.pruning {
            debug!(
                "pruning with {strategy:?} removed {} of {total_terms} terms",
                total_terms - terms.len()
            );
        }

        let dictionary = InMemoryDictionary::from_parts(
            self.name,
            self.feature_setting,
            categories,
            terms,
            document_counts,
            term_counts,
        );
        info!(
            "created dictionary with {} terms, {} entries, {} categories",
            dictionary.num_unique_terms(),
            dictionary.num_entries(),
            dictionary.num_categories()
        );
        dictionary
    }
}
