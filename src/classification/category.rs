//! Per-category scores.
//!
//! [`CategoryEntries`] is the common currency of the crate: dictionaries use it
//! for per-term counts and for the document/term totals, classifiers return it
//! as the probability distribution over categories.

use std::fmt;

use ahash::AHashMap;
use serde::Serialize;

/// A category name with a score, which is either a count or a probability.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryEntry {
    name: String,
    score: f64,
}

impl CategoryEntry {
    pub fn new<S: Into<String>>(name: S, score: f64) -> Self {
        CategoryEntry {
            name: name.into(),
            score,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn score(&self) -> f64 {
        self.score
    }
}

/// An immutable set of uniquely named categories ordered by descending score.
///
/// Equal scores are ordered by ascending name.
///
/// # Examples
///
/// ```
/// use lexiclass::classification::category::CategoryEntriesBuilder;
///
/// let entries = CategoryEntriesBuilder::new()
///     .add("ham", 2.0)
///     .add("spam", 1.0)
///     .add("ham", 1.0)
///     .build();
///
/// assert_eq!(entries.most_likely().unwrap().name(), "ham");
/// assert_eq!(entries.count("ham"), 3);
/// assert_eq!(entries.probability("spam"), 0.25);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CategoryEntries {
    entries: Vec<CategoryEntry>,
    total: f64,
}

impl CategoryEntries {
    /// The entries with no categories at all.
    pub fn empty() -> Self {
        CategoryEntries::default()
    }

    /// Build from entries whose names are already unique.
    pub(crate) fn from_unique(mut entries: Vec<CategoryEntry>) -> Self {
        entries.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
        let total = entries.iter().map(|e| e.score).sum();
        CategoryEntries { entries, total }
    }

    /// The entry with the highest score, if any.
    pub fn most_likely(&self) -> Option<&CategoryEntry> {
        self.entries.first()
    }

    pub fn get(&self, name: &str) -> Option<&CategoryEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Score of `name`, 0 when absent.
    pub fn score(&self, name: &str) -> f64 {
        self.get(name).map_or(0.0, |e| e.score)
    }

    /// Score of `name` as an integer count, 0 when absent.
    pub fn count(&self, name: &str) -> u64 {
        self.score(name).round() as u64
    }

    /// Score of `name` relative to the total, 0 when the total is 0.
    pub fn probability(&self, name: &str) -> f64 {
        if self.total == 0.0 {
            0.0
        } else {
            self.score(name) / self.total
        }
    }

    /// Sum of all scores.
    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CategoryEntry> {
        self.entries.iter()
    }

    /// Category names in score order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// The probability view: every score divided by the total.
    ///
    /// Entries whose total is 0 are returned unchanged.
    pub fn normalized(&self) -> CategoryEntries {
        if self.total == 0.0 {
            return self.clone();
        }
        let entries = self
            .entries
            .iter()
            .map(|e| CategoryEntry::new(e.name.clone(), e.score / self.total))
            .collect();
        CategoryEntries::from_unique(entries)
    }
}

impl<'a> IntoIterator for &'a CategoryEntries {
    type Item = &'a CategoryEntry;
    type IntoIter = std::slice::Iter<'a, CategoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for CategoryEntries {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut builder = CategoryEntriesBuilder::new();
        for (name, score) in iter {
            builder.add_mut(name, score);
        }
        builder.build()
    }
}

impl fmt::Display for CategoryEntries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={:.4}", entry.name, entry.score)?;
        }
        write!(f, "]")
    }
}

/// Accumulates scores per category name.
#[derive(Clone, Debug, Default)]
pub struct CategoryEntriesBuilder {
    index: AHashMap<String, usize>,
    entries: Vec<CategoryEntry>,
}

impl CategoryEntriesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `score` to the current score of `name`.
    pub fn add<S: Into<String>>(mut self, name: S, score: f64) -> Self {
        self.add_mut(name, score);
        self
    }

    /// In-place variant of [`add`](Self::add).
    pub fn add_mut<S: Into<String>>(&mut self, name: S, score: f64) -> &mut Self {
        let name = name.into();
        match self.index.get(&name) {
            Some(&i) => self.entries[i].score += score,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push(CategoryEntry::new(name, score));
            }
        }
        self
    }

    /// Replace the score of `name`.
    pub fn set<S: Into<String>>(mut self, name: S, score: f64) -> Self {
        let name = name.into();
        match self.index.get(&name) {
            Some(&i) => self.entries[i].score = score,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push(CategoryEntry::new(name, score));
            }
        }
        self
    }

    /// Add every entry of `other`.
    pub fn add_entries(mut self, other: &CategoryEntries) -> Self {
        for entry in other {
            self.add_mut(entry.name(), entry.score());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn build(self) -> CategoryEntries {
        CategoryEntries::from_unique(self.entries)
    }
}
