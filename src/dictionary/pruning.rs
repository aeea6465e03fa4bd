//! Pruning strategies applied when a dictionary is frozen.

use std::fmt;
use std::sync::Arc;

use crate::classification::category::CategoryEntries;

/// Predicate signature for [`PruningStrategy::Custom`]; `true` rejects the entry.
pub type PruningPredicate = dyn Fn(&CategoryEntries) -> bool + Send + Sync;

/// Decides which dictionary entries are dropped by
/// [`DictionaryBuilder::create`](super::DictionaryBuilder::create).
///
/// Pruning only removes terms; document and term totals are untouched.
#[derive(Clone)]
pub enum PruningStrategy {
    /// Drop terms whose total count over all categories is below the threshold.
    MinTermCount(u64),
    /// Drop terms whose category distribution has a normalized entropy above
    /// the threshold (in `[0, 1]`), i.e. terms spread evenly across categories.
    MaxEntropy(f64),
    /// Drop every term.
    RejectAll,
    /// Drop the terms for which the predicate returns `true`.
    Custom(Arc<PruningPredicate>),
}

impl PruningStrategy {
    /// Wrap a closure as a custom strategy.
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&CategoryEntries) -> bool + Send + Sync + 'static,
    {
        PruningStrategy::Custom(Arc::new(predicate))
    }

    /// Whether the entry should be removed from a dictionary with
    /// `num_categories` categories.
    pub fn reject(&self, entries: &CategoryEntries, num_categories: usize) -> bool {
        match self {
            PruningStrategy::MinTermCount(min) => (entries.total().round() as u64) < *min,
            PruningStrategy::MaxEntropy(max) => normalized_entropy(entries, num_categories) > *max,
            PruningStrategy::RejectAll => true,
            PruningStrategy::Custom(predicate) => predicate(entries),
        }
    }
}

impl fmt::Debug for PruningStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PruningStrategy::MinTermCount(min) => f.debug_tuple("MinTermCount").field(min).finish(),
            PruningStrategy::MaxEntropy(max) => f.debug_tuple("MaxEntropy").field(max).finish(),
            PruningStrategy::RejectAll => f.write_str("RejectAll"),
            PruningStrategy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Shannon entropy of the category distribution divided by its maximum,
/// `ln(num_categories)`. Zero for dictionaries with fewer than two categories.
pub fn normalized_entropy(entries: &CategoryEntries, num_categories: usize) -> f64 {
    let total = entries.total();
    if num_categories < 2 || total <= 0.0 {
        return 0.0;
    }
    let entropy: f64 = entries
        .iter()
        .map(|e| e.score() / total)
        .filter(|p| *p > 0.0)
        .map(|p| -p * p.ln())
        .sum();
    entropy / (num_categories as f64).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(&str, f64)]) -> CategoryEntries {
        pairs.iter().map(|(n, s)| (*n, *s)).collect()
    }

    #[test]
    fn test_min_term_count() {
        let strategy = PruningStrategy::MinTermCount(2);
        assert!(strategy.reject(&entries(&[("spam", 1.0)]), 2));
        assert!(!strategy.reject(&entries(&[("spam", 1.0), ("ham", 1.0)]), 2));
    }

    #[test]
    fn test_max_entropy() {
        let strategy = PruningStrategy::MaxEntropy(0.9);
        // Evenly spread over both categories: entropy 1.
        assert!(strategy.reject(&entries(&[("spam", 3.0), ("ham", 3.0)]), 2));
        // Concentrated in one category: entropy 0.
        assert!(!strategy.reject(&entries(&[("ham", 4.0)]), 2));
    }

    #[test]
    fn test_normalized_entropy_bounds() {
        let even = entries(&[("a", 1.0), ("b", 1.0), ("c", 1.0)]);
        assert!((normalized_entropy(&even, 3) - 1.0).abs() < 1e-12);
        assert_eq!(normalized_entropy(&even, 1), 0.0);
        assert_eq!(normalized_entropy(&CategoryEntries::empty(), 3), 0.0);
    }

    #[test]
    fn test_reject_all_and_custom() {
        let e = entries(&[("ham", 2.0)]);
        assert!(PruningStrategy::RejectAll.reject(&e, 2));

        let only_spam = PruningStrategy::custom(|entries| !entries.contains("spam"));
        assert!(only_spam.reject(&e, 2));
        assert!(!only_spam.reject(&entries(&[("spam", 1.0)]), 2));
        assert_eq!(format!("{only_spam:?}"), "Custom(..)");
    }
}
