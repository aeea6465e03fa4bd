//! Scoring: turning dictionary lookups into a category distribution.
//!
//! Both scorers accumulate per-category scores in log space. The shared
//! driver in [`Scorer::score`] looks up the document's terms, hands the known
//! ones to the scorer and converts the log scores into probabilities by
//! max-shifted exponentiation and normalization.
//!
//! A document without a single known term is scored with the category
//! priors (the normalized document counts). A dictionary without categories
//! yields an empty result.

use crate::analysis::extractor::term_frequencies;
use crate::classification::category::{CategoryEntries, CategoryEntry};
use crate::dictionary::DictionaryModel;
use crate::error::Result;

pub mod bayes;
pub mod default;

pub use bayes::{BayesOptions, BayesScorer};
pub use default::DefaultScorer;

/// Default probability used in place of zero relative frequencies.
pub const DEFAULT_FLOOR: f64 = 1e-6;

/// A known document term: its dictionary counts and how often it occurs
/// in the document.
#[derive(Clone, Debug)]
pub struct TermEvidence {
    pub term: String,
    pub category_entries: CategoryEntries,
    pub frequency: u32,
}

/// The available scoring algorithms.
#[derive(Clone, Debug, PartialEq)]
pub enum Scorer {
    Default(DefaultScorer),
    Bayes(BayesScorer),
}

impl Default for Scorer {
    fn default() -> Self {
        Scorer::Default(DefaultScorer::default())
    }
}

impl From<DefaultScorer> for Scorer {
    fn from(scorer: DefaultScorer) -> Self {
        Scorer::Default(scorer)
    }
}

impl From<BayesScorer> for Scorer {
    fn from(scorer: BayesScorer) -> Self {
        Scorer::Bayes(scorer)
    }
}

impl Scorer {
    /// Score a document, given as its extracted terms, against `model`.
    pub fn score<M: DictionaryModel + ?Sized>(
        &self,
        terms: &[String],
        model: &M,
    ) -> Result<CategoryEntries> {
        let categories = model.categories();
        if categories.is_empty() {
            return Ok(CategoryEntries::empty());
        }

        let mut evidence = Vec::new();
        for (term, frequency) in term_frequencies(terms) {
            let category_entries = model.category_entries(&term)?;
            if !category_entries.is_empty() {
                evidence.push(TermEvidence {
                    term,
                    category_entries,
                    frequency,
                });
            }
        }
        if evidence.is_empty() {
            return Ok(model.document_counts().normalized());
        }

        let (log_scores, non_degenerate) = match self {
            Scorer::Default(scorer) => (scorer.log_scores(&categories, &evidence, model), false),
            Scorer::Bayes(scorer) => (
                scorer.log_scores(&categories, &evidence, model),
                scorer.options().laplace.is_some(),
            ),
        };
        Ok(normalize_log_scores(&categories, &log_scores, non_degenerate))
    }
}

/// Exponentiate relative to the largest score and normalize to sum 1.
///
/// `None` marks a category without evidence; it gets probability 0. With
/// `non_degenerate`, every scored category keeps a probability strictly
/// between 0 and 1 even when its weight underflows after the shift.
pub fn normalize_log_scores(
    categories: &[String],
    log_scores: &[Option<f64>],
    non_degenerate: bool,
) -> CategoryEntries {
    let max = log_scores
        .iter()
        .flatten()
        .copied()
        .filter(|s| s.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);

    let weights: Vec<f64> = log_scores
        .iter()
        .map(|score| match score {
            Some(s) if max.is_finite() => {
                let weight = (s - max).exp();
                if non_degenerate {
                    weight.max(f64::MIN_POSITIVE)
                } else {
                    weight
                }
            }
            Some(_) if non_degenerate => f64::MIN_POSITIVE,
            _ => 0.0,
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    let bounded = non_degenerate && log_scores.iter().flatten().count() > 1;

    let entries = categories
        .iter()
        .zip(weights)
        .map(|(name, weight)| {
            let mut probability = if sum > 0.0 { weight / sum } else { 0.0 };
            if bounded && weight > 0.0 {
                probability = probability.clamp(f64::MIN_POSITIVE, 1.0 - f64::EPSILON);
            }
            CategoryEntry::new(name.as_str(), probability)
        })
        .collect();
    CategoryEntries::from_unique(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{DictionaryBuilder, InMemoryDictionary};

    fn terms(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn dictionary() -> InMemoryDictionary {
        let mut builder = DictionaryBuilder::new();
        builder.add_document(&["cheap", "pills"], "spam").unwrap();
        builder.add_document(&["cheap", "room"], "ham").unwrap();
        builder.add_document(&["meeting", "room"], "ham").unwrap();
        builder.create()
    }

    #[test]
    fn test_normalize_log_scores() {
        let categories = terms(&["a", "b", "c"]);
        let result = normalize_log_scores(
            &categories,
            &[Some(-1000.0), Some(-1000.0 - 2f64.ln()), None],
            false,
        );

        assert!((result.score("a") - 2.0 / 3.0).abs() < 1e-12);
        assert!((result.score("b") - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(result.score("c"), 0.0);
        assert!((result.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_log_scores_underflow() {
        let categories = terms(&["a", "b", "c"]);
        let scores = [Some(0.0), Some(-2000.0), None];

        let plain = normalize_log_scores(&categories, &scores, false);
        assert_eq!(plain.score("a"), 1.0);
        assert_eq!(plain.score("b"), 0.0);

        let bounded = normalize_log_scores(&categories, &scores, true);
        assert!(bounded.score("a") < 1.0);
        assert!(bounded.score("b") > 0.0);
        assert_eq!(bounded.score("c"), 0.0);
        assert!((bounded.total() - 1.0).abs() < 1e-6);
        assert_eq!(bounded.most_likely().unwrap().name(), "a");
    }

    #[test]
    fn test_no_categories() {
        let result = Scorer::default()
            .score(&terms(&["cheap"]), &InMemoryDictionary::empty())
            .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_unknown_terms_yield_priors() {
        let dictionary = dictionary();
        for scorer in [Scorer::default(), BayesScorer::default().into()] {
            let result = scorer.score(&terms(&["zebra", "quasar"]), &dictionary).unwrap();
            assert!((result.score("ham") - 2.0 / 3.0).abs() < 1e-12);
            assert!((result.score("spam") - 1.0 / 3.0).abs() < 1e-12);

            let empty = scorer.score(&[], &dictionary).unwrap();
            assert_eq!(empty, result);
        }
    }

    #[test]
    fn test_distribution_sums_to_one() {
        let dictionary = dictionary();
        let scorers: Vec<Scorer> = vec![
            Scorer::default(),
            BayesScorer::new(BayesOptions::new().laplace(1.0).priors(true))
                .unwrap()
                .into(),
            BayesScorer::new(BayesOptions::new().complement(true).frequencies(true))
                .unwrap()
                .into(),
        ];
        for scorer in scorers {
            let result = scorer
                .score(&terms(&["cheap", "room", "room"]), &dictionary)
                .unwrap();
            assert!((result.total() - 1.0).abs() < 1e-6, "{scorer:?}: {result}");
            assert_eq!(result.len(), 2);
        }
    }
}
