//! Relative-frequency scoring.

use crate::dictionary::DictionaryModel;
use crate::error::{LexiclassError, Result};
use crate::scoring::{DEFAULT_FLOOR, TermEvidence};

/// Scores category `c` as `Σ ln(count(t, c) / term_counts[c])` over the
/// distinct known terms of a document.
///
/// A known term that never occurred in `c` contributes `ln(floor)`. A
/// category in which none of the document's terms occurred gets
/// probability 0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DefaultScorer {
    floor: f64,
}

impl Default for DefaultScorer {
    fn default() -> Self {
        DefaultScorer {
            floor: DEFAULT_FLOOR,
        }
    }
}

impl DefaultScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scorer with a custom floor probability, which must lie in `(0, 1)`.
    pub fn with_floor(floor: f64) -> Result<Self> {
        if !(floor > 0.0 && floor < 1.0) {
            return Err(LexiclassError::invalid_config(format!(
                "floor must be in (0, 1), got {floor}"
            )));
        }
        Ok(DefaultScorer { floor })
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    pub(crate) fn log_scores<M: DictionaryModel + ?Sized>(
        &self,
        categories: &[String],
        evidence: &[TermEvidence],
        model: &M,
    ) -> Vec<Option<f64>> {
        let log_floor = self.floor.ln();
        categories
            .iter()
            .map(|category| {
                let total = model.term_counts().score(category);
                let mut score = 0.0;
                let mut has_evidence = false;
                for term in evidence {
                    let count = term.category_entries.score(category);
                    if count > 0.0 && total > 0.0 {
                        score += (count / total).ln();
                        has_evidence = true;
                    } else {
                        score += log_floor;
                    }
                }
                has_evidence.then_some(score)
            })
            .collect()
    }
}
