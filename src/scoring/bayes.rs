//! Naive Bayes scoring over dictionary counts.
//!
//! The options are independent and can be combined:
//!
//! - `laplace`: additive smoothing `(count + α) / (N_c + α·|V|)`, where `|V|`
//!   is the number of unique terms in the dictionary,
//! - `priors`: start each category at `ln(documents_c / documents)`,
//! - `complement`: estimate term probabilities from all *other* categories
//!   and subtract their log-likelihood,
//! - `frequencies`: weight each term by its number of occurrences in the
//!   document instead of counting it once.
//!
//! Without Laplace smoothing a zero relative frequency is replaced by the
//! floor probability.

use serde::{Deserialize, Serialize};

use crate::dictionary::DictionaryModel;
use crate::error::{LexiclassError, Result};
use crate::scoring::{DEFAULT_FLOOR, TermEvidence};

fn default_floor() -> f64 {
    DEFAULT_FLOOR
}

/// Options of a [`BayesScorer`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BayesOptions {
    /// Laplace smoothing constant α; `None` disables smoothing.
    pub laplace: Option<f64>,
    pub priors: bool,
    pub complement: bool,
    pub frequencies: bool,
    #[serde(default = "default_floor")]
    pub floor: f64,
}

impl Default for BayesOptions {
    fn default() -> Self {
        BayesOptions {
            laplace: None,
            priors: false,
            complement: false,
            frequencies: false,
            floor: DEFAULT_FLOOR,
        }
    }
}

impl BayesOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn laplace(mut self, alpha: f64) -> Self {
        self.laplace = Some(alpha);
        self
    }

    pub fn priors(mut self, priors: bool) -> Self {
        self.priors = priors;
        self
    }

    pub fn complement(mut self, complement: bool) -> Self {
        self.complement = complement;
        self
    }

    pub fn frequencies(mut self, frequencies: bool) -> Self {
        self.frequencies = frequencies;
        self
    }

    pub fn floor(mut self, floor: f64) -> Self {
        self.floor = floor;
        self
    }

    /// Check the numeric options.
    pub fn validate(&self) -> Result<()> {
        if let Some(alpha) = self.laplace
            && !(alpha.is_finite() && alpha > 0.0)
        {
            return Err(LexiclassError::invalid_config(format!(
                "Laplace constant must be positive and finite, got {alpha}"
            )));
        }
        if !(self.floor > 0.0 && self.floor < 1.0) {
            return Err(LexiclassError::invalid_config(format!(
                "floor must be in (0, 1), got {}",
                self.floor
            )));
        }
        Ok(())
    }
}

/// Multinomial Naive Bayes scorer.
///
/// # Examples
///
/// ```
/// use lexiclass::scoring::{BayesOptions, BayesScorer};
///
/// let scorer = BayesScorer::new(BayesOptions::new().laplace(1.0).priors(true)).unwrap();
/// assert_eq!(scorer.options().laplace, Some(1.0));
///
/// assert!(BayesScorer::new(BayesOptions::new().laplace(0.0)).is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BayesScorer {
    options: BayesOptions,
}

impl BayesScorer {
    pub fn new(options: BayesOptions) -> Result<Self> {
        options.validate()?;
        Ok(BayesScorer { options })
    }

    pub fn options(&self) -> &BayesOptions {
        &self.options
    }

    fn probability(&self, count: f64, total: f64, vocabulary: f64) -> f64 {
        match self.options.laplace {
            Some(alpha) => (count + alpha) / (total + alpha * vocabulary),
            None if count > 0.0 && total > 0.0 => count / total,
            None => self.options.floor,
        }
    }

    pub(crate) fn log_scores<M: DictionaryModel + ?Sized>(
        &self,
        categories: &[String],
        evidence: &[TermEvidence],
        model: &M,
    ) -> Vec<Option<f64>> {
        let vocabulary = model.num_unique_terms() as f64;
        let total_documents = model.document_counts().total();
        let total_terms = model.term_counts().total();

        categories
            .iter()
            .map(|category| {
                let prior = if self.options.priors {
                    let documents = model.document_counts().score(category);
                    if documents > 0.0 && total_documents > 0.0 {
                        (documents / total_documents).ln()
                    } else {
                        self.options.floor.ln()
                    }
                } else {
                    0.0
                };

                let category_terms = model.term_counts().score(category);
                let mut log_likelihood = 0.0;
                for term in evidence {
                    let in_category = term.category_entries.score(category);
                    let (count, total) = if self.options.complement {
                        (
                            term.category_entries.total() - in_category,
                            total_terms - category_terms,
                        )
                    } else {
                        (in_category, category_terms)
                    };
                    let weight = if self.options.frequencies {
                        term.frequency as f64
                    } else {
                        1.0
                    };
                    log_likelihood += weight * self.probability(count, total, vocabulary).ln();
                }

                Some(if self.options.complement {
                    prior - log_likelihood
                } else {
                    prior + log_likelihood
                })
            })
            .collect()
    }
}
