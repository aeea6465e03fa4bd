//! Declarative classifier configuration.
//!
//! A [`ClassifierConfig`] describes a [`TextClassifier`] in JSON:
//!
//! ```json
//! {
//!   "feature_setting": { "feature_type": "word", "min_ngram_length": 1, "max_ngram_length": 2, "max_terms": 500 },
//!   "scorer": { "type": "bayes", "laplace": 1.0, "priors": true },
//!   "pruning": { "type": "min_term_count", "min": 2 }
//! }
//! ```
//!
//! Every field is optional. Values are validated by [`ClassifierConfig::build`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::feature_setting::FeatureSetting;
use crate::classification::classifier::TextClassifier;
use crate::dictionary::pruning::PruningStrategy;
use crate::error::{LexiclassError, Result};
use crate::scoring::{BayesOptions, BayesScorer, DEFAULT_FLOOR, DefaultScorer, Scorer};

fn default_floor() -> f64 {
    DEFAULT_FLOOR
}

/// Scorer selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScorerConfig {
    Default {
        #[serde(default = "default_floor")]
        floor: f64,
    },
    Bayes(BayesOptions),
}

impl Default for ScorerConfig {
    fn default() -> Self {
        ScorerConfig::Default {
            floor: DEFAULT_FLOOR,
        }
    }
}

impl ScorerConfig {
    pub fn build(&self) -> Result<Scorer> {
        Ok(match self {
            ScorerConfig::Default { floor } => DefaultScorer::with_floor(*floor)?.into(),
            ScorerConfig::Bayes(options) => BayesScorer::new(*options)?.into(),
        })
    }
}

/// Pruning selection. Custom predicates can only be set in code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PruningConfig {
    MinTermCount { min: u64 },
    MaxEntropy { max: f64 },
    RejectAll,
}

impl PruningConfig {
    pub fn build(&self) -> Result<PruningStrategy> {
        match *self {
            PruningConfig::MinTermCount { min } => Ok(PruningStrategy::MinTermCount(min)),
            PruningConfig::MaxEntropy { max } => {
                if !(0.0..=1.0).contains(&max) {
                    return Err(LexiclassError::invalid_config(format!(
                        "max entropy must be in [0, 1], got {max}"
                    )));
                }
                Ok(PruningStrategy::MaxEntropy(max))
            }
            PruningConfig::RejectAll => Ok(PruningStrategy::RejectAll),
        }
    }
}

/// Configuration of a [`TextClassifier`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub feature_setting: FeatureSetting,
    pub scorer: ScorerConfig,
    pub pruning: Option<PruningConfig>,
}

impl ClassifierConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration and create the classifier.
    pub fn build(&self) -> Result<TextClassifier> {
        let mut classifier =
            TextClassifier::new(self.feature_setting.clone()).with_scorer(self.scorer.build()?);
        if let Some(pruning) = &self.pruning {
            classifier = classifier.with_pruning(pruning.build()?);
        }
        Ok(classifier)
    }
}
