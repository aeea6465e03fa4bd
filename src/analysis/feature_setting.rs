//! Feature extraction settings.
//!
//! A [`FeatureSetting`] describes how text is turned into terms: word or
//! character n-grams, the n-gram length range, an optional per-document cap on
//! distinct terms, and word-level normalization. It is validated once by
//! [`FeatureSettingBuilder::build`] and then stored verbatim in every
//! dictionary trained with it.
//!
//! # Examples
//!
//! ```
//! use lexiclass::analysis::feature_setting::{FeatureSetting, FeatureType, TermSelector};
//!
//! let setting = FeatureSetting::words(1, 2)
//!     .max_terms(10)
//!     .term_selector(TermSelector::Frequency)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(setting.feature_type(), FeatureType::Word);
//! assert_eq!(setting.max_terms(), Some(10));
//!
//! assert!(FeatureSetting::chars(4, 3).build().is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LexiclassError, Result};

/// Default lower bound on word length, in characters.
pub const DEFAULT_MIN_TERM_LENGTH: usize = 1;

/// Default upper bound on word length, in characters.
pub const DEFAULT_MAX_TERM_LENGTH: usize = 30;

/// The unit n-grams are built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    /// Sliding windows over characters.
    Char,
    /// Sliding windows over words.
    Word,
}

/// How the kept terms are chosen when a document exceeds `max_terms`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermSelector {
    /// Keep the first distinct terms in occurrence order.
    #[default]
    FirstSeen,
    /// Keep the most frequent terms; ties go to the earlier occurrence.
    Frequency,
}

/// Immutable, validated feature extraction settings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "FeatureSettingBuilder")]
pub struct FeatureSetting {
    feature_type: FeatureType,
    min_ngram_length: usize,
    max_ngram_length: usize,
    max_terms: Option<usize>,
    term_selector: TermSelector,
    min_term_length: usize,
    max_term_length: usize,
    case_sensitive: bool,
}

impl FeatureSetting {
    /// Start building a setting for word n-grams of length `min..=max`.
    pub fn words(min_ngram_length: usize, max_ngram_length: usize) -> FeatureSettingBuilder {
        FeatureSettingBuilder::new(FeatureType::Word, min_ngram_length, max_ngram_length)
    }

    /// Start building a setting for character n-grams of length `min..=max`.
    pub fn chars(min_ngram_length: usize, max_ngram_length: usize) -> FeatureSettingBuilder {
        FeatureSettingBuilder::new(FeatureType::Char, min_ngram_length, max_ngram_length)
    }

    pub fn feature_type(&self) -> FeatureType {
        self.feature_type
    }

    pub fn min_ngram_length(&self) -> usize {
        self.min_ngram_length
    }

    pub fn max_ngram_length(&self) -> usize {
        self.max_ngram_length
    }

    /// Maximum number of distinct terms kept per document, `None` if unbounded.
    pub fn max_terms(&self) -> Option<usize> {
        self.max_terms
    }

    pub fn term_selector(&self) -> TermSelector {
        self.term_selector
    }

    /// Minimum word length in characters (word mode only).
    pub fn min_term_length(&self) -> usize {
        self.min_term_length
    }

    /// Maximum word length in characters (word mode only).
    pub fn max_term_length(&self) -> usize {
        self.max_term_length
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Return a builder initialised from this setting.
    pub fn to_builder(&self) -> FeatureSettingBuilder {
        FeatureSettingBuilder {
            feature_type: self.feature_type,
            min_ngram_length: self.min_ngram_length,
            max_ngram_length: self.max_ngram_length,
            max_terms: self.max_terms,
            term_selector: self.term_selector,
            min_term_length: self.min_term_length,
            max_term_length: self.max_term_length,
            case_sensitive: self.case_sensitive,
        }
    }
}

impl Default for FeatureSetting {
    fn default() -> Self {
        FeatureSetting {
            feature_type: FeatureType::Word,
            min_ngram_length: 1,
            max_ngram_length: 1,
            max_terms: None,
            term_selector: TermSelector::FirstSeen,
            min_term_length: DEFAULT_MIN_TERM_LENGTH,
            max_term_length: DEFAULT_MAX_TERM_LENGTH,
            case_sensitive: false,
        }
    }
}

impl fmt::Display for FeatureSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.feature_type {
            FeatureType::Char => "chars",
            FeatureType::Word => "words",
        };
        write!(
            f,
            "{kind}({}..={})",
            self.min_ngram_length, self.max_ngram_length
        )?;
        if let Some(max_terms) = self.max_terms {
            write!(f, " max_terms={max_terms} ({:?})", self.term_selector)?;
        }
        if self.feature_type == FeatureType::Word {
            write!(
                f,
                " term_length={}..={}",
                self.min_term_length, self.max_term_length
            )?;
        }
        if self.case_sensitive {
            write!(f, " case_sensitive")?;
        }
        Ok(())
    }
}

/// Builder for [`FeatureSetting`].
///
/// Also the deserialization form: absent fields take their defaults and the
/// result is validated exactly like a programmatic build.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeatureSettingBuilder {
    feature_type: FeatureType,
    min_ngram_length: usize,
    max_ngram_length: usize,
    max_terms: Option<usize>,
    term_selector: TermSelector,
    min_term_length: usize,
    max_term_length: usize,
    case_sensitive: bool,
}

impl Default for FeatureSettingBuilder {
    fn default() -> Self {
        FeatureSetting::default().to_builder()
    }
}

impl FeatureSettingBuilder {
    fn new(feature_type: FeatureType, min_ngram_length: usize, max_ngram_length: usize) -> Self {
        FeatureSettingBuilder {
            feature_type,
            min_ngram_length,
            max_ngram_length,
            ..Self::default()
        }
    }

    /// Cap the number of distinct terms kept per document.
    pub fn max_terms(mut self, max_terms: usize) -> Self {
        self.max_terms = Some(max_terms);
        self
    }

    /// Remove the per-document cap.
    pub fn unbounded(mut self) -> Self {
        self.max_terms = None;
        self
    }

    pub fn term_selector(mut self, term_selector: TermSelector) -> Self {
        self.term_selector = term_selector;
        self
    }

    /// Keep only words whose length in characters is within `min..=max`.
    pub fn term_length(mut self, min: usize, max: usize) -> Self {
        self.min_term_length = min;
        self.max_term_length = max;
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Validate and freeze the setting.
    pub fn build(self) -> Result<FeatureSetting> {
        if self.min_ngram_length == 0 {
            return Err(LexiclassError::invalid_config(
                "min_ngram_length must be at least 1",
            ));
        }
        if self.max_ngram_length < self.min_ngram_length {
            return Err(LexiclassError::invalid_config(format!(
                "max_ngram_length ({}) must be >= min_ngram_length ({})",
                self.max_ngram_length, self.min_ngram_length
            )));
        }
        if self.max_terms == Some(0) {
            return Err(LexiclassError::invalid_config(
                "max_terms must be at least 1",
            ));
        }
        if self.min_term_length == 0 {
            return Err(LexiclassError::invalid_config(
                "min_term_length must be at least 1",
            ));
        }
        if self.max_term_length < self.min_term_length {
            return Err(LexiclassError::invalid_config(format!(
                "max_term_length ({}) must be >= min_term_length ({})",
                self.max_term_length, self.min_term_length
            )));
        }

        Ok(FeatureSetting {
            feature_type: self.feature_type,
            min_ngram_length: self.min_ngram_length,
            max_ngram_length: self.max_ngram_length,
            max_terms: self.max_terms,
            term_selector: self.term_selector,
            min_term_length: self.min_term_length,
            max_term_length: self.max_term_length,
            case_sensitive: self.case_sensitive,
        })
    }
}

impl TryFrom<FeatureSettingBuilder> for FeatureSetting {
    type Error = LexiclassError;

    fn try_from(builder: FeatureSettingBuilder) -> Result<Self> {
        builder.build()
    }
}
