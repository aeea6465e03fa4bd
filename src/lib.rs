//! # Lexiclass
//!
//! Dictionary-based probabilistic text classification.
//!
//! Training extracts terms (word or character n-grams) from labeled
//! documents and counts them per category in a term dictionary.
//! Classification looks the terms of a new document up in that dictionary
//! and turns the counts into a probability distribution over categories.
//!
//! ## Features
//!
//! - Word and character n-gram extraction with Unicode word segmentation
//! - In-memory dictionaries with merging, pruning and binary serialization
//! - Persisted, memory-mapped dictionaries for models larger than memory
//! - Relative-frequency and Naive Bayes scoring (Laplace, priors, complement)
//! - A mixed nominal/numeric Naive Bayes classifier
//!
//! ## Example
//!
//! ```
//! use lexiclass::prelude::*;
//!
//! let classifier = TextClassifier::new(FeatureSetting::words(1, 1).build().unwrap());
//! let model = classifier
//!     .train(vec![
//!         Instance::text("buy cheap pills", "spam"),
//!         Instance::text("meeting agenda attached", "ham"),
//!         Instance::text("cheap meeting room", "ham"),
//!     ])
//!     .unwrap();
//!
//! let result = classifier.classify_text("meeting room", &model).unwrap();
//! assert_eq!(result.most_likely().unwrap().name(), "ham");
//! ```

pub mod analysis;
pub mod classification;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod scoring;
pub mod storage;
pub mod util;

pub mod prelude {
    pub use crate::analysis::extractor::{FeatureExtractor, extract};
    pub use crate::analysis::feature_setting::{FeatureSetting, FeatureType, TermSelector};
    pub use crate::classification::naive_bayes::{
        FeatureVector, LabeledFeatures, NaiveBayesLearner, NaiveBayesModel,
    };
    pub use crate::classification::{
        CategoryEntries, CategoryEntry, Classifier, Input, Instance, Learner, TextClassifier,
    };
    pub use crate::config::ClassifierConfig;
    pub use crate::dictionary::{
        DictionaryBuilder, DictionaryModel, InMemoryDictionary, PersistedDictionary,
        PruningStrategy,
    };
    pub use crate::error::{LexiclassError, Result};
    pub use crate::scoring::{BayesOptions, BayesScorer, DefaultScorer, Scorer};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
