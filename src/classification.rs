//! Training and classification.
//!
//! [`classifier::TextClassifier`] ties feature extraction, dictionary
//! building and scoring together. [`naive_bayes`] is a sibling classifier for
//! instances described by named nominal and numeric features. Both report
//! their results as [`category::CategoryEntries`].

pub mod category;
pub mod classifier;
pub mod instance;
pub mod naive_bayes;
pub mod traits;

pub use category::{CategoryEntries, CategoryEntriesBuilder, CategoryEntry};
pub use classifier::TextClassifier;
pub use instance::{Input, Instance};
pub use traits::{Classifier, Learner};
