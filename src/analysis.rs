//! Text analysis for Lexiclass.
//!
//! Tokenizers and token filters feed the [`extractor::FeatureExtractor`],
//! which turns text into the terms stored in dictionaries, as described by a
//! [`feature_setting::FeatureSetting`].

pub mod extractor;
pub mod feature_setting;
pub mod token;
pub mod token_filter;
pub mod tokenizer;
