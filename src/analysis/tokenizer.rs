//! Tokenizer implementations for text analysis.
//!
//! - [`unicode_word::UnicodeWordTokenizer`] - Unicode word boundaries (UAX #29)
//! - [`ngram::NgramTokenizer`] - Character n-grams
//!
//! # Examples
//!
//! ```
//! use lexiclass::analysis::tokenizer::Tokenizer;
//! use lexiclass::analysis::tokenizer::unicode_word::UnicodeWordTokenizer;
//!
//! let tokenizer = UnicodeWordTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("buy cheap pills").unwrap().collect();
//! assert_eq!(tokens.len(), 3);
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for tokenizers that convert text into tokens.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod ngram;
pub mod unicode_word;
