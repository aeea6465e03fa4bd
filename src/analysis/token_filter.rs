//! Token filter implementations for token transformation.
//!
//! - [`lowercase::LowercaseFilter`] - Converts tokens to lowercase
//! - [`length::LengthFilter`] - Drops tokens outside a character-length range
//!
//! # Examples
//!
//! ```
//! use lexiclass::analysis::token_filter::Filter;
//! use lexiclass::analysis::token_filter::lowercase::LowercaseFilter;
//! use lexiclass::analysis::token::Token;
//!
//! let filter = LowercaseFilter::new();
//! let tokens = vec![Token::new("Cheap", 0), Token::new("PILLS", 1)];
//! let filtered: Vec<_> = filter.filter(Box::new(tokens.into_iter()))
//!     .unwrap()
//!     .collect();
//!
//! assert_eq!(filtered[0].text, "cheap");
//! assert_eq!(filtered[1].text, "pills");
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for filters that transform token streams.
pub trait Filter: Send + Sync {
    /// Apply this filter to a token stream.
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    /// Get the name of this filter (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod length;
pub mod lowercase;
