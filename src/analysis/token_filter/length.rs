//! Length filter implementation.

use super::Filter;

use crate::analysis::token::{Token, TokenStream};
use crate::error::{LexiclassError, Result};

/// A filter that drops tokens whose character length is outside `[min, max]`.
///
/// Surviving tokens are renumbered so their positions stay contiguous.
#[derive(Clone, Debug)]
pub struct LengthFilter {
    min: usize,
    max: usize,
}

impl LengthFilter {
    /// Create a new length filter with inclusive bounds.
    pub fn new(min: usize, max: usize) -> Result<Self> {
        if max < min {
            return Err(LexiclassError::analysis(format!(
                "max length ({max}) must be >= min length ({min})"
            )));
        }
        Ok(LengthFilter { min, max })
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }
}

impl Filter for LengthFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let (min, max) = (self.min, self.max);
        let kept: Vec<Token> = tokens
            .filter(|token| (min..=max).contains(&token.char_len()))
            .enumerate()
            .map(|(position, mut token)| {
                token.position = position;
                token
            })
            .collect();
        Ok(Box::new(kept.into_iter()))
    }

    fn name(&self) -> &'static str {
        "length"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_filter() {
        let filter = LengthFilter::new(2, 5).unwrap();
        let tokens = vec![
            Token::new("a", 0),
            Token::new("room", 1),
            Token::new("attached", 2),
            Token::new("buy", 3),
        ];

        let result: Vec<Token> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].text, "room");
        assert_eq!(result[0].position, 0);
        assert_eq!(result[1].text, "buy");
        assert_eq!(result[1].position, 1);
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(LengthFilter::new(4, 3).is_err());
    }

    #[test]
    fn test_filter_name() {
        let filter = LengthFilter::new(1, 10).unwrap();
        assert_eq!(filter.name(), "length");
        assert_eq!((filter.min(), filter.max()), (1, 10));
    }
}
