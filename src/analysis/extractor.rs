//! Turning text into dictionary terms.
//!
//! Word mode segments text on Unicode word boundaries, lowercases (unless the
//! setting is case sensitive), drops words outside the configured length range
//! and emits every contiguous window of `min..=max` words joined by a single
//! space. Char mode lowercases, collapses whitespace runs and slides a window of
//! each length across the characters. In both modes grams are emitted per start
//! position, shortest first.
//!
//! Repeated terms are kept in occurrence order; the `max_terms` cap limits the
//! number of *distinct* terms and never reorders the output.

use ahash::{AHashMap, AHashSet};

use crate::analysis::feature_setting::{FeatureSetting, FeatureType, TermSelector};
use crate::analysis::token::Token;
use crate::analysis::token_filter::Filter;
use crate::analysis::token_filter::length::LengthFilter;
use crate::analysis::token_filter::lowercase::{LowercaseFilter, to_lowercase};
use crate::analysis::tokenizer::Tokenizer;
use crate::analysis::tokenizer::ngram::NgramTokenizer;
use crate::analysis::tokenizer::unicode_word::UnicodeWordTokenizer;
use crate::error::Result;

/// Extract terms from `text` according to `setting`.
///
/// # Examples
///
/// ```
/// use lexiclass::analysis::extractor::extract;
/// use lexiclass::analysis::feature_setting::FeatureSetting;
///
/// let setting = FeatureSetting::words(1, 2).build().unwrap();
/// let terms = extract("Buy cheap pills", &setting).unwrap();
/// assert_eq!(terms, vec!["buy", "buy cheap", "cheap", "cheap pills", "pills"]);
/// ```
pub fn extract(text: &str, setting: &FeatureSetting) -> Result<Vec<String>> {
    FeatureExtractor::new(setting.clone())?.extract(text)
}

/// Distinct terms in first-seen order with their number of occurrences.
pub fn term_frequencies(terms: &[String]) -> Vec<(String, u32)> {
    let mut index: AHashMap<&str, usize> = AHashMap::with_capacity(terms.len());
    let mut frequencies: Vec<(String, u32)> = Vec::new();

    for term in terms {
        match index.get(term.as_str()) {
            Some(&i) => frequencies[i].1 += 1,
            None => {
                index.insert(term.as_str(), frequencies.len());
                frequencies.push((term.clone(), 1));
            }
        }
    }

    frequencies
}

/// A reusable extractor bound to one [`FeatureSetting`].
pub struct FeatureExtractor {
    setting: FeatureSetting,
    tokenizer: Box<dyn Tokenizer>,
    filters: Vec<Box<dyn Filter>>,
}

impl std::fmt::Debug for FeatureExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureExtractor")
            .field("setting", &self.setting)
            .field("tokenizer", &self.tokenizer.name())
            .field(
                "filters",
                &self.filters.iter().map(|f| f.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl FeatureExtractor {
    pub fn new(setting: FeatureSetting) -> Result<Self> {
        let (tokenizer, filters): (Box<dyn Tokenizer>, Vec<Box<dyn Filter>>) =
            match setting.feature_type() {
                FeatureType::Word => {
                    let mut filters: Vec<Box<dyn Filter>> = Vec::new();
                    if !setting.is_case_sensitive() {
                        filters.push(Box::new(LowercaseFilter::new()));
                    }
                    filters.push(Box::new(LengthFilter::new(
                        setting.min_term_length(),
                        setting.max_term_length(),
                    )?));
                    (Box::new(UnicodeWordTokenizer::new()), filters)
                }
                FeatureType::Char => (
                    Box::new(NgramTokenizer::new(
                        setting.min_ngram_length(),
                        setting.max_ngram_length(),
                    )?),
                    Vec::new(),
                ),
            };

        Ok(FeatureExtractor {
            setting,
            tokenizer,
            filters,
        })
    }

    pub fn setting(&self) -> &FeatureSetting {
        &self.setting
    }

    /// Extract the terms of `text`, repeats included, in occurrence order.
    pub fn extract(&self, text: &str) -> Result<Vec<String>> {
        let terms = match self.setting.feature_type() {
            FeatureType::Word => self.word_ngrams(text)?,
            FeatureType::Char => self.char_ngrams(text)?,
        };
        Ok(self.limit(terms))
    }

    fn word_ngrams(&self, text: &str) -> Result<Vec<String>> {
        let mut stream = self.tokenizer.tokenize(text)?;
        for filter in &self.filters {
            stream = filter.filter(stream)?;
        }
        let words: Vec<Token> = stream.collect();

        let (min, max) = (
            self.setting.min_ngram_length(),
            self.setting.max_ngram_length(),
        );
        let mut terms = Vec::new();
        for start in 0..words.len() {
            for len in min..=max {
                let end = start + len;
                if end > words.len() {
                    break;
                }
                let gram = words[start..end]
                    .iter()
                    .map(|t| t.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                terms.push(gram);
            }
        }
        Ok(terms)
    }

    fn char_ngrams(&self, text: &str) -> Result<Vec<String>> {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let normalized = if self.setting.is_case_sensitive() {
            collapsed
        } else {
            to_lowercase(&collapsed)
        };

        Ok(self
            .tokenizer
            .tokenize(&normalized)?
            .map(|token| token.text)
            .collect())
    }

    fn limit(&self, terms: Vec<String>) -> Vec<String> {
        let Some(max_terms) = self.setting.max_terms() else {
            return terms;
        };

        let mut frequencies = term_frequencies(&terms);
        if frequencies.len() <= max_terms {
            return terms;
        }

        if self.setting.term_selector() == TermSelector::Frequency {
            // Stable, so equal counts keep first-seen order.
            frequencies.sort_by(|a, b| b.1.cmp(&a.1));
        }
        frequencies.truncate(max_terms);

        let kept: AHashSet<String> = frequencies.into_iter().map(|(term, _)| term).collect();
        terms.into_iter().filter(|term| kept.contains(term)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(min: usize, max: usize) -> FeatureSetting {
        FeatureSetting::words(min, max).build().unwrap()
    }

    #[test]
    fn test_word_unigrams() {
        let terms = extract("Buy cheap PILLS!", &words(1, 1)).unwrap();
        assert_eq!(terms, vec!["buy", "cheap", "pills"]);
    }

    #[test]
    fn test_word_ngram_order() {
        let terms = extract("meeting agenda attached", &words(1, 3)).unwrap();
        assert_eq!(
            terms,
            vec![
                "meeting",
                "meeting agenda",
                "meeting agenda attached",
                "agenda",
                "agenda attached",
                "attached",
            ]
        );
    }

    #[test]
    fn test_case_sensitive_words() {
        let setting = FeatureSetting::words(1, 1)
            .case_sensitive(true)
            .build()
            .unwrap();
        assert_eq!(extract("Cheap cheap", &setting).unwrap(), vec!["Cheap", "cheap"]);
    }

    #[test]
    fn test_term_length_filter_applies_before_ngrams() {
        let setting = FeatureSetting::words(2, 2)
            .term_length(3, 10)
            .build()
            .unwrap();
        let terms = extract("buy a cheap room", &setting).unwrap();
        assert_eq!(terms, vec!["buy cheap", "cheap room"]);
    }

    #[test]
    fn test_char_ngrams_collapse_whitespace() {
        let setting = FeatureSetting::chars(3, 3).build().unwrap();
        let terms = extract("  Ab \t\n Cd ", &setting).unwrap();
        assert_eq!(terms, vec!["ab ", "b c", " cd"]);
    }

    #[test]
    fn test_char_ngrams_mixed_lengths() {
        let setting = FeatureSetting::chars(1, 2).build().unwrap();
        assert_eq!(
            extract("abc", &setting).unwrap(),
            vec!["a", "ab", "b", "bc", "c"]
        );
    }

    #[test]
    fn test_empty_text() {
        assert!(extract("", &words(1, 2)).unwrap().is_empty());
        let chars = FeatureSetting::chars(2, 4).build().unwrap();
        assert!(extract("   ", &chars).unwrap().is_empty());
    }

    #[test]
    fn test_repeats_are_kept() {
        let terms = extract("spam spam eggs spam", &words(1, 1)).unwrap();
        assert_eq!(terms, vec!["spam", "spam", "eggs", "spam"]);
    }

    #[test]
    fn test_max_terms_first_seen() {
        let setting = FeatureSetting::words(1, 1).max_terms(2).build().unwrap();
        let terms = extract("a b c b c c", &setting).unwrap();
        assert_eq!(terms, vec!["a", "b", "b"]);
    }

    #[test]
    fn test_max_terms_frequency() {
        let setting = FeatureSetting::words(1, 1)
            .max_terms(2)
            .term_selector(TermSelector::Frequency)
            .build()
            .unwrap();
        let terms = extract("a b c b c c", &setting).unwrap();
        assert_eq!(terms, vec!["b", "c", "b", "c", "c"]);

        // Ties resolve to the earlier first occurrence.
        let terms = extract("x y z", &setting).unwrap();
        assert_eq!(terms, vec!["x", "y"]);
    }

    #[test]
    fn test_deterministic() {
        let setting = FeatureSetting::words(1, 2).max_terms(3).build().unwrap();
        let extractor = FeatureExtractor::new(setting).unwrap();
        let text = "the quick brown fox jumps over the lazy dog";
        assert_eq!(extractor.extract(text).unwrap(), extractor.extract(text).unwrap());
    }

    #[test]
    fn test_term_frequencies() {
        let terms: Vec<String> = ["b", "a", "b", "c", "b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            term_frequencies(&terms),
            vec![("b".to_string(), 3), ("a".to_string(), 1), ("c".to_string(), 1)]
        );
    }

    #[test]
    fn test_debug_lists_pipeline() {
        let extractor = FeatureExtractor::new(words(1, 1)).unwrap();
        let debug = format!("{extractor:?}");
        assert!(debug.contains("unicode_word"));
        assert!(debug.contains("lowercase"));
    }
}
