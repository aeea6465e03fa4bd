//! Training and classification inputs.

use serde::{Deserialize, Serialize};

/// A document, either as raw text or as already extracted terms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Input {
    Text(String),
    Terms(Vec<String>),
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Input::Text(text)
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Input::Text(text.to_string())
    }
}

impl From<Vec<String>> for Input {
    fn from(terms: Vec<String>) -> Self {
        Input::Terms(terms)
    }
}

/// A labeled training document.
///
/// The weight multiplies the counts the document contributes; it defaults
/// to 1.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub input: Input,
    pub category: String,
    #[serde(default = "default_weight")]
    pub weight: u64,
}

fn default_weight() -> u64 {
    1
}

impl Instance {
    pub fn new<I: Into<Input>, C: Into<String>>(input: I, category: C) -> Self {
        Instance {
            input: input.into(),
            category: category.into(),
            weight: default_weight(),
        }
    }

    /// A text document labeled with `category`.
    pub fn text<S: Into<String>, C: Into<String>>(text: S, category: C) -> Self {
        Instance::new(Input::Text(text.into()), category)
    }

    /// A document given as extracted terms.
    pub fn terms<S: Into<String>, C: Into<String>>(
        terms: impl IntoIterator<Item = S>,
        category: C,
    ) -> Self {
        Instance::new(
            Input::Terms(terms.into_iter().map(Into::into).collect()),
            category,
        )
    }

    pub fn with_weight(mut self, weight: u64) -> Self {
        self.weight = weight;
        self
    }
}
