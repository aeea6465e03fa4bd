//! Naive Bayes over named nominal and numeric features.
//!
//! Nominal likelihoods are Laplace-smoothed relative frequencies. Numeric
//! features are modeled with one Gaussian per category; a density is divided
//! by the sum of the per-category density maxima so numeric terms stay in
//! the same range as nominal probabilities. Scores are accumulated in log
//! space, starting from the category priors.

use std::f64::consts::PI;

use ahash::AHashMap;
use log::info;
use serde::{Deserialize, Serialize};

use crate::classification::category::{CategoryEntries, CategoryEntriesBuilder};
use crate::classification::traits::{Classifier, Learner};
use crate::error::{LexiclassError, Result};
use crate::scoring::{DEFAULT_FLOOR, normalize_log_scores};

/// Added to every standard deviation so constant features keep a finite density.
const MIN_STANDARD_DEVIATION: f64 = 0.01;

/// A single feature value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Numeric(f64),
    Nominal(String),
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Numeric(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Nominal(value.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(value: String) -> Self {
        FeatureValue::Nominal(value)
    }
}

/// Named feature values in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    features: Vec<(String, FeatureValue)>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a feature.
    pub fn with<N: Into<String>, V: Into<FeatureValue>>(mut self, name: N, value: V) -> Self {
        let name = name.into();
        let value = value.into();
        match self.features.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.features.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.features
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.features.iter().map(|(n, v)| (n.as_str(), v))
    }
}

/// A feature vector labeled with its category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledFeatures {
    pub features: FeatureVector,
    pub category: String,
}

impl LabeledFeatures {
    pub fn new<C: Into<String>>(features: FeatureVector, category: C) -> Self {
        LabeledFeatures {
            features,
            category: category.into(),
        }
    }
}

/// Running mean and variance (Welford).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct GaussianStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl GaussianStats {
    fn add(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    fn standard_deviation(&self) -> f64 {
        let variance = if self.count > 0 {
            self.m2 / self.count as f64
        } else {
            0.0
        };
        variance.sqrt() + MIN_STANDARD_DEVIATION
    }

    fn density(&self, value: f64) -> f64 {
        let sd = self.standard_deviation();
        let z = (value - self.mean) / sd;
        (-0.5 * z * z).exp() / (sd * (2.0 * PI).sqrt())
    }

    fn max_density(&self) -> f64 {
        1.0 / (self.standard_deviation() * (2.0 * PI).sqrt())
    }
}

/// Trains a [`NaiveBayesModel`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NaiveBayesLearner {
    laplace: f64,
}

impl Default for NaiveBayesLearner {
    fn default() -> Self {
        NaiveBayesLearner { laplace: 1.0 }
    }
}

impl NaiveBayesLearner {
    /// A learner with Laplace constant `laplace`, which must be positive and finite.
    pub fn new(laplace: f64) -> Result<Self> {
        if !(laplace.is_finite() && laplace > 0.0) {
            return Err(LexiclassError::invalid_config(format!(
                "Laplace constant must be positive and finite, got {laplace}"
            )));
        }
        Ok(NaiveBayesLearner { laplace })
    }

    pub fn laplace(&self) -> f64 {
        self.laplace
    }
}

impl Learner<LabeledFeatures> for NaiveBayesLearner {
    type Model = NaiveBayesModel;

    fn train<T: IntoIterator<Item = LabeledFeatures>>(&self, instances: T) -> Result<NaiveBayesModel> {
        let mut category_counts: AHashMap<String, u64> = AHashMap::new();
        let mut nominal: AHashMap<String, AHashMap<String, AHashMap<String, u64>>> = AHashMap::new();
        let mut numeric: AHashMap<String, AHashMap<String, GaussianStats>> = AHashMap::new();

        for instance in instances {
            *category_counts.entry(instance.category.clone()).or_default() += 1;
            for (name, value) in instance.features.iter() {
                match value {
                    FeatureValue::Nominal(value) => {
                        let by_value = nominal.entry(name.to_string()).or_default();
                        *by_value
                            .entry(value.clone())
                            .or_default()
                            .entry(instance.category.clone())
                            .or_default() += 1;
                    }
                    FeatureValue::Numeric(value) => {
                        if !value.is_finite() {
                            return Err(LexiclassError::invalid_config(format!(
                                "numeric feature {name} must be finite, got {value}"
                            )));
                        }
                        numeric
                            .entry(name.to_string())
                            .or_default()
                            .entry(instance.category.clone())
                            .or_default()
                            .add(*value);
                    }
                }
            }
        }

        let mut categories: Vec<String> = category_counts.keys().cloned().collect();
        categories.sort();

        info!(
            "trained naive bayes model: {} categories, {} nominal and {} numeric features",
            categories.len(),
            nominal.len(),
            numeric.len()
        );

        Ok(NaiveBayesModel {
            categories,
            category_counts,
            nominal,
            numeric,
            laplace: self.laplace,
        })
    }
}

/// A trained mixed-feature Naive Bayes model.
#[derive(Clone, Debug)]
pub struct NaiveBayesModel {
    /// Sorted.
    categories: Vec<String>,
    category_counts: AHashMap<String, u64>,
    /// feature -> value -> category -> count
    nominal: AHashMap<String, AHashMap<String, AHashMap<String, u64>>>,
    /// feature -> category -> statistics
    numeric: AHashMap<String, AHashMap<String, GaussianStats>>,
    laplace: f64,
}

impl NaiveBayesModel {
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Number of training instances per category.
    pub fn category_counts(&self) -> CategoryEntries {
        let mut builder = CategoryEntriesBuilder::new();
        for (category, count) in &self.category_counts {
            builder.add_mut(category.as_str(), *count as f64);
        }
        builder.build()
    }

    /// Mean and standard deviation of a numeric feature within a category.
    pub fn gaussian(&self, feature: &str, category: &str) -> Option<(f64, f64)> {
        self.numeric
            .get(feature)?
            .get(category)
            .map(|stats| (stats.mean, stats.standard_deviation()))
    }

    /// Probability distribution over the categories for `features`.
    ///
    /// Features unknown to the model are ignored.
    pub fn classify(&self, features: &FeatureVector) -> CategoryEntries {
        if self.categories.is_empty() {
            return CategoryEntries::empty();
        }

        let total: u64 = self.category_counts.values().sum();
        let mut scores: Vec<f64> = self
            .categories
            .iter()
            .map(|c| (self.category_count(c) as f64 / total as f64).ln())
            .collect();

        for (name, value) in features.iter() {
            match value {
                FeatureValue::Nominal(value) => {
                    let Some(by_value) = self.nominal.get(name) else {
                        continue;
                    };
                    let num_values = by_value.len() as f64;
                    let counts = by_value.get(value.as_str());
                    for (score, category) in scores.iter_mut().zip(&self.categories) {
                        let count = counts.and_then(|c| c.get(category)).copied().unwrap_or(0);
                        let probability = (count as f64 + self.laplace)
                            / (self.category_count(category) as f64 + self.laplace * num_values);
                        *score += probability.ln();
                    }
                }
                FeatureValue::Numeric(value) => {
                    let Some(by_category) = self.numeric.get(name) else {
                        continue;
                    };
                    let normalizer: f64 = by_category.values().map(GaussianStats::max_density).sum();
                    for (score, category) in scores.iter_mut().zip(&self.categories) {
                        let density = by_category
                            .get(category)
                            .map_or(0.0, |stats| stats.density(*value) / normalizer);
                        *score += if density > 0.0 {
                            density.ln()
                        } else {
                            DEFAULT_FLOOR.ln()
                        };
                    }
                }
            }
        }

        let scores: Vec<Option<f64>> = scores.into_iter().map(Some).collect();
        normalize_log_scores(&self.categories, &scores, false)
    }

    fn category_count(&self, category: &str) -> u64 {
        self.category_counts.get(category).copied().unwrap_or(0)
    }
}

impl Classifier<FeatureVector, NaiveBayesModel> for NaiveBayesLearner {
    fn classify(&self, input: &FeatureVector, model: &NaiveBayesModel) -> Result<CategoryEntries> {
        Ok(model.classify(input))
    }
}
