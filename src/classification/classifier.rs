//! Dictionary-based text classifier.

use std::path::Path;

use log::{info, warn};

use crate::analysis::extractor::{FeatureExtractor, extract};
use crate::analysis::feature_setting::FeatureSetting;
use crate::classification::category::CategoryEntries;
use crate::classification::instance::{Input, Instance};
use crate::classification::traits::{Classifier, Learner};
use crate::dictionary::{
    DictionaryBuilder, DictionaryModel, InMemoryDictionary, PersistedDictionary, PruningStrategy,
};
use crate::error::Result;
use crate::scoring::Scorer;

/// Trains term dictionaries and classifies documents against them.
///
/// # Examples
///
/// ```
/// use lexiclass::analysis::feature_setting::FeatureSetting;
/// use lexiclass::classification::{Instance, TextClassifier};
///
/// let classifier = TextClassifier::new(FeatureSetting::words(1, 1).build().unwrap());
/// let model = classifier
///     .train(vec![
///         Instance::text("buy cheap pills", "spam"),
///         Instance::text("meeting agenda attached", "ham"),
///     ])
///     .unwrap();
///
/// let result = classifier.classify_text("cheap pills", &model).unwrap();
/// assert_eq!(result.most_likely().unwrap().name(), "spam");
/// ```
#[derive(Clone, Debug)]
pub struct TextClassifier {
    feature_setting: FeatureSetting,
    scorer: Scorer,
    pruning: Option<PruningStrategy>,
}

impl Default for TextClassifier {
    fn default() -> Self {
        TextClassifier::new(FeatureSetting::default())
    }
}

impl TextClassifier {
    /// A classifier with the default scorer and no pruning.
    pub fn new(feature_setting: FeatureSetting) -> Self {
        TextClassifier {
            feature_setting,
            scorer: Scorer::default(),
            pruning: None,
        }
    }

    pub fn with_scorer<S: Into<Scorer>>(mut self, scorer: S) -> Self {
        self.scorer = scorer.into();
        self
    }

    /// Prune every dictionary this classifier trains.
    pub fn with_pruning(mut self, pruning: PruningStrategy) -> Self {
        self.pruning = Some(pruning);
        self
    }

    pub fn feature_setting(&self) -> &FeatureSetting {
        &self.feature_setting
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn pruning(&self) -> Option<&PruningStrategy> {
        self.pruning.as_ref()
    }

    /// An empty builder carrying this classifier's feature setting and pruning strategy.
    pub fn train_builder(&self) -> DictionaryBuilder {
        let mut builder = DictionaryBuilder::with_feature_setting(self.feature_setting.clone());
        if let Some(pruning) = &self.pruning {
            builder.set_pruning_strategy(pruning.clone());
        }
        builder
    }

    /// Extract and count every instance, then freeze the dictionary.
    pub fn train<T>(&self, instances: T) -> Result<InMemoryDictionary>
    where
        T: IntoIterator<Item = Instance>,
    {
        let extractor = FeatureExtractor::new(self.feature_setting.clone())?;
        let mut builder = self.train_builder();

        let mut num_instances = 0usize;
        for instance in instances {
            match instance.input {
                Input::Text(text) => {
                    let terms = extractor.extract(&text)?;
                    builder.add_weighted_document(&terms, &instance.category, instance.weight)?
                }
                Input::Terms(terms) => {
                    builder.add_weighted_document(&terms, &instance.category, instance.weight)?
                }
            };
            num_instances += 1;
        }

        info!("trained on {num_instances} instances with {}", self.feature_setting);
        Ok(builder.create())
    }

    /// Train, then write the dictionary as an index at `directory`.
    pub fn train_persisted<T, P>(&self, instances: T, directory: P) -> Result<PersistedDictionary>
    where
        T: IntoIterator<Item = Instance>,
        P: AsRef<Path>,
    {
        self.train(instances)?.index(directory)
    }

    /// Classify `input` against `model`.
    ///
    /// Text is extracted with the model's feature setting when it records one.
    pub fn classify<M: DictionaryModel + ?Sized>(
        &self,
        input: &Input,
        model: &M,
    ) -> Result<CategoryEntries> {
        match input {
            Input::Text(text) => self.classify_text(text, model),
            Input::Terms(terms) => self.classify_terms(terms, model),
        }
    }

    pub fn classify_text<M: DictionaryModel + ?Sized>(
        &self,
        text: &str,
        model: &M,
    ) -> Result<CategoryEntries> {
        let terms = extract(text, self.setting_for(model))?;
        self.classify_terms(&terms, model)
    }

    /// Classify already extracted terms.
    pub fn classify_terms<M: DictionaryModel + ?Sized>(
        &self,
        terms: &[String],
        model: &M,
    ) -> Result<CategoryEntries> {
        self.scorer.score(terms, model)
    }

    fn setting_for<'a, M: DictionaryModel + ?Sized>(&'a self, model: &'a M) -> &'a FeatureSetting {
        match model.feature_setting() {
            Some(setting) => {
                if *setting != self.feature_setting {
                    warn!(
                        "model {} was trained with {setting}, classifier is configured with {}; using the model's setting",
                        model.name().unwrap_or("(unnamed)"),
                        self.feature_setting
                    );
                }
                setting
            }
            None => &self.feature_setting,
        }
    }
}

impl Learner<Instance> for TextClassifier {
    type Model = InMemoryDictionary;

    fn train<T: IntoIterator<Item = Instance>>(&self, instances: T) -> Result<InMemoryDictionary> {
        TextClassifier::train(self, instances)
    }
}

impl<M: DictionaryModel + ?Sized> Classifier<Input, M> for TextClassifier {
    fn classify(&self, input: &Input, model: &M) -> Result<CategoryEntries> {
        TextClassifier::classify(self, input, model)
    }
}

impl<M: DictionaryModel + ?Sized> Classifier<str, M> for TextClassifier {
    fn classify(&self, text: &str, model: &M) -> Result<CategoryEntries> {
        self.classify_text(text, model)
    }
}
