//! Generic learning and classification contracts.

use crate::classification::category::CategoryEntries;
use crate::error::Result;

/// Builds a model from labeled training instances of type `I`.
pub trait Learner<I> {
    /// The trained model.
    type Model;

    fn train<T: IntoIterator<Item = I>>(&self, instances: T) -> Result<Self::Model>;
}

/// Scores an input of type `I` against a model of type `M`.
///
/// Classification is read-only: the same input and model always give the
/// same distribution.
pub trait Classifier<I: ?Sized, M: ?Sized> {
    fn classify(&self, input: &I, model: &M) -> Result<CategoryEntries>;
}
