//! Seams between a loaded model and whatever serves it.

use std::sync::Arc;

use newsfact_core::Prediction;

use crate::error::{InferenceError, LoadError};

/// A loaded two-class text classifier.
///
/// Implementations must be deterministic: the same text against the same
/// weights always yields the same [`Prediction`].
pub trait TextClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<Prediction, InferenceError>;
}

/// Builds a [`TextClassifier`]. Called from a blocking context; may do file IO.
pub trait ModelLoader: Send + Sync {
    fn load(&self) -> Result<Arc<dyn TextClassifier>, LoadError>;
}
