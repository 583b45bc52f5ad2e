//! AI inference layer: checkpoint resolution and ONNX Runtime sequence classification.

pub mod checkpoint;
mod error;
mod math;
mod model;

pub use checkpoint::{CheckpointConfig, LoadMode, ResolvedCheckpoint};
pub use error::{InferenceError, LoadError};
pub use math::{argmax, predict_from_logits, softmax};
pub use model::{ModelLoader, TextClassifier};

#[cfg(feature = "onnx")]
mod classifier;
#[cfg(feature = "onnx")]
pub use classifier::{CheckpointLoader, Device, EncodedInput, MAX_SEQUENCE_LENGTH, OnnxClassifier};
