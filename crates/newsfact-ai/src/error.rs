#[cfg(feature = "onnx")]
use std::fmt;
use std::path::PathBuf;

use newsfact_core::VerdictError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("checkpoint not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid checkpoint config: {0}")]
    InvalidConfig(String),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("onnx runtime error: {0}")]
    Runtime(String),
}

impl LoadError {
    #[cfg(feature = "onnx")]
    pub(crate) fn runtime(err: impl fmt::Display) -> Self {
        Self::Runtime(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("tokenization failed: {0}")]
    Tokenize(String),

    #[error("onnx runtime error: {0}")]
    Runtime(String),

    #[error("unexpected model output: {0}")]
    Output(String),

    #[error(transparent)]
    Prediction(#[from] VerdictError),

    #[error("inference session lock poisoned")]
    Poisoned,
}

impl InferenceError {
    #[cfg(feature = "onnx")]
    pub(crate) fn runtime(err: impl fmt::Display) -> Self {
        Self::Runtime(err.to_string())
    }
}
