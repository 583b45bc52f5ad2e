//! ONNX Runtime sequence classifier for the fake-news detector.
//!
//! Wraps a BERT-style `ForSequenceClassification` graph exported to ONNX. The
//! graph takes `input_ids`, `attention_mask` and optionally `token_type_ids`
//! (`[1, 512]` each) and returns logits of shape `[1, 2]`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use newsfact_core::Prediction;
use ort::execution_providers::{CUDAExecutionProvider, ExecutionProvider};
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tracing::{debug, info};

use crate::checkpoint::{self, NUM_LABELS, ResolvedCheckpoint};
use crate::error::{InferenceError, LoadError};
use crate::math::predict_from_logits;
use crate::model::{ModelLoader, TextClassifier};

/// Every input is truncated or padded to this many tokens.
pub const MAX_SEQUENCE_LENGTH: usize = 512;

/// Where the session executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cuda,
    Cpu,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cuda => "cuda",
            Self::Cpu => "cpu",
        }
    }
}

/// Tokenized model input for a single text, each buffer `MAX_SEQUENCE_LENGTH` long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedInput {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub token_type_ids: Vec<i64>,
}

impl EncodedInput {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

/// Fake-news classifier backed by an ONNX Runtime session.
pub struct OnnxClassifier {
    // `Session::run` needs exclusive access.
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    checkpoint: ResolvedCheckpoint,
    device: Device,
    feeds_token_types: bool,
}

impl OnnxClassifier {
    /// Load a checkpoint (directory or any file inside it).
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let checkpoint = checkpoint::resolve(path)?;
        let tokenizer = load_tokenizer(&checkpoint.tokenizer)?;
        let (session, device) = build_session(&checkpoint.weights)?;

        let feeds_token_types = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");

        info!(
            model = %checkpoint.weights.display(),
            model_name = %checkpoint.config.model_name,
            mode = checkpoint.mode.as_str(),
            device = device.as_str(),
            "loaded classifier"
        );
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            checkpoint,
            device,
            feeds_token_types,
        })
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn checkpoint(&self) -> &ResolvedCheckpoint {
        &self.checkpoint
    }

    /// Tokenize `text` with special tokens, truncated and padded to
    /// [`MAX_SEQUENCE_LENGTH`].
    pub fn preprocess(&self, text: &str) -> Result<EncodedInput, InferenceError> {
        encode(&self.tokenizer, text)
    }

    /// Classify one text: forward pass, softmax, argmax.
    pub fn analyze(&self, text: &str) -> Result<Prediction, InferenceError> {
        let encoded = self.preprocess(text)?;
        let shape = [1i64, encoded.len() as i64];

        let ids = Tensor::from_array((shape, encoded.input_ids.into_boxed_slice()))
            .map_err(InferenceError::runtime)?;
        let mask = Tensor::from_array((shape, encoded.attention_mask.into_boxed_slice()))
            .map_err(InferenceError::runtime)?;

        let mut inputs = ort::inputs![
            "input_ids" => ids,
            "attention_mask" => mask,
        ];
        if self.feeds_token_types {
            let types = Tensor::from_array((shape, encoded.token_type_ids.into_boxed_slice()))
                .map_err(InferenceError::runtime)?;
            inputs.push(("token_type_ids".into(), types.into()));
        }

        let mut session = self.session.lock().map_err(|_| InferenceError::Poisoned)?;
        let outputs = session.run(inputs).map_err(InferenceError::runtime)?;

        let (output_shape, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(InferenceError::runtime)?;
        let dims: &[i64] = output_shape;
        if dims != [1, NUM_LABELS as i64] {
            return Err(InferenceError::Output(format!(
                "expected logits of shape [1, {NUM_LABELS}], got {dims:?}"
            )));
        }

        let prediction = predict_from_logits(logits)?;
        debug!(
            verdict = %prediction.verdict,
            confidence = prediction.confidence,
            "classified text"
        );
        Ok(prediction)
    }
}

impl TextClassifier for OnnxClassifier {
    fn classify(&self, text: &str) -> Result<Prediction, InferenceError> {
        self.analyze(text)
    }
}

/// [`ModelLoader`] that builds an [`OnnxClassifier`] from a checkpoint path.
#[derive(Debug, Clone)]
pub struct CheckpointLoader {
    path: PathBuf,
}

impl CheckpointLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModelLoader for CheckpointLoader {
    fn load(&self) -> Result<Arc<dyn TextClassifier>, LoadError> {
        info!(path = %self.path.display(), "loading model");
        Ok(Arc::new(OnnxClassifier::load(&self.path)?))
    }
}

fn load_tokenizer(path: &Path) -> Result<Tokenizer, LoadError> {
    let mut tokenizer =
        Tokenizer::from_file(path).map_err(|e| LoadError::Tokenizer(e.to_string()))?;

    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: MAX_SEQUENCE_LENGTH,
            ..Default::default()
        }))
        .map_err(|e| LoadError::Tokenizer(format!("set truncation: {e}")))?;

    // Fixed-length padding: the exported graph expects [1, 512].
    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::Fixed(MAX_SEQUENCE_LENGTH),
        ..Default::default()
    }));

    Ok(tokenizer)
}

fn encode(tokenizer: &Tokenizer, text: &str) -> Result<EncodedInput, InferenceError> {
    let encoding = tokenizer
        .encode(text, true)
        .map_err(|e| InferenceError::Tokenize(e.to_string()))?;

    let widen = |xs: &[u32]| xs.iter().map(|&x| i64::from(x)).collect::<Vec<i64>>();
    Ok(EncodedInput {
        input_ids: widen(encoding.get_ids()),
        attention_mask: widen(encoding.get_attention_mask()),
        token_type_ids: widen(encoding.get_type_ids()),
    })
}

/// Build the session on CUDA when the provider is usable, otherwise on CPU.
fn build_session(weights: &Path) -> Result<(Session, Device), LoadError> {
    let cuda = CUDAExecutionProvider::default();
    let device = if cuda.is_available().unwrap_or(false) {
        Device::Cuda
    } else {
        Device::Cpu
    };

    let mut builder = Session::builder()
        .map_err(LoadError::runtime)?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(LoadError::runtime)?;
    if device == Device::Cuda {
        builder = builder
            .with_execution_providers([cuda.build()])
            .map_err(LoadError::runtime)?;
    }

    let session = builder
        .commit_from_file(weights)
        .map_err(LoadError::runtime)?;
    Ok((session, device))
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsfact_core::Verdict;
    use std::fs;

    /// Word-level vocabulary split on whitespace; `[PAD]` is id 0.
    const WORD_LEVEL_TOKENIZER: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": {"type": "Whitespace"},
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": {"[PAD]": 0, "[UNK]": 1, "moon": 2, "cheese": 3, "word": 4},
            "unk_token": "[UNK]"
        }
    }"#;

    fn word_level_tokenizer() -> (tempfile::TempDir, Tokenizer) {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("tokenizer.json");
        fs::write(&path, WORD_LEVEL_TOKENIZER).unwrap();
        let tokenizer = load_tokenizer(&path).unwrap();
        (tmp, tokenizer)
    }

    #[test]
    fn short_text_is_padded_to_max_length() {
        let (_tmp, tokenizer) = word_level_tokenizer();
        let encoded = encode(&tokenizer, "moon cheese planet").unwrap();

        assert_eq!(encoded.len(), MAX_SEQUENCE_LENGTH);
        assert_eq!(encoded.attention_mask.len(), MAX_SEQUENCE_LENGTH);
        assert_eq!(encoded.token_type_ids.len(), MAX_SEQUENCE_LENGTH);
        assert_eq!(&encoded.input_ids[..4], &[2, 3, 1, 0]);
        assert_eq!(&encoded.attention_mask[..4], &[1, 1, 1, 0]);
        assert!(encoded.input_ids[3..].iter().all(|&id| id == 0));
        assert!(encoded.token_type_ids.iter().all(|&t| t == 0));
    }

    #[test]
    fn long_text_is_truncated_to_max_length() {
        let (_tmp, tokenizer) = word_level_tokenizer();
        let encoded = encode(&tokenizer, &"word ".repeat(2000)).unwrap();

        assert_eq!(encoded.len(), MAX_SEQUENCE_LENGTH);
        assert!(encoded.input_ids.iter().all(|&id| id == 4));
        assert!(encoded.attention_mask.iter().all(|&m| m == 1));
    }

    #[test]
    fn unreadable_tokenizer_is_a_load_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("tokenizer.json");
        fs::write(&path, "{}").unwrap();
        assert!(matches!(load_tokenizer(&path), Err(LoadError::Tokenizer(_))));
    }

    fn model_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("models")
            .join("bert_liar_model")
    }

    fn require_model() -> PathBuf {
        let dir = model_dir();
        if !dir.join("model.onnx").exists() {
            panic!(
                "Model not found. Export the checkpoint to ONNX first:\n  \
                 optimum-cli export onnx --task text-classification <checkpoint> models/bert_liar_model"
            );
        }
        dir
    }

    #[test]
    #[ignore = "requires models/bert_liar_model"]
    fn load_model() {
        let clf = OnnxClassifier::load(&require_model()).unwrap();
        assert_eq!(clf.checkpoint().config.num_labels, 2);
    }

    #[test]
    #[ignore = "requires models/bert_liar_model"]
    fn preprocess_pads_to_max_length() {
        let clf = OnnxClassifier::load(&require_model()).unwrap();
        let encoded = clf.preprocess("Short claim.").unwrap();
        assert_eq!(encoded.len(), MAX_SEQUENCE_LENGTH);
        assert_eq!(encoded.attention_mask.len(), MAX_SEQUENCE_LENGTH);
        assert_eq!(*encoded.attention_mask.last().unwrap(), 0);

        let long = "word ".repeat(2000);
        let encoded = clf.preprocess(&long).unwrap();
        assert_eq!(encoded.len(), MAX_SEQUENCE_LENGTH);
        assert!(encoded.attention_mask.iter().all(|&m| m == 1));
    }

    #[test]
    #[ignore = "requires models/bert_liar_model"]
    fn analyze_is_deterministic() {
        let clf = OnnxClassifier::load(&require_model()).unwrap();
        let text = "Breaking: scientists confirm the moon is made of cheese.";
        let a = clf.analyze(text).unwrap();
        let b = clf.analyze(text).unwrap();
        assert_eq!(a.verdict, b.verdict);
        assert_eq!(a.confidence, b.confidence);
        assert!(matches!(a.verdict, Verdict::Real | Verdict::Fake));
        assert!((0.5..=1.0).contains(&a.confidence));
    }
}
