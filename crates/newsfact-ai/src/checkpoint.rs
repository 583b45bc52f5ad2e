//! Checkpoint discovery and config parsing.
//!
//! A checkpoint is a directory holding an exported ONNX graph, its tokenizer
//! and a config record naming the base architecture and label count. Two
//! layouts are accepted:
//!
//! - **strict**: `checkpoint.json` with `{"config": {"model_name", "num_labels"}, "model_state"}`.
//!   Unknown fields are rejected and both config keys are required.
//! - **legacy**: a HuggingFace-style `config.json`, read leniently.
//!
//! Neither layout can execute code while loading: both are plain JSON plus an
//! ONNX graph, and no custom operator libraries are registered.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::LoadError;

pub const MANIFEST_FILE: &str = "checkpoint.json";
pub const LEGACY_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_WEIGHTS_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// The classifier head is binary: Real vs Fake.
pub const NUM_LABELS: usize = 2;

/// Config record stored alongside the weights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckpointConfig {
    /// Base architecture, e.g. `bert-base-uncased`. Also names the tokenizer.
    pub model_name: String,
    pub num_labels: usize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    config: CheckpointConfig,
    #[serde(default = "default_weights_file")]
    model_state: String,
}

fn default_weights_file() -> String {
    DEFAULT_WEIGHTS_FILE.to_string()
}

/// Which layout a checkpoint was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    Strict,
    Legacy,
}

impl LoadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Legacy => "legacy",
        }
    }
}

/// A checkpoint whose config has been validated and whose files exist.
#[derive(Debug, Clone)]
pub struct ResolvedCheckpoint {
    pub dir: PathBuf,
    pub config: CheckpointConfig,
    pub weights: PathBuf,
    pub tokenizer: PathBuf,
    pub mode: LoadMode,
}

enum StrictRead {
    Parsed(Manifest),
    Absent,
    Rejected(String),
}

/// Locate and validate a checkpoint.
///
/// `path` may be the checkpoint directory or any file inside it (typically
/// the manifest or the `.onnx` graph).
pub fn resolve(path: &Path) -> Result<ResolvedCheckpoint, LoadError> {
    let dir = checkpoint_dir(path)?;

    let (config, weights, mode) = match read_strict(&dir)? {
        StrictRead::Parsed(manifest) => (
            manifest.config,
            dir.join(manifest.model_state),
            LoadMode::Strict,
        ),
        StrictRead::Absent => {
            warn!(dir = %dir.display(), "no {MANIFEST_FILE}, falling back to legacy config");
            let config = read_legacy(&dir)?;
            (config, dir.join(DEFAULT_WEIGHTS_FILE), LoadMode::Legacy)
        }
        StrictRead::Rejected(reason) => {
            warn!(dir = %dir.display(), %reason, "strict manifest rejected, falling back to legacy config");
            let config = read_legacy(&dir).map_err(|e| {
                LoadError::InvalidConfig(format!("{reason}; legacy fallback failed: {e}"))
            })?;
            (config, dir.join(DEFAULT_WEIGHTS_FILE), LoadMode::Legacy)
        }
    };

    validate(&config)?;

    if !weights.is_file() {
        return Err(LoadError::NotFound(weights));
    }
    let tokenizer = locate_tokenizer(&dir, &config.model_name)?;

    info!(
        dir = %dir.display(),
        model_name = %config.model_name,
        mode = mode.as_str(),
        "resolved checkpoint"
    );
    Ok(ResolvedCheckpoint {
        dir,
        config,
        weights,
        tokenizer,
        mode,
    })
}

fn checkpoint_dir(path: &Path) -> Result<PathBuf, LoadError> {
    if path.is_dir() {
        return Ok(path.to_path_buf());
    }
    if path.is_file() {
        return Ok(match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        });
    }
    Err(LoadError::NotFound(path.to_path_buf()))
}

fn read_strict(dir: &Path) -> Result<StrictRead, LoadError> {
    let path = dir.join(MANIFEST_FILE);
    let Some(raw) = read_optional(&path)? else {
        return Ok(StrictRead::Absent);
    };
    Ok(match serde_json::from_str::<Manifest>(&raw) {
        Ok(manifest) => StrictRead::Parsed(manifest),
        Err(e) => StrictRead::Rejected(format!("{MANIFEST_FILE}: {e}")),
    })
}

/// Lenient read of a HuggingFace-style `config.json`.
///
/// `model_name` falls back to `_name_or_path`, `num_labels` to the size of
/// `id2label`. Unrelated keys are ignored.
fn read_legacy(dir: &Path) -> Result<CheckpointConfig, LoadError> {
    let path = dir.join(LEGACY_CONFIG_FILE);
    let raw = read_optional(&path)?.ok_or_else(|| LoadError::NotFound(path.clone()))?;
    let value: Value = serde_json::from_str(&raw)
        .map_err(|e| LoadError::InvalidConfig(format!("{LEGACY_CONFIG_FILE}: {e}")))?;

    let model_name = value
        .get("model_name")
        .or_else(|| value.get("_name_or_path"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            LoadError::InvalidConfig(format!("{LEGACY_CONFIG_FILE}: missing 'model_name'"))
        })?;

    let num_labels = value
        .get("num_labels")
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .or_else(|| value.get("id2label").and_then(Value::as_object).map(|m| m.len()))
        .ok_or_else(|| {
            LoadError::InvalidConfig(format!("{LEGACY_CONFIG_FILE}: missing 'num_labels'"))
        })?;

    Ok(CheckpointConfig {
        model_name: model_name.to_string(),
        num_labels,
    })
}

fn validate(config: &CheckpointConfig) -> Result<(), LoadError> {
    if config.model_name.trim().is_empty() {
        return Err(LoadError::InvalidConfig("empty model_name".into()));
    }
    if config.num_labels != NUM_LABELS {
        return Err(LoadError::InvalidConfig(format!(
            "expected {NUM_LABELS} labels, checkpoint declares {}",
            config.num_labels
        )));
    }
    Ok(())
}

/// Prefer a tokenizer shipped with the checkpoint, else one stored next to it
/// under the base model's name.
fn locate_tokenizer(dir: &Path, model_name: &str) -> Result<PathBuf, LoadError> {
    let local = dir.join(TOKENIZER_FILE);
    if local.is_file() {
        return Ok(local);
    }
    if let Some(parent) = dir.parent() {
        let shared = parent.join(model_name).join(TOKENIZER_FILE);
        if shared.is_file() {
            return Ok(shared);
        }
    }
    Err(LoadError::NotFound(local))
}

fn read_optional(path: &Path) -> Result<Option<String>, LoadError> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(LoadError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
