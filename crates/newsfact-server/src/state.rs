//! Model lifecycle shared by every request.
//!
//! The model is loaded at most once at a time: concurrent callers wait on the
//! same load. A failed load leaves the slot empty so the next caller retries.

use std::sync::{Arc, Mutex, PoisonError};

use newsfact_ai::{ModelLoader, TextClassifier};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Why the most recent load attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct LoadFailure(pub String);

/// Observable lifecycle of the model slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelState {
    Uninitialized,
    Ready,
    Failed(String),
}

pub struct ModelSlot {
    loader: Arc<dyn ModelLoader>,
    model: OnceCell<Arc<dyn TextClassifier>>,
    last_failure: Mutex<Option<String>>,
}

impl ModelSlot {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            model: OnceCell::new(),
            last_failure: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ModelState {
        if self.model.initialized() {
            return ModelState::Ready;
        }
        match self.failure().clone() {
            Some(reason) => ModelState::Failed(reason),
            None => ModelState::Uninitialized,
        }
    }

    /// Return the loaded model, loading it on the blocking pool if needed.
    pub async fn get_or_load(&self) -> Result<Arc<dyn TextClassifier>, LoadFailure> {
        let result = self
            .model
            .get_or_try_init(|| async {
                let loader = Arc::clone(&self.loader);
                tokio::task::spawn_blocking(move || loader.load())
                    .await
                    .map_err(|e| LoadFailure(format!("model loader panicked: {e}")))?
                    .map_err(|e| LoadFailure(e.to_string()))
            })
            .await;

        match result {
            Ok(model) => {
                if self.failure().take().is_some() {
                    info!("model loaded after earlier failure");
                }
                Ok(Arc::clone(model))
            }
            Err(failure) => {
                warn!(error = %failure, "model load failed");
                *self.failure() = Some(failure.0.clone());
                Err(failure)
            }
        }
    }

    fn failure(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.last_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
