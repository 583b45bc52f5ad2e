//! HTTP layer: axum router, model lifecycle, error mapping.

mod error;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::{AppState, router, serve};
pub use state::{LoadFailure, ModelSlot, ModelState};
