//! HTTP request handlers for the field API.

pub mod animate;
pub mod health;
pub mod heatmap;
pub mod legend;

use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

/// Run CPU-bound pipeline work off the async executor.
pub(crate) async fn run_blocking<T, F>(state: &Arc<AppState>, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> Result<T, field_common::FieldError> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || work(&state))
        .await
        .map_err(|e| ApiError::Internal(format!("pipeline task failed: {}", e)))?
        .map_err(ApiError::from)
}
