//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::config::Config;
use crate::entities::RecordCollection;

/// State shared across all HTTP handlers.
///
/// Built once at startup; nothing in it is mutated afterwards.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// The collection this deployment's records live in.
    pub store: Arc<RecordCollection>,
}
