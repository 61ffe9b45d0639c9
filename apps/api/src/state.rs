use std::sync::Arc;

use crate::analysis::orchestrator::Analyzer;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Analysis pipeline. Holds no per-request state, so one instance serves every call.
    pub analyzer: Arc<Analyzer>,
    pub config: Config,
}
