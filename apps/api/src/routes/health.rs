use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::config::ProviderSettings;
use crate::state::AppState;

/// GET /health
/// Returns service version plus which provider sits in each slot.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let providers = &state.config.providers;
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "resume-analyzer-api",
        "providers": {
            "primary": slot(providers.primary.as_ref()),
            "secondary": slot(providers.secondary.as_ref()),
        }
    }))
}

fn slot(settings: Option<&ProviderSettings>) -> Value {
    match settings {
        Some(s) => json!({ "provider": s.kind, "model": s.model }),
        None => Value::Null,
    }
}
