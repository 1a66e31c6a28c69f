use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "llm_configured": state.llm.is_configured(),
        "model": state.config.model_name,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
