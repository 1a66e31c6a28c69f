//! Story generation endpoints — blocking JSON and SSE streaming.

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
    routing::post,
    Router,
};
use serde_json::{json, Value};
use std::convert::Infallible;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crate::models::LifeInfo;
use crate::services::{analysis, prompt, relay};
use crate::services::relay::RelayEvent;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/generate", post(generate))
        .route("/api/generate/stream", post(generate_stream))
}

// ---------------------------------------------------------------------------
// POST /api/generate — single blocking response
// ---------------------------------------------------------------------------

async fn generate(
    State(state): State<AppState>,
    Json(info): Json<LifeInfo>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let (life_type, score) = analysis::analyze_life_type(&info);
    let prompt = prompt::build_prompt(&info, life_type, score);

    match state.llm.complete(&prompt).await {
        Ok(story) => Ok(Json(json!({
            "success": true,
            "life_type": life_type.label(),
            "stability_score": score,
            "story": story,
        }))),
        Err(e) => {
            tracing::error!("Generate: upstream call failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// POST /api/generate/stream — SSE streaming
// ---------------------------------------------------------------------------

async fn generate_stream(
    State(state): State<AppState>,
    Json(info): Json<LifeInfo>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let (life_type, score) = analysis::analyze_life_type(&info);
    let prompt = prompt::build_prompt(&info, life_type, score);

    let (tx, rx) = tokio::sync::mpsc::channel::<RelayEvent>(32);
    let llm = state.llm.clone();

    tokio::spawn(async move {
        let analysis_event = RelayEvent::Analysis {
            life_type: life_type.label().to_string(),
            stability_score: score,
        };
        if tx.send(analysis_event).await.is_err() {
            return;
        }

        match llm.open_stream(&prompt).await {
            Ok(upstream) => relay::relay_stream(upstream, &tx).await,
            Err(e) => {
                tracing::error!("Generate stream: upstream open failed: {}", e);
                let _ = tx
                    .send(RelayEvent::Error {
                        message: e.to_string(),
                    })
                    .await;
            }
        }
    });

    // Serialize in arrival order; axum writes the `data: ...\n\n` framing.
    let stream = ReceiverStream::new(rx)
        .map(|event| Ok::<_, Infallible>(Event::default().data(event.to_json().to_string())));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
