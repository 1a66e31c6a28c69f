pub mod generate;
pub mod health;

use crate::AppState;
use axum::Router;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(generate::router())
        .with_state(state)
}
