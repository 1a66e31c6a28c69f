pub mod config;
pub mod models;
pub mod routes;
pub mod services;

#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub llm: services::llm::LlmClient,
}
