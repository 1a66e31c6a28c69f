use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub cors_origin: String,
    /// API key for the OpenAI-compatible provider. May be empty or a
    /// placeholder — validated per request, not at startup.
    pub openai_api_key: String,
    /// Base URL of the provider, e.g. "https://xxx/v1".
    pub openai_base_url: String,
    pub model_name: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            cors_origin: env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".into()),
            openai_api_key: env::var("OPENAI_API_KEY")
                .unwrap_or_default()
                .trim()
                .to_string(),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_default()
                .trim()
                .to_string(),
            model_name: env::var("MODEL_NAME")
                .unwrap_or_else(|_| "gemini-3-flash-preview".into()),
        }
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_origin
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
