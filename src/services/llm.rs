//! Upstream LLM client — blocking and streaming calls to an
//! OpenAI-compatible chat completions endpoint.
//!
//! Provides:
//! - `LlmClient::complete()` — single-shot completion, full JSON body
//! - `LlmClient::open_stream()` — SSE streaming completion, raw byte stream
//!
//! The client is built once at startup and injected into each request's
//! pipeline through `AppState`; there is no process-wide singleton.

use bytes::Bytes;
use futures::stream::Stream;
use reqwest::Client;
use serde_json::{json, Value};
use std::pin::Pin;
use std::time::Duration;

use crate::config::Config;

/// Wall-clock bound on one upstream request, including the full streaming
/// read. reqwest applies it from connect to the last body byte.
const REQUEST_TIMEOUT_SECS: u64 = 180;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A boxed byte-stream yielding raw provider SSE chunks.
pub type SseStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Credentials missing or left at a placeholder value. Checked before
    /// any network I/O; no request is issued.
    #[error("{0}")]
    Configuration(String),
    /// Provider answered with HTTP >= 400.
    #[error("{0}")]
    Upstream(String),
    /// The request exceeded the wall-clock bound.
    #[error("上游请求超时，请稍后重试。")]
    Timeout,
    /// Provider body parsed but did not contain the expected fields.
    #[error("{0}")]
    MalformedResponse(String),
    /// Connection-level failure talking to the provider.
    #[error("上游连接失败：{0}")]
    Request(#[from] reqwest::Error),
}

fn request_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Request(e)
    }
}

// ---------------------------------------------------------------------------
// LlmClient
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl LlmClient {
    pub fn new(config: &Config) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.clone(),
            model: config.model_name.clone(),
        })
    }

    /// Whether usable credentials are present (for the health endpoint).
    pub fn is_configured(&self) -> bool {
        self.validate().is_ok()
    }

    /// Fail fast on missing or placeholder credentials, before any
    /// network request goes out.
    fn validate(&self) -> Result<(), LlmError> {
        if is_placeholder_key(&self.api_key) {
            return Err(LlmError::Configuration(
                "OPENAI_API_KEY 未正确配置。请在 .env 中设置可用密钥，并重启服务。".into(),
            ));
        }
        if self.base_url.trim().is_empty() {
            return Err(LlmError::Configuration(
                "OPENAI_BASE_URL 未配置。请在 .env 中设置可访问的 OpenAI 兼容地址（例如 https://xxx/v1）。"
                    .into(),
            ));
        }
        Ok(())
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Single-shot completion: one POST, await the full JSON body, return
    /// the generated story text.
    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.validate()?;

        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let resp = self
            .http
            .post(self.chat_completions_url())
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .header("user-agent", "Mozilla/5.0")
            .header("accept", "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(request_error)?;

        let status = resp.status().as_u16();
        let text = resp.text().await.map_err(request_error)?;

        if status >= 400 {
            tracing::error!("Upstream returned {}: {}", status, text);
            return Err(LlmError::Upstream(extract_upstream_error(status, &text)));
        }

        let data: Value = serde_json::from_str(&text).map_err(|_| {
            LlmError::MalformedResponse("上游返回格式异常：无法解析 JSON。".into())
        })?;
        extract_story(&data)
    }

    /// Streaming completion: one POST with `stream: true`, return the open
    /// byte stream for the relay to consume. An HTTP error status is read
    /// in full and surfaced exactly like the blocking path.
    pub async fn open_stream(&self, prompt: &str) -> Result<SseStream, LlmError> {
        self.validate()?;

        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": true,
        });

        let resp = self
            .http
            .post(self.chat_completions_url())
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .header("user-agent", "Mozilla/5.0")
            .header("accept", "text/event-stream")
            .body(body.to_string())
            .send()
            .await
            .map_err(request_error)?;

        let status = resp.status().as_u16();
        if status >= 400 {
            let text = resp.text().await.unwrap_or_default();
            tracing::error!("Upstream returned {}: {}", status, text);
            return Err(LlmError::Upstream(extract_upstream_error(status, &text)));
        }

        Ok(Box::pin(resp.bytes_stream()))
    }
}

// ---------------------------------------------------------------------------
// Response parsing helpers
// ---------------------------------------------------------------------------

/// Placeholder keys left over from `.env.example` never reach the network.
pub fn is_placeholder_key(key: &str) -> bool {
    let key = key.trim().to_lowercase();
    key.is_empty() || key == "sk-xxx" || key.starts_with("your-api-key")
}

/// Pull a human-readable message out of an upstream HTTP error body.
///
/// Tried in order: JSON `error.message`, `error` as a string, top-level
/// `message`, the raw body text, then a generic HTTP-status message.
pub fn extract_upstream_error(status: u16, body: &str) -> String {
    let default_message = format!("上游请求失败（HTTP {status}）");
    if body.is_empty() {
        return default_message;
    }

    let data: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => {
            let trimmed = body.trim();
            return if trimmed.is_empty() {
                default_message
            } else {
                trimmed.to_string()
            };
        }
    };

    for candidate in [&data["error"]["message"], &data["error"], &data["message"]] {
        if let Some(message) = candidate.as_str() {
            let message = message.trim();
            if !message.is_empty() {
                return message.to_string();
            }
        }
    }

    default_message
}

/// Extract the story text from a non-streaming completion body.
fn extract_story(data: &Value) -> Result<String, LlmError> {
    let choices = data["choices"]
        .as_array()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| LlmError::MalformedResponse("上游返回为空：缺少 choices。".into()))?;

    let first = &choices[0];
    if let Some(story) = first["message"]["content"].as_str() {
        if !story.is_empty() {
            return Ok(story.to_string());
        }
    }
    if let Some(text) = first["text"].as_str() {
        if !text.is_empty() {
            return Ok(text.to_string());
        }
    }

    Err(LlmError::MalformedResponse(
        "上游返回为空：缺少 message.content。".into(),
    ))
}
