//! Streaming relay — normalizes a provider SSE byte stream into an ordered
//! event sequence.
//!
//! Providers differ in chunk delivery granularity (one logical `data:` frame
//! may arrive split across any number of physical reads) and in payload shape
//! across services claiming OpenAI compatibility. The relay reassembles
//! frames across chunk boundaries and probes a fixed list of payload shapes,
//! without ever losing, duplicating, or reordering a content fragment.

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use serde_json::{json, Value};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// One normalized event of a relay run.
///
/// A run always emits `Analysis` first, then zero or more `Content` events
/// in upstream arrival order, then exactly one of `Done` or `Error`.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    Analysis {
        life_type: String,
        stability_score: i32,
    },
    Content {
        text: String,
    },
    Done,
    Error {
        message: String,
    },
}

impl RelayEvent {
    /// Caller-facing JSON envelope, tagged by `type`.
    pub fn to_json(&self) -> Value {
        match self {
            RelayEvent::Analysis {
                life_type,
                stability_score,
            } => json!({
                "type": "analysis",
                "life_type": life_type,
                "stability_score": stability_score,
            }),
            RelayEvent::Content { text } => json!({ "type": "content", "content": text }),
            RelayEvent::Done => json!({ "type": "done" }),
            RelayEvent::Error { message } => json!({ "type": "error", "message": message }),
        }
    }
}

// ---------------------------------------------------------------------------
// Frame reassembly
// ---------------------------------------------------------------------------

/// Byte accumulator that re-cuts an arbitrarily chunked stream into lines.
///
/// Buffering happens at the byte level so a multi-byte UTF-8 sequence split
/// across physical chunks still decodes intact; each complete line is decoded
/// best-effort on its own, so invalid bytes degrade that one line only.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completes, in order. The
    /// trailing remainder (a partial line, possibly empty) stays buffered.
    pub fn consume(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line[..pos]).into_owned());
        }
        lines
    }

    /// Hand back whatever is still buffered as one final candidate line.
    /// Covers the case where the very last frame has no trailing newline.
    pub fn flush(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        Some(line)
    }
}

// ---------------------------------------------------------------------------
// Delta extraction
// ---------------------------------------------------------------------------

type Extractor = fn(&Value) -> Option<String>;

fn delta_content(v: &Value) -> Option<String> {
    v["choices"][0]["delta"]["content"].as_str().map(String::from)
}

fn message_content(v: &Value) -> Option<String> {
    v["choices"][0]["message"]["content"]
        .as_str()
        .map(String::from)
}

fn text_content(v: &Value) -> Option<String> {
    v["choices"][0]["text"].as_str().map(String::from)
}

/// Provider payload shapes, probed in order; first match wins.
const CONTENT_EXTRACTORS: &[Extractor] = &[delta_content, message_content, text_content];

/// Strip the SSE `data:` prefix from a line. Returns `None` for blank
/// lines, non-data lines, empty payloads and the `[DONE]` sentinel.
fn frame_payload(line: &str) -> Option<&str> {
    let payload = line.trim().strip_prefix("data:")?.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }
    Some(payload)
}

/// Extract the text delta carried by one complete line, if any.
///
/// Malformed JSON and unknown shapes yield `None` — a single corrupt frame
/// is skipped rather than aborting the relay.
pub fn extract_content(line: &str) -> Option<String> {
    let payload = frame_payload(line)?;
    let v: Value = serde_json::from_str(payload).ok()?;
    CONTENT_EXTRACTORS
        .iter()
        .find_map(|extract| extract(&v))
        .filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Relay loop
// ---------------------------------------------------------------------------

/// Consume one upstream byte stream and send normalized events until it
/// terminates.
///
/// Ends with exactly one `Done` (upstream finished) or one `Error` (a chunk
/// failed mid-stream); never both. A failed send means the caller went away:
/// the loop returns immediately, dropping the upstream stream and releasing
/// its connection.
pub async fn relay_stream<S, E>(mut upstream: S, tx: &mpsc::Sender<RelayEvent>)
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    let mut frames = FrameBuffer::new();

    while let Some(chunk) = upstream.next().await {
        match chunk {
            Ok(bytes) => {
                for line in frames.consume(&bytes) {
                    if let Some(text) = extract_content(&line) {
                        if tx.send(RelayEvent::Content { text }).await.is_err() {
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                tracing::error!("Upstream stream failed mid-read: {}", e);
                let _ = tx
                    .send(RelayEvent::Error {
                        message: e.to_string(),
                    })
                    .await;
                return;
            }
        }
    }

    // An unterminated final frame that never became valid JSON is dropped.
    if let Some(line) = frames.flush() {
        if let Some(text) = extract_content(&line) {
            if tx.send(RelayEvent::Content { text }).await.is_err() {
                return;
            }
        }
    }

    let _ = tx.send(RelayEvent::Done).await;
}
