/// Relay tests — frame reassembly across arbitrary chunk boundaries,
/// per-frame fault tolerance, and terminal-event ordering.

use bytes::Bytes;
use futures::stream;
use ifline_server::services::relay::{extract_content, relay_stream, FrameBuffer, RelayEvent};
use tokio::sync::mpsc;

/// Run the relay over an in-memory chunk sequence and collect every event.
async fn run_relay(chunks: Vec<Result<Bytes, String>>) -> Vec<RelayEvent> {
    let (tx, mut rx) = mpsc::channel::<RelayEvent>(64);
    let upstream = stream::iter(chunks);

    tokio::spawn(async move {
        relay_stream(upstream, &tx).await;
    });

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

fn ok(bytes: &[u8]) -> Result<Bytes, String> {
    Ok(Bytes::copy_from_slice(bytes))
}

fn delta_frame(content: &str) -> String {
    format!("data: {{\"choices\":[{{\"delta\":{{\"content\":\"{content}\"}}}}]}}\n\n")
}

fn contents(events: &[RelayEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            RelayEvent::Content { text } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Frame reassembly
// ---------------------------------------------------------------------------

#[cfg(test)]
mod reassembly_tests {
    use super::*;

    #[tokio::test]
    async fn test_single_chunk_stream() {
        let payload = format!("{}{}data: [DONE]\n\n", delta_frame("你好"), delta_frame("，世界"));
        let events = run_relay(vec![ok(payload.as_bytes())]).await;

        assert_eq!(contents(&events), vec!["你好", "，世界"]);
        assert_eq!(events.last(), Some(&RelayEvent::Done));
    }

    #[tokio::test]
    async fn test_byte_at_a_time_matches_single_chunk() {
        // Multi-byte UTF-8 content so chunk cuts land mid-character.
        let payload = format!(
            "{}{}{}data: [DONE]\n\n",
            delta_frame("他抬起头"),
            delta_frame("，望向窗外"),
            delta_frame("。")
        );

        let whole = run_relay(vec![ok(payload.as_bytes())]).await;
        let bytewise = run_relay(
            payload
                .as_bytes()
                .iter()
                .map(|b| ok(std::slice::from_ref(b)))
                .collect(),
        )
        .await;

        assert_eq!(whole, bytewise);
        assert_eq!(contents(&whole), vec!["他抬起头", "，望向窗外", "。"]);
    }

    #[tokio::test]
    async fn test_frame_split_across_chunks() {
        let frame = delta_frame("第一章");
        let (head, tail) = frame.as_bytes().split_at(17);
        let events = run_relay(vec![ok(head), ok(tail)]).await;

        assert_eq!(contents(&events), vec!["第一章"]);
        assert_eq!(events.last(), Some(&RelayEvent::Done));
    }

    #[tokio::test]
    async fn test_trailing_frame_without_newline_is_flushed() {
        let payload = format!(
            "{}data: {{\"choices\":[{{\"delta\":{{\"content\":\"尾声\"}}}}]}}",
            delta_frame("开头")
        );
        let events = run_relay(vec![ok(payload.as_bytes())]).await;

        assert_eq!(contents(&events), vec!["开头", "尾声"]);
        assert_eq!(events.last(), Some(&RelayEvent::Done));
    }

    #[tokio::test]
    async fn test_crlf_line_endings() {
        let payload = "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\r\n\r\n";
        let events = run_relay(vec![ok(payload.as_bytes())]).await;
        assert_eq!(contents(&events), vec!["ok"]);
    }
}

// ---------------------------------------------------------------------------
// Fault tolerance
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tolerance_tests {
    use super::*;

    #[tokio::test]
    async fn test_malformed_frame_between_valid_frames_is_swallowed() {
        let payload = format!(
            "{}data: {{\"choices\":[{{\"delt\n{}",
            delta_frame("前"),
            delta_frame("后")
        );
        let events = run_relay(vec![ok(payload.as_bytes())]).await;

        assert_eq!(contents(&events), vec!["前", "后"]);
        assert!(
            !events.iter().any(|e| matches!(e, RelayEvent::Error { .. })),
            "one corrupt frame must not poison the stream"
        );
        assert_eq!(events.last(), Some(&RelayEvent::Done));
    }

    #[tokio::test]
    async fn test_stream_cut_mid_frame_drops_the_partial_frame() {
        // Upstream closes while a frame is still incomplete: the buffered
        // tail never becomes valid JSON and is silently dropped.
        let payload = format!("{}data: {{\"choices\":[{{\"delt", delta_frame("Hel"));
        let events = run_relay(vec![ok(payload.as_bytes())]).await;

        assert_eq!(contents(&events), vec!["Hel"]);
        assert_eq!(events.last(), Some(&RelayEvent::Done));
    }

    #[tokio::test]
    async fn test_noise_lines_produce_no_events() {
        let payload = "\n: keep-alive comment\nevent: ping\ndata:\ndata: [DONE]\n\n";
        let events = run_relay(vec![ok(payload.as_bytes())]).await;
        assert_eq!(events, vec![RelayEvent::Done]);
    }

    #[tokio::test]
    async fn test_shape_miss_yields_no_content() {
        let payload = "data: {\"choices\":[{\"finish_reason\":\"stop\"}]}\n\n";
        let events = run_relay(vec![ok(payload.as_bytes())]).await;
        assert_eq!(events, vec![RelayEvent::Done]);
    }
}

// ---------------------------------------------------------------------------
// Terminal events
// ---------------------------------------------------------------------------

#[cfg(test)]
mod terminal_tests {
    use super::*;

    #[tokio::test]
    async fn test_exactly_one_done_on_success() {
        let payload = format!("{}data: [DONE]\n\n", delta_frame("全文"));
        let events = run_relay(vec![ok(payload.as_bytes())]).await;

        let terminals = events
            .iter()
            .filter(|e| matches!(e, RelayEvent::Done | RelayEvent::Error { .. }))
            .count();
        assert_eq!(terminals, 1);
        assert_eq!(events.last(), Some(&RelayEvent::Done));
    }

    #[tokio::test]
    async fn test_chunk_error_terminates_with_error_and_no_done() {
        let events = run_relay(vec![
            ok(delta_frame("一半").as_bytes()),
            Err("connection reset by peer".into()),
        ])
        .await;

        assert_eq!(contents(&events), vec!["一半"]);
        assert_eq!(
            events.last(),
            Some(&RelayEvent::Error {
                message: "connection reset by peer".into()
            })
        );
        assert!(!events.contains(&RelayEvent::Done), "no Done after Error");
    }

    #[tokio::test]
    async fn test_no_content_after_terminal_event() {
        let events = run_relay(vec![
            ok(delta_frame("之前").as_bytes()),
            Err("boom".into()),
            ok(delta_frame("之后").as_bytes()),
        ])
        .await;

        assert_eq!(contents(&events), vec!["之前"]);
        assert!(matches!(events.last(), Some(RelayEvent::Error { .. })));
    }

    #[tokio::test]
    async fn test_dropped_receiver_stops_the_relay() {
        // A closed client side must abort consumption instead of hanging.
        let (tx, rx) = mpsc::channel::<RelayEvent>(1);
        drop(rx);

        let payload = format!("{}{}", delta_frame("一"), delta_frame("二"));
        let upstream = stream::iter(vec![ok(payload.as_bytes())]);
        relay_stream(upstream, &tx).await;
    }
}

// ---------------------------------------------------------------------------
// Extraction fallback chain
// ---------------------------------------------------------------------------

#[cfg(test)]
mod extraction_tests {
    use super::*;

    #[test]
    fn test_delta_content_shape() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"增量\"}}]}";
        assert_eq!(extract_content(line), Some("增量".into()));
    }

    #[test]
    fn test_message_content_shape() {
        let line = "data: {\"choices\":[{\"message\":{\"content\":\"整段\"}}]}";
        assert_eq!(extract_content(line), Some("整段".into()));
    }

    #[test]
    fn test_text_shape() {
        let line = "data: {\"choices\":[{\"text\":\"旧式\"}]}";
        assert_eq!(extract_content(line), Some("旧式".into()));
    }

    #[test]
    fn test_delta_takes_precedence() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"新\"},\"message\":{\"content\":\"旧\"}}]}";
        assert_eq!(extract_content(line), Some("新".into()));
    }

    #[test]
    fn test_empty_content_is_no_content() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}";
        assert_eq!(extract_content(line), None);
    }

    #[test]
    fn test_done_sentinel_and_non_data_lines() {
        assert_eq!(extract_content("data: [DONE]"), None);
        assert_eq!(extract_content("event: ping"), None);
        assert_eq!(extract_content(": comment"), None);
        assert_eq!(extract_content(""), None);
    }

    #[test]
    fn test_prefix_without_space_is_accepted() {
        let line = "data:{\"choices\":[{\"delta\":{\"content\":\"紧凑\"}}]}";
        assert_eq!(extract_content(line), Some("紧凑".into()));
    }
}

// ---------------------------------------------------------------------------
// FrameBuffer
// ---------------------------------------------------------------------------

#[cfg(test)]
mod frame_buffer_tests {
    use super::*;

    #[test]
    fn test_consume_returns_only_complete_lines() {
        let mut buf = FrameBuffer::new();
        assert!(buf.consume(b"data: par").is_empty());
        assert_eq!(buf.consume(b"tial\ndata: next"), vec!["data: partial"]);
        assert_eq!(buf.flush(), Some("data: next".to_string()));
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let mut buf = FrameBuffer::new();
        let bytes = "好\n".as_bytes();
        assert!(buf.consume(&bytes[..1]).is_empty());
        assert!(buf.consume(&bytes[1..2]).is_empty());
        assert_eq!(buf.consume(&bytes[2..]), vec!["好"]);
    }

    #[test]
    fn test_several_lines_in_one_chunk() {
        let mut buf = FrameBuffer::new();
        assert_eq!(buf.consume(b"a\nb\nc\n"), vec!["a", "b", "c"]);
        assert_eq!(buf.flush(), None);
    }

    #[test]
    fn test_flush_drains_the_buffer() {
        let mut buf = FrameBuffer::new();
        buf.consume(b"tail");
        assert_eq!(buf.flush(), Some("tail".to_string()));
        assert_eq!(buf.flush(), None);
    }
}
