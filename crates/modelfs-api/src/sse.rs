//! SSE event channel with auto-reconnect.
//!
//! Opens the console's `/api/sse` endpoint for one namespace and streams
//! decoded [`StreamEvent`]s through a [`tokio::sync::broadcast`] channel.
//! Handles reconnection with exponential backoff + jitter automatically.
//!
//! The server frames records two ways: unlabelled (`message`) or labelled
//! with the action name (`added` / `modified` / `deleted`). Both carry the
//! same `{resource, action, payload}` JSON and both decode through the
//! same dispatch path. Malformed frames are dropped per-frame -- they
//! never tear down the channel or reach subscribers as errors.
//!
//! # Example
//!
//! ```rust,ignore
//! use modelfs_api::sse::{EventChannel, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let handle = EventChannel::attach(sse_url, ReconnectConfig::default(), cancel, &transport);
//! let mut rx = handle.subscribe();
//!
//! while let Ok(event) = rx.recv().await {
//!     println!("{}/{}", event.payload.namespace(), event.payload.name());
//! }
//!
//! handle.shutdown();
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::StreamEvent;

// ── Broadcast channel capacity ───────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Event names the server uses as alternate framing. The default
/// unlabelled frame arrives as `message`.
const DISPATCHED_EVENTS: [&str; 4] = ["message", "added", "modified", "deleted"];

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for stream reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── EventChannel / handle ────────────────────────────────────────────

/// Namespace-scoped event channel. Construct via [`EventChannel::attach`].
pub struct EventChannel;

/// Handle to a running event stream.
///
/// Releasing the channel is [`shutdown`](EventChannelHandle::shutdown) --
/// idempotent, safe to call any number of times. Dropping the handle
/// without calling it leaves the background task to the parent
/// cancellation token.
pub struct EventChannelHandle {
    event_rx: broadcast::Receiver<Arc<StreamEvent>>,
    cancel: CancellationToken,
}

impl EventChannel {
    /// Open the stream at `sse_url` and spawn the reconnection loop.
    ///
    /// Returns immediately; the first connection attempt happens
    /// asynchronously. This never fails: if the stream client cannot be
    /// built at all, the channel degrades to an inert handle and the
    /// mirror runs snapshot-only.
    pub fn attach(
        sse_url: Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
        transport: &TransportConfig,
    ) -> EventChannelHandle {
        let http = match transport.build_stream_client() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %e, "event stream unavailable, running snapshot-only");
                return EventChannelHandle::disabled();
            }
        };

        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            sse_loop(http, sse_url, event_tx, reconnect, task_cancel).await;
        });

        EventChannelHandle { event_rx, cancel }
    }
}

impl EventChannelHandle {
    /// An inert handle: no connection, no events, `shutdown` is a no-op.
    pub fn disabled() -> Self {
        let (event_tx, event_rx) = broadcast::channel(1);
        drop(event_tx);
        Self {
            event_rx,
            cancel: CancellationToken::new(),
        }
    }

    /// Get a new broadcast receiver for the event stream.
    ///
    /// Multiple consumers can subscribe concurrently. If a consumer falls
    /// behind, it receives [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<StreamEvent>> {
        self.event_rx.resubscribe()
    }

    /// Release the channel: close the connection and stop the background
    /// task. Idempotent.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on error, backoff → reconnect.
async fn sse_loop(
    http: reqwest::Client,
    sse_url: Url,
    event_tx: broadcast::Sender<Arc<StreamEvent>>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&http, &sse_url, &event_tx, &cancel) => {
                match result {
                    // Clean disconnect (server ended the response).
                    // Reset attempt counter and reconnect immediately.
                    Ok(()) => {
                        tracing::info!("event stream ended cleanly, reconnecting");
                        attempt = 0;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "event stream error");

                        if let Some(max) = reconnect.max_retries {
                            if attempt >= max {
                                tracing::error!(
                                    max_retries = max,
                                    "event stream reconnection limit reached, giving up"
                                );
                                break;
                            }
                        }

                        let delay = calculate_backoff(attempt, &reconnect);
                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(delay) => {}
                        }

                        attempt += 1;
                    }
                }
            }
        }
    }

    tracing::debug!("event stream loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish a single stream connection, read frames until it drops.
async fn connect_and_read(
    http: &reqwest::Client,
    url: &Url,
    event_tx: &broadcast::Sender<Arc<StreamEvent>>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::debug!(url = %url, "connecting to event stream");

    let resp = http
        .get(url.clone())
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await
        .map_err(|e| Error::StreamConnect(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(Error::StreamRejected {
            status: status.as_u16(),
        });
    }

    tracing::debug!("event stream connected");

    let mut parser = FrameParser::new();
    let mut body = resp.bytes_stream();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            chunk = body.next() => {
                match chunk {
                    Some(Ok(bytes)) => {
                        for frame in parser.push(&bytes) {
                            dispatch_frame(&frame, event_tx);
                        }
                    }
                    Some(Err(e)) => {
                        return Err(Error::StreamConnect(e.to_string()));
                    }
                    None => {
                        // Response body ended without error.
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Decode one frame and broadcast it. Undecodable frames are dropped.
fn dispatch_frame(frame: &SseFrame, event_tx: &broadcast::Sender<Arc<StreamEvent>>) {
    if !DISPATCHED_EVENTS.contains(&frame.event.as_str()) {
        tracing::debug!(event = %frame.event, "ignoring unrecognized stream event name");
        return;
    }

    match StreamEvent::decode(&frame.data) {
        Some(event) => {
            // Ignore send errors -- just means no active subscribers right now
            let _ = event_tx.send(Arc::new(event));
        }
        None => {
            tracing::debug!(data = %frame.data, "dropping undecodable event frame");
        }
    }
}

// ── SSE framing ──────────────────────────────────────────────────────

/// One parsed SSE record: the event name (`message` when unlabelled) and
/// the joined data payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SseFrame {
    pub(crate) event: String,
    pub(crate) data: String,
}

/// Incremental parser for the `text/event-stream` wire format.
///
/// Records are separated by a blank line; fields are `name: value` lines.
/// Only `event` and `data` are meaningful here (`id` and `retry` are
/// ignored, `:` lines are comments/keepalives). Bytes are buffered so a
/// record -- or a UTF-8 sequence -- split across chunks reassembles
/// correctly.
pub(crate) struct FrameParser {
    buf: Vec<u8>,
}

impl FrameParser {
    pub(crate) fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Feed a chunk of bytes, returning every record completed by it.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some((record, rest_at)) = next_record(&self.buf) {
            if let Some(frame) = parse_record(&record) {
                frames.push(frame);
            }
            self.buf.drain(..rest_at);
        }
        frames
    }
}

/// Find the first complete record in `buf`.
///
/// Returns the record bytes and the offset just past its terminating
/// blank line. Handles both `\n\n` and `\r\n\r\n` terminators.
fn next_record(buf: &[u8]) -> Option<(Vec<u8>, usize)> {
    let lf = find_subsequence(buf, b"\n\n").map(|i| (i, i + 2));
    let crlf = find_subsequence(buf, b"\r\n\r\n").map(|i| (i, i + 4));

    let (end, next) = match (lf, crlf) {
        (Some(a), Some(b)) if b.0 < a.0 => b,
        (Some(a), _) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };

    Some((buf[..end].to_vec(), next))
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Parse a complete record's field lines into a frame.
///
/// Returns `None` for records with no data (comment-only keepalives).
fn parse_record(record: &[u8]) -> Option<SseFrame> {
    let text = String::from_utf8_lossy(record);

    let mut event = String::from("message");
    let mut data_lines: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() || line.starts_with(':') {
            continue;
        }

        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };

        match field {
            "event" => event = value.to_string(),
            "data" => data_lines.push(value),
            // `id` and `retry` carry no information for this channel
            _ => {}
        }
    }

    if data_lines.is_empty() {
        return None;
    }

    Some(SseFrame {
        event,
        data: data_lines.join("\n"),
    })
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25% to spread out reconnection storms from multiple clients.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    #[allow(clippy::cast_possible_wrap)]
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(attempt as i32);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    // Not cryptographically random, but good enough for backoff spread.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{EventAction, ResourcePayload};

    fn model_frame_json(name: &str, action: &str) -> String {
        format!(
            r#"{{"resource":"models","action":"{action}","payload":{{"name":"{name}","namespace":"ns1","sourceRef":"src","versionsReady":0,"versionsTotal":1,"lastSyncTime":"2026-05-01T10:00:00Z","status":"PENDING"}}}}"#
        )
    }

    #[test]
    fn default_reconnect_config() {
        let config = ReconnectConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert!(config.max_retries.is_none());
    }

    #[test]
    fn backoff_increases_exponentially() {
        let config = ReconnectConfig::default();

        let d0 = calculate_backoff(0, &config);
        let d1 = calculate_backoff(1, &config);
        let d2 = calculate_backoff(2, &config);

        assert!(d1 > d0, "d1 ({d1:?}) should be greater than d0 ({d0:?})");
        assert!(d2 > d1, "d2 ({d2:?}) should be greater than d1 ({d1:?})");
    }

    #[test]
    fn backoff_caps_at_max_delay() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_retries: None,
        };

        let d10 = calculate_backoff(10, &config);
        // With jitter factor up to 1.25, max effective is 12.5s
        assert!(
            d10 <= Duration::from_secs(13),
            "delay at attempt 10 ({d10:?}) should be capped near max_delay"
        );
    }

    #[test]
    fn parser_single_record() {
        let mut parser = FrameParser::new();
        let frames = parser.push(b"data: {\"a\":1}\n\n");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "message");
        assert_eq!(frames[0].data, "{\"a\":1}");
    }

    #[test]
    fn parser_labelled_record() {
        let mut parser = FrameParser::new();
        let frames = parser.push(b"event: deleted\ndata: {\"a\":1}\n\n");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "deleted");
    }

    #[test]
    fn parser_record_split_across_chunks() {
        let mut parser = FrameParser::new();

        assert!(parser.push(b"event: modi").is_empty());
        assert!(parser.push(b"fied\ndata: {\"a\"").is_empty());
        let frames = parser.push(b":1}\n\n");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "modified");
        assert_eq!(frames[0].data, "{\"a\":1}");
    }

    #[test]
    fn parser_multiple_records_in_one_chunk() {
        let mut parser = FrameParser::new();
        let frames = parser.push(b"data: one\n\ndata: two\n\n");

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data, "one");
        assert_eq!(frames[1].data, "two");
    }

    #[test]
    fn parser_crlf_line_endings() {
        let mut parser = FrameParser::new();
        let frames = parser.push(b"event: added\r\ndata: {\"a\":1}\r\n\r\n");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "added");
        assert_eq!(frames[0].data, "{\"a\":1}");
    }

    #[test]
    fn parser_joins_multi_line_data() {
        let mut parser = FrameParser::new();
        let frames = parser.push(b"data: {\ndata: }\n\n");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "{\n}");
    }

    #[test]
    fn parser_skips_comment_keepalives() {
        let mut parser = FrameParser::new();
        let frames = parser.push(b": keepalive\n\ndata: real\n\n");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "real");
    }

    #[test]
    fn dispatch_labelled_and_unlabelled_share_one_path() {
        let (tx, mut rx) = broadcast::channel(16);

        let json = model_frame_json("m1", "added");
        dispatch_frame(
            &SseFrame {
                event: "message".into(),
                data: json.clone(),
            },
            &tx,
        );
        dispatch_frame(
            &SseFrame {
                event: "added".into(),
                data: json,
            },
            &tx,
        );

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first.action, EventAction::Added);
        assert_eq!(second.action, EventAction::Added);
        assert!(matches!(first.payload, ResourcePayload::Model(_)));
    }

    #[test]
    fn dispatch_drops_malformed_data() {
        let (tx, mut rx) = broadcast::channel::<Arc<StreamEvent>>(16);

        dispatch_frame(
            &SseFrame {
                event: "message".into(),
                data: "not json at all".into(),
            },
            &tx,
        );

        // Should not panic, should just log and skip
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dispatch_ignores_unknown_event_names() {
        let (tx, mut rx) = broadcast::channel::<Arc<StreamEvent>>(16);

        dispatch_frame(
            &SseFrame {
                event: "heartbeat".into(),
                data: model_frame_json("m1", "added"),
            },
            &tx,
        );

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn disabled_handle_is_inert() {
        let handle = EventChannelHandle::disabled();

        // shutdown is a no-op and callable repeatedly
        handle.shutdown();
        handle.shutdown();

        let mut rx = handle.subscribe();
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Closed)
        ));
    }
}
