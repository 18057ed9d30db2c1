use thiserror::Error;

/// Top-level error type for the `modelfs-api` crate.
///
/// Covers every failure mode across both API surfaces: the REST endpoints
/// and the SSE event channel. `modelfs-core` maps these into user-facing
/// diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Console API ─────────────────────────────────────────────────
    /// Structured error from the console API (parsed from the
    /// `{"error": "..."}` body the server writes on failure).
    #[error("API error (HTTP {status}): {message}")]
    Api { message: String, status: u16 },

    // ── Event channel ───────────────────────────────────────────────
    /// The SSE stream could not be established.
    #[error("event stream connection failed: {0}")]
    StreamConnect(String),

    /// The server rejected the stream request outright.
    #[error("event stream rejected (HTTP {status})")]
    StreamRejected { status: u16 },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::StreamConnect(_) => true,
            Self::Api { status, .. } | Self::StreamRejected { status } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }
}
