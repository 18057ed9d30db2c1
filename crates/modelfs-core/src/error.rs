// ── Core error types ──
//
// User-facing errors from modelfs-core. These are NOT transport-specific --
// consumers never see raw HTTP status codes or JSON parse failures.
// The `From<modelfs_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to console at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{resource} not found: {namespace}/{name}")]
    NotFound {
        resource: String,
        namespace: String,
        name: String,
    },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Tag a raw API error with the resource identity it concerns,
    /// turning a bare 404 into a proper "not found".
    pub fn for_resource(
        err: modelfs_api::Error,
        resource: &str,
        namespace: &str,
        name: &str,
    ) -> Self {
        if err.is_not_found() {
            Self::NotFound {
                resource: resource.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            }
        } else {
            err.into()
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<modelfs_api::Error> for CoreError {
    fn from(err: modelfs_api::Error) -> Self {
        match err {
            modelfs_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            modelfs_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            modelfs_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            modelfs_api::Error::Api { message, status } => CoreError::Api {
                message,
                status: Some(status),
            },
            modelfs_api::Error::StreamConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("event stream connection failed: {reason}"),
            },
            modelfs_api::Error::StreamRejected { status } => CoreError::Api {
                message: "event stream rejected".into(),
                status: Some(status),
            },
            modelfs_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
