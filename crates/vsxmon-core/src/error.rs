// ── Core error types ──
//
// User-facing errors from vsxmon-core. Data problems in fetched documents
// are never errors here: they are absorbed into "no data" sections and
// UNKNOWN results. What remains is transport, configuration and state
// persistence.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to VSX at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("VSX connection timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Upstream errors (wrapped, not exposed raw) ───────────────────
    #[error("Report error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid levels for {metric}: {reason}")]
    InvalidLevels { metric: String, reason: String },

    // ── Sample store errors ──────────────────────────────────────────
    #[error("Sample store error at {path}: {message}")]
    SampleStore { path: String, message: String },

    #[error("Sample '{key}' was already written in this cycle")]
    DuplicateSampleWrite { key: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<vsxmon_api::Error> for CoreError {
    fn from(err: vsxmon_api::Error) -> Self {
        match err {
            vsxmon_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            vsxmon_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
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
            vsxmon_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            vsxmon_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            vsxmon_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            vsxmon_api::Error::Status {
                report,
                status,
                reason,
            } => CoreError::Api {
                message: format!("'{report}' report returned {status} {reason}"),
                status: Some(status),
            },
            vsxmon_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("Failed to parse report body: {message}"),
                status: None,
            },
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::SampleStore {
            path: String::new(),
            message: err.to_string(),
        }
    }
}
