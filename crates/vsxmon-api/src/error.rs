use thiserror::Error;

/// Top-level error type for the `vsxmon-api` crate.
///
/// Covers every failure mode of a single report request: authentication,
/// transport, non-success HTTP status and body decoding.
/// `vsxmon-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The device rejected the Basic credentials (HTTP 401/403).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Report API ──────────────────────────────────────────────────
    /// The device answered with a non-success status code.
    #[error("Report '{report}' failed (HTTP {status}): {reason}")]
    Status {
        report: String,
        status: u16,
        reason: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the device refused the credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// HTTP status code carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = Error::Status {
            report: "realtime".into(),
            status: 503,
            reason: "Service Unavailable".into(),
        };
        assert!(err.is_transient());
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn client_errors_are_not_transient() {
        let err = Error::Status {
            report: "resource".into(),
            status: 404,
            reason: "Not Found".into(),
        };
        assert!(!err.is_transient());

        let auth = Error::Authentication {
            message: "bad password".into(),
        };
        assert!(!auth.is_transient());
        assert!(auth.is_auth_failure());
    }

    #[test]
    fn rate_limit_is_transient() {
        let err = Error::Status {
            report: "media_server".into(),
            status: 429,
            reason: "Too Many Requests".into(),
        };
        assert!(err.is_transient());
    }
}
