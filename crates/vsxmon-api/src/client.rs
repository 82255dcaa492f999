// Report API HTTP client
//
// Wraps `reqwest::Client` with VSX-specific URL construction, Basic auth,
// per-report retries and status mapping. Every report is a plain JSON
// document; the client hands back `serde_json::Value` and leaves shape
// handling to `vsxmon-core`.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::report::Report;
use crate::transport::TransportConfig;

/// Path prefix shared by all statistics reports.
const STATS_PREFIX: &str = "SSConfig/webresources/stats";

/// How often a single report is retried after a transient failure.
///
/// Retries apply per report: a flaky `realtime` endpoint never consumes
/// the budget of `resource`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub retries: u32,
    /// Base delay; attempt `n` waits `n * backoff` before retrying.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Raw HTTP client for a VSX statistics API.
pub struct VsxClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
    timeout: Duration,
    retry: RetryPolicy,
}

impl VsxClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// The `base_url` is the device root including the API port,
    /// e.g. `https://10.0.0.5:8888`.
    pub fn new(
        base_url: Url,
        username: String,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            username,
            password,
            timeout: transport.timeout,
            retry: RetryPolicy::default(),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        username: String,
        password: SecretString,
    ) -> Self {
        Self {
            http,
            base_url,
            username,
            password,
            timeout: TransportConfig::default().timeout,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The device base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build the full URL for a report:
    /// `{base}/SSConfig/webresources/stats/{report}?format=json`
    pub fn report_url(&self, report: Report) -> Result<Url, Error> {
        let full = format!(
            "{}/{STATS_PREFIX}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            report.path()
        );
        let mut url = Url::parse(&full)?;
        url.query_pairs_mut().append_pair("format", "json");
        Ok(url)
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Fetch one report, retrying transient failures per the retry policy.
    pub async fn fetch_report(&self, report: Report) -> Result<Value, Error> {
        let attempts = self.retry.retries.saturating_add(1);
        let mut attempt: u32 = 1;
        loop {
            match self.fetch_once(report).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < attempts => {
                    warn!(%report, attempt, error = %err, "report fetch failed, retrying");
                    tokio::time::sleep(self.retry.backoff.saturating_mul(attempt)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Send a single authenticated GET for a report, without retries.
    pub async fn fetch_once(&self, report: Report) -> Result<Value, Error> {
        let url = self.report_url(report)?;
        debug!(%report, "GET {}", url);

        let resp = self
            .http
            .get(url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        Self::parse_response(report, resp).await
    }

    /// Map the HTTP status and decode the JSON body.
    async fn parse_response(report: Report, resp: reqwest::Response) -> Result<Value, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                message: format!("device refused credentials for '{report}' ({status})"),
            });
        }

        if !status.is_success() {
            return Err(Error::Status {
                report: report.to_string(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_owned(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    fn map_transport(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> VsxClient {
        VsxClient::with_client(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            "monitor".into(),
            SecretString::from("secret".to_string()),
        )
    }

    #[test]
    fn report_url_includes_prefix_and_format() {
        let c = client("https://10.0.0.5:8888");
        let url = c.report_url(Report::MediaServer).unwrap();
        assert_eq!(
            url.as_str(),
            "https://10.0.0.5:8888/SSConfig/webresources/stats/media_server?format=json"
        );
    }

    #[test]
    fn report_url_tolerates_trailing_slash() {
        let c = client("http://vsx.example.net:8080/");
        let url = c.report_url(Report::Realtime).unwrap();
        assert_eq!(url.path(), "/SSConfig/webresources/stats/realtime");
    }
}
