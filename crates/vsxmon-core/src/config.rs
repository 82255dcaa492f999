// ── Runtime device configuration ──
//
// These types describe *how* to reach one VSX and which reports to pull.
// They carry credential data and connection tuning, but never touch disk.
// The CLI resolves a profile into a `DeviceConfig` and hands it in.

use std::collections::BTreeSet;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;
use vsxmon_api::{Report, RetryPolicy, TlsMode, TransportConfig};

use crate::calculate::CounterWindow;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs). Default: most VSX units ship
    /// with a self-signed certificate on the API port.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for polling a single device.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Device root including the API port, e.g. `https://10.0.0.5:8888`.
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Reports to request. Unselected reports count as "no data".
    pub sections: BTreeSet<Report>,
    /// Counter window the calculator reads.
    pub window: CounterWindow,
}

impl DeviceConfig {
    /// Config with defaults for everything but the endpoint and credentials.
    pub fn new(url: Url, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            url,
            username: username.into(),
            password,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            sections: Report::ALL.into_iter().collect(),
            window: CounterWindow::default(),
        }
    }

    /// Stable scope for sample-store keys: the device host, or the full URL
    /// when it has no host component.
    pub fn scope(&self) -> String {
        self.url
            .host_str()
            .map_or_else(|| self.url.to_string(), str::to_owned)
    }

    pub fn wants(&self, report: Report) -> bool {
        self.sections.contains(&report)
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}
