//! Shared configuration for vsxmon.
//!
//! TOML device profiles, credential resolution (env + keyring + plaintext),
//! threshold overrides, and translation to `vsxmon_core::DeviceConfig`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vsxmon_core::{
    CoreError, CounterWindow, DeviceConfig, Report, RetryPolicy, Thresholds, TlsVerification,
};

/// Keyring service name; entries are keyed `<profile>/password`.
pub const KEYRING_SERVICE: &str = "vsxmon";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String, available: Vec<String> },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named device profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.into(),
                available: self.profiles.keys().cloned().collect(),
            })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Retries per report after the first attempt.
    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default)]
    pub window: CounterWindow,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            retries: default_retries(),
            window: CounterWindow::default(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    10
}
fn default_retries() -> u32 {
    3
}

/// One VSX device.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Hostname or IP address of the VSX.
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// `https` or `http`.
    #[serde(default = "default_proto")]
    pub proto: String,

    pub username: Option<String>,

    /// Password (plaintext, prefer keyring or `password_env`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable holding the password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Reports to request. Unlisted reports are reported as "no data".
    #[serde(default = "default_sections")]
    pub sections: Vec<Report>,

    /// Verify the device certificate. Off by default: VSX units ship
    /// with a self-signed certificate.
    #[serde(default)]
    pub verify_ssl: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<CounterWindow>,

    /// Where previous samples are kept between runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,

    #[serde(default)]
    pub thresholds: Thresholds,
}

impl Profile {
    /// Profile with defaults for everything but the host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            proto: default_proto(),
            username: None,
            password: None,
            password_env: None,
            sections: default_sections(),
            verify_ssl: false,
            ca_cert: None,
            timeout: None,
            retries: None,
            window: None,
            state_file: None,
            thresholds: Thresholds::default(),
        }
    }

    /// Base URL of the statistics API.
    pub fn url(&self) -> Result<url::Url, ConfigError> {
        let proto = self.proto.to_ascii_lowercase();
        if proto != "https" && proto != "http" {
            return Err(ConfigError::Validation {
                field: "proto".into(),
                reason: format!("expected 'https' or 'http', got '{}'", self.proto),
            });
        }
        let raw = format!("{proto}://{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::Validation {
            field: "host".into(),
            reason: format!("invalid device address: {raw}"),
        })
    }
}

fn default_port() -> u16 {
    8888
}
fn default_proto() -> String {
    "https".into()
}
fn default_sections() -> Vec<Report> {
    Report::ALL.to_vec()
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "vsxmon")
}

fn home_fallback(parts: &[&str]) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.extend(parts);
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(&[".config", "vsxmon", "config.toml"]),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Sample-store file for a profile: `state_file` if set, otherwise one
/// file per profile under the platform data directory.
pub fn state_path(profile: &Profile, profile_name: &str) -> PathBuf {
    if let Some(path) = &profile.state_file {
        return path.clone();
    }
    let file = format!("{profile_name}.json");
    project_dirs().map_or_else(
        || home_fallback(&[".local", "share", "vsxmon", "state", file.as_str()]),
        |dirs| dirs.data_dir().join("state").join(&file),
    )
}

// ── Loading / saving ────────────────────────────────────────────────

/// Load the config at the canonical path, layered with the environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load defaults, then `path` (if it exists), then `VSXMON_*` variables
/// (`VSXMON_DEFAULTS__TIMEOUT=30`). Threshold overrides are validated here.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(
            Env::prefixed("VSXMON_")
                .ignore(&["config", "profile", "username", "password"])
                .split("__"),
        );

    let config: Config = figment.extract()?;
    validate(&config)?;
    Ok(config)
}

/// Reject profiles whose thresholds break the warn/crit ordering.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    for (name, profile) in &config.profiles {
        if profile.sections.is_empty() {
            return Err(ConfigError::Validation {
                field: format!("profiles.{name}.sections"),
                reason: "at least one report must be selected".into(),
            });
        }
        profile.thresholds.validate().map_err(|e| match e {
            CoreError::InvalidLevels { metric, reason } => ConfigError::Validation {
                field: format!("profiles.{name}.thresholds.{metric}"),
                reason,
            },
            other => ConfigError::Validation {
                field: format!("profiles.{name}.thresholds"),
                reason: other.to_string(),
            },
        })?;
    }
    Ok(())
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credentials ─────────────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

/// Resolve username and password for a profile.
///
/// The password comes from, in order: the profile's `password_env`
/// variable, `VSXMON_PASSWORD`, the system keyring, plaintext config.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<(String, SecretString), ConfigError> {
    let no_credentials = || ConfigError::NoCredentials {
        profile: profile_name.into(),
    };

    let username = profile
        .username
        .clone()
        .or_else(|| std::env::var("VSXMON_USERNAME").ok())
        .ok_or_else(no_credentials)?;

    if let Some(pw) = profile
        .password_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
    {
        return Ok((username, SecretString::from(pw)));
    }

    if let Ok(pw) = std::env::var("VSXMON_PASSWORD") {
        return Ok((username, SecretString::from(pw)));
    }

    if let Some(pw) = keyring_entry(profile_name)
        .ok()
        .and_then(|entry| entry.get_password().ok())
    {
        return Ok((username, SecretString::from(pw)));
    }

    if let Some(pw) = &profile.password {
        return Ok((username, SecretString::from(pw.clone())));
    }

    Err(no_credentials())
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?
        .set_password(password)
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

// ── Translation ─────────────────────────────────────────────────────

/// TLS mode for a profile.
pub fn tls_verification(profile: &Profile) -> TlsVerification {
    if !profile.verify_ssl {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ca) = &profile.ca_cert {
        TlsVerification::CustomCa(ca.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Build a `DeviceConfig` from a profile, filling gaps from `defaults`.
pub fn profile_to_device_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<DeviceConfig, ConfigError> {
    let url = profile.url()?;
    let (username, password) = resolve_credentials(profile, profile_name)?;

    let mut config = DeviceConfig::new(url, username, password);
    config.tls = tls_verification(profile);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.retry = RetryPolicy {
        retries: profile.retries.unwrap_or(defaults.retries),
        ..RetryPolicy::default()
    };
    config.sections = profile.sections.iter().copied().collect::<BTreeSet<_>>();
    config.window = profile.window.unwrap_or(defaults.window);
    Ok(config)
}
