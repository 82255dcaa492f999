//! CLI-specific configuration: applies global flag overrides on top of
//! the shared `vsxmon-config` profiles.

use std::path::PathBuf;

use vsxmon_config::{Config, Profile};
use vsxmon_core::{DeviceConfig, Thresholds};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// A device ready to poll, with everything the evaluator needs.
#[derive(Debug)]
pub struct ResolvedDevice {
    pub profile_name: String,
    pub device: DeviceConfig,
    pub thresholds: Thresholds,
    pub state_file: PathBuf,
}

/// Config file path: `--config` / `VSXMON_CONFIG`, else the platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(vsxmon_config::config_path)
}

/// Load the config file layered with the environment.
pub fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(vsxmon_config::load_config_from(&config_path(global))?)
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Resolve the active profile, applying flag overrides.
///
/// Without a matching profile, `--host` alone is enough to build one.
pub fn resolve_profile(global: &GlobalOpts, config: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, config);

    let mut profile = match (config.profiles.get(&name), &global.host) {
        (Some(profile), _) => profile.clone(),
        (None, Some(host)) => Profile::new(host.clone()),
        (None, None) if config.profiles.is_empty() => {
            return Err(CliError::NoConfig {
                path: config_path(global).display().to_string(),
            });
        }
        (None, None) => {
            return Err(CliError::ProfileNotFound {
                available: config.profiles.keys().cloned().collect::<Vec<_>>().join(", "),
                name,
            });
        }
    };

    if let Some(host) = &global.host {
        profile.host.clone_from(host);
    }
    if let Some(port) = global.port {
        profile.port = port;
    }
    if let Some(proto) = &global.proto {
        profile.proto.clone_from(proto);
    }
    if let Some(username) = &global.username {
        profile.username = Some(username.clone());
    }
    if global.verify_ssl {
        profile.verify_ssl = true;
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }
    if global.window.is_some() {
        profile.window = global.window;
    }

    Ok((name, profile))
}

/// Build everything needed to poll and evaluate the active device.
pub fn resolve_device(global: &GlobalOpts) -> Result<ResolvedDevice, CliError> {
    let config = load_config(global)?;
    let (profile_name, profile) = resolve_profile(global, &config)?;
    let device =
        vsxmon_config::profile_to_device_config(&profile, &profile_name, &config.defaults)?;
    let state_file = vsxmon_config::state_path(&profile, &profile_name);

    tracing::debug!(
        profile = %profile_name,
        url = %device.url,
        window = %device.window,
        "resolved device"
    );

    Ok(ResolvedDevice {
        profile_name,
        device,
        thresholds: profile.thresholds,
        state_file,
    })
}
