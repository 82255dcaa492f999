//! Command handlers.

pub mod check;
pub mod config_cmd;
pub mod discover;
pub mod dump;

use vsxmon_core::{Polled, Poller};

use crate::config::ResolvedDevice;
use crate::error::CliError;

/// Poll the resolved device once, returning the poller for its config.
pub async fn poll_device(resolved: &ResolvedDevice) -> Result<(Poller, Polled), CliError> {
    let poller = Poller::new(resolved.device.clone())?;
    let polled = poller.poll().await;
    for failure in &polled.failures {
        tracing::debug!(%failure, "section unavailable this cycle");
    }
    Ok((poller, polled))
}
