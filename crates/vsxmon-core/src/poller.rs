// ── Poll cycle ──
//
// One cycle = fetch the selected reports concurrently, wait for all of
// them, then normalize, merge and derive. A failed report only removes its
// own section from the result.

use std::fmt;

use serde_json::Value;
use tracing::{debug, info, warn};
use vsxmon_api::{Report, VsxClient};

use crate::calculate::{CounterWindow, calculate};
use crate::config::DeviceConfig;
use crate::error::CoreError;
use crate::merge::merge;
use crate::model::{DeviceMetrics, DeviceSnapshot, RawSections};
use crate::normalize::normalize;

/// A report request that failed this cycle.
#[derive(Debug)]
pub struct FetchFailure {
    pub report: Report,
    pub error: CoreError,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.report, self.error)
    }
}

/// Raw documents of one cycle plus the requests that failed.
#[derive(Debug, Default)]
pub struct Fetched {
    pub raw: RawSections,
    pub failures: Vec<FetchFailure>,
}

/// Derived metrics of one cycle plus the requests that failed.
#[derive(Debug, Default)]
pub struct Polled {
    pub metrics: DeviceMetrics,
    pub failures: Vec<FetchFailure>,
}

/// Polls one device.
pub struct Poller {
    client: VsxClient,
    config: DeviceConfig,
}

impl Poller {
    pub fn new(config: DeviceConfig) -> Result<Self, CoreError> {
        let client = VsxClient::new(
            config.url.clone(),
            config.username.clone(),
            config.password.clone(),
            &config.transport(),
        )?
        .with_retry(config.retry);
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Request every selected report concurrently and wait for all of them.
    pub async fn fetch(&self) -> Fetched {
        let (resource, realtime, media_server) = tokio::join!(
            self.fetch_section(Report::Resource),
            self.fetch_section(Report::Realtime),
            self.fetch_section(Report::MediaServer),
        );

        let mut fetched = Fetched::default();
        fetched.raw.resource = absorb(Report::Resource, resource, &mut fetched.failures);
        fetched.raw.realtime = absorb(Report::Realtime, realtime, &mut fetched.failures);
        fetched.raw.media_server =
            absorb(Report::MediaServer, media_server, &mut fetched.failures);
        fetched
    }

    /// Run a full cycle against the device.
    pub async fn poll(&self) -> Polled {
        let Fetched { raw, failures } = self.fetch().await;
        let metrics = build_metrics(&raw, self.config.window);
        info!(
            device = %self.config.scope(),
            trunks = metrics.trunks.as_ref().map_or(0, std::collections::BTreeMap::len),
            media_servers = metrics.media_servers.as_ref().map_or(0, Vec::len),
            failed = failures.len(),
            "poll cycle complete"
        );
        Polled { metrics, failures }
    }

    async fn fetch_section(&self, report: Report) -> Result<Option<Value>, CoreError> {
        if !self.config.wants(report) {
            debug!(%report, "report not selected");
            return Ok(None);
        }
        let value = self.client.fetch_report(report).await?;
        Ok(Some(value))
    }
}

fn absorb(
    report: Report,
    result: Result<Option<Value>, CoreError>,
    failures: &mut Vec<FetchFailure>,
) -> Option<Value> {
    match result {
        Ok(value) => value,
        Err(error) => {
            warn!(%report, error = %error, "report fetch failed, section has no data");
            failures.push(FetchFailure { report, error });
            None
        }
    }
}

/// Normalize and merge documents that are already in memory.
pub fn build_snapshot(raw: &RawSections) -> DeviceSnapshot {
    merge(normalize(raw))
}

/// The whole pipeline on documents that are already in memory.
pub fn build_metrics(raw: &RawSections, window: CounterWindow) -> DeviceMetrics {
    calculate(build_snapshot(raw), window)
}
