//! `discover`: list the services a device offers.

use tabled::Tabled;
use vsxmon_core::{Service, discover};

use crate::cli::GlobalOpts;
use crate::commands::poll_device;
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Label")]
    label: String,
}

fn service_row(s: &Service) -> ServiceRow {
    ServiceRow {
        service: s.item.to_string(),
        label: s.label.clone(),
    }
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let resolved = config::resolve_device(global)?;
    let (_, polled) = poll_device(&resolved).await?;

    let services = discover(&polled.metrics);
    let rendered =
        output::render_list(global.output, &services, service_row, |s| s.item.to_string());
    output::print_output(&rendered, global.quiet);
    Ok(())
}
