// vsxmon-api: Async client for the Sansay VSX statistics REST API

pub mod client;
pub mod error;
pub mod report;
pub mod transport;

pub use client::{RetryPolicy, VsxClient};
pub use error::Error;
pub use report::Report;
pub use transport::{TlsMode, TransportConfig};
