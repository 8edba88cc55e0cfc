//! Log setup
//!
//! `RUST_LOG` selects levels (default `info`). Orchestration traffic is
//! logged under the [`WIRE_TARGET`] target so it can be filtered on its own,
//! e.g. `RUST_LOG=info,mo_kernel::wire=off`.

use crate::config::LogFormat;
use tracing_subscriber::EnvFilter;

/// Target of the outbound/inbound command log
pub const WIRE_TARGET: &str = "mo_kernel::wire";

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber
///
/// # Errors
/// Fails when a global subscriber is already installed.
pub fn init(format: LogFormat) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter())
        .with_target(true)
        .with_level(true);

    let installed = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!(e))
}
