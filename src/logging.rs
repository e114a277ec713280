// 📝 Logging - tracing subscriber setup for the binaries
//
// Library code only emits `tracing` events. Binaries call `init_logging`
// once; `RUST_LOG` overrides the default filter.

use anyhow::{anyhow, Result};
use std::io;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "info";

/// Build the filter from `RUST_LOG`, falling back to `default_filter`
pub fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Install a stderr fmt subscriber. Fails if one is already installed.
pub fn init_logging(default_filter: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter(default_filter))
        .with(fmt::layer().with_writer(io::stderr).with_target(true))
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))
}
