//! Optional `tracing` subscriber setup for control programs
//!
//! The library only emits events. Programs that want them on stderr call
//! [`init`] once before running a session.

use tracing_subscriber::EnvFilter;

use crate::config::BridgeConfig;
use crate::{BridgeError, Result};

/// Filter used when neither `RUST_LOG` nor the config names one.
pub const DEFAULT_FILTER: &str = "racecar_link=info";

/// Build the filter: `RUST_LOG` wins, then `config.log_filter`, then [`DEFAULT_FILTER`].
pub fn filter_for(config: &BridgeConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directive = config.log_filter.as_deref().unwrap_or(DEFAULT_FILTER);
    EnvFilter::try_new(directive).map_err(|e| {
        BridgeError::config_with_source(format!("Invalid log filter '{directive}'"), Box::new(e))
    })
}

/// Install a formatting subscriber on stderr.
///
/// Returns `Ok(false)` when another subscriber was already installed.
pub fn init(config: &BridgeConfig) -> Result<bool> {
    let filter = filter_for(config)?;
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();
    Ok(installed)
}
