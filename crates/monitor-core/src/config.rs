//! Environment-driven tunables, read once at startup.
//!
//! Mirrors the named environment options a monitor needs; nothing here
//! parses arbitrary configuration files — env vars (optionally loaded from
//! a `.env` file by the caller) are the only source.

use std::collections::HashMap;
use std::time::Duration;

use config::{Config, Environment};
use serde::Deserialize;

use crate::error::Result;

/// Tunables shared by every [`crate::ChainMonitor`], plus the per-chain
/// start-block override table.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorTunables {
    /// Multiplicative pacing step; must be > 1.
    #[serde(default = "default_block_pause_factor")]
    pub block_pause_factor: f64,
    /// Pacing ceiling, in milliseconds.
    #[serde(default = "default_block_pause_upper_limit")]
    pub block_pause_upper_limit_ms: u64,
    /// Pacing floor, in milliseconds.
    #[serde(default = "default_block_pause_lower_limit")]
    pub block_pause_lower_limit_ms: u64,
    /// Per-RPC-call timeout hint, in milliseconds.
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_ms: u64,
    /// Delay between bytecode retries, in milliseconds.
    #[serde(default = "default_get_bytecode_retry_pause")]
    pub get_bytecode_retry_pause_ms: u64,
    /// Initial polling interval, in milliseconds.
    #[serde(default = "default_get_block_pause")]
    pub get_block_pause_ms: u64,
    /// Retry budget per bytecode-retrieval address.
    #[serde(default = "default_initial_get_bytecode_tries")]
    pub initial_get_bytecode_tries: u32,

    /// Explicit start block per chain id, read from `MONITOR_START_<chainId>`.
    #[serde(skip)]
    pub start_block_overrides: HashMap<u64, u64>,
}

const fn default_block_pause_factor() -> f64 {
    1.1
}
const fn default_block_pause_upper_limit() -> u64 {
    30_000
}
const fn default_block_pause_lower_limit() -> u64 {
    500
}
const fn default_provider_timeout() -> u64 {
    3_000
}
const fn default_get_bytecode_retry_pause() -> u64 {
    5_000
}
const fn default_get_block_pause() -> u64 {
    10_000
}
const fn default_initial_get_bytecode_tries() -> u32 {
    3
}

impl MonitorTunables {
    /// Load tunables from the process environment.
    ///
    /// `MONITOR_START_<chainId>` entries are scanned separately since their
    /// variable names carry data (the chain id) rather than being fixed.
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            .set_default("block_pause_factor", default_block_pause_factor())?
            .set_default("block_pause_upper_limit_ms", default_block_pause_upper_limit())?
            .set_default("block_pause_lower_limit_ms", default_block_pause_lower_limit())?
            .set_default("provider_timeout_ms", default_provider_timeout())?
            .set_default("get_bytecode_retry_pause_ms", default_get_bytecode_retry_pause())?
            .set_default("get_block_pause_ms", default_get_block_pause())?
            .set_default("initial_get_bytecode_tries", default_initial_get_bytecode_tries())?
            .add_source(Environment::default())
            .build()?;

        let mut tunables: Self = config.try_deserialize()?;
        tunables.start_block_overrides = scan_start_block_overrides(std::env::vars());
        tunables.validate()?;
        Ok(tunables)
    }

    /// Explicit start-block override for `chain_id`, if one was configured.
    #[must_use]
    pub fn start_block_override(&self, chain_id: u64) -> Option<u64> {
        self.start_block_overrides.get(&chain_id).copied()
    }

    /// Per-RPC-call timeout as a [`Duration`].
    #[must_use]
    pub const fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// Bytecode retry delay as a [`Duration`].
    #[must_use]
    pub const fn get_bytecode_retry_pause(&self) -> Duration {
        Duration::from_millis(self.get_bytecode_retry_pause_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.block_pause_factor <= 1.0 {
            return Err(crate::error::MonitorError::Internal(
                "block_pause_factor must be > 1".into(),
            ));
        }
        if self.block_pause_lower_limit_ms > self.block_pause_upper_limit_ms {
            return Err(crate::error::MonitorError::Internal(
                "block_pause_lower_limit_ms must be <= block_pause_upper_limit_ms".into(),
            ));
        }
        if self.initial_get_bytecode_tries == 0 {
            return Err(crate::error::MonitorError::Internal(
                "initial_get_bytecode_tries must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for MonitorTunables {
    fn default() -> Self {
        Self {
            block_pause_factor: default_block_pause_factor(),
            block_pause_upper_limit_ms: default_block_pause_upper_limit(),
            block_pause_lower_limit_ms: default_block_pause_lower_limit(),
            provider_timeout_ms: default_provider_timeout(),
            get_bytecode_retry_pause_ms: default_get_bytecode_retry_pause(),
            get_block_pause_ms: default_get_block_pause(),
            initial_get_bytecode_tries: default_initial_get_bytecode_tries(),
            start_block_overrides: HashMap::new(),
        }
    }
}

fn scan_start_block_overrides(vars: impl Iterator<Item = (String, String)>) -> HashMap<u64, u64> {
    const PREFIX: &str = "MONITOR_START_";
    vars.filter_map(|(key, value)| {
        let suffix = key.strip_prefix(PREFIX)?;
        let chain_id: u64 = suffix.parse().ok()?;
        let start_block: u64 = value.parse().ok()?;
        Some((chain_id, start_block))
    })
    .collect()
}
