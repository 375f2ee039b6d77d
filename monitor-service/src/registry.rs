//! Static chain registry read from a JSON environment variable.
//!
//! A full descriptor catalogue (names, endpoint lists, native tokens) is
//! out of scope here; this adapter only needs to answer "what are the
//! default chains to watch", which it gets from `CHAINS_JSON`.

use monitor_core::{ChainDescriptor, ChainRegistry};
use serde::Deserialize;
use tracing::warn;

/// One entry of the `CHAINS_JSON` array.
#[derive(Debug, Deserialize)]
struct ChainEntry {
    chain_id: u64,
    name: String,
    rpc_endpoints: Vec<String>,
}

/// [`ChainRegistry`] backed by a fixed set parsed once at startup.
#[derive(Debug, Clone)]
pub struct EnvChainRegistry {
    chains: Vec<ChainDescriptor>,
}

impl EnvChainRegistry {
    /// Parse `CHAINS_JSON`, an array of `{chain_id, name, rpc_endpoints}`
    /// objects. Missing or malformed input yields an empty registry rather
    /// than failing startup; a supervisor built with an empty chain list
    /// and an empty registry simply monitors nothing.
    #[must_use]
    pub fn from_env() -> Self {
        let raw = match std::env::var("CHAINS_JSON") {
            Ok(raw) => raw,
            Err(_) => return Self { chains: Vec::new() },
        };

        match serde_json::from_str::<Vec<ChainEntry>>(&raw) {
            Ok(entries) => {
                let chains = entries
                    .into_iter()
                    .map(|entry| ChainDescriptor::new(entry.chain_id, entry.name, entry.rpc_endpoints))
                    .collect();
                Self { chains }
            }
            Err(err) => {
                warn!(%err, "CHAINS_JSON is not a valid chain descriptor array; ignoring");
                Self { chains: Vec::new() }
            }
        }
    }

    #[must_use]
    pub const fn new(chains: Vec<ChainDescriptor>) -> Self {
        Self { chains }
    }
}

impl ChainRegistry for EnvChainRegistry {
    fn default_chains(&self) -> Vec<ChainDescriptor> {
        self.chains.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_chain_array() {
        let json = r#"[{"chain_id":1,"name":"ethereum","rpc_endpoints":["https://eth.example"]}]"#;
        let entries: Vec<ChainEntry> = serde_json::from_str(json).unwrap();
        let registry = EnvChainRegistry::new(
            entries
                .into_iter()
                .map(|e| ChainDescriptor::new(e.chain_id, e.name, e.rpc_endpoints))
                .collect(),
        );
        let chains = registry.default_chains();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].chain_id, 1);
        assert_eq!(chains[0].name, "ethereum");
    }

    #[test]
    fn empty_registry_yields_no_chains() {
        let registry = EnvChainRegistry::new(vec![]);
        assert!(registry.default_chains().is_empty());
    }
}
