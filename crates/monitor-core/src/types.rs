//! Core data model: the entities a [`crate::ChainMonitor`] owns or produces.

use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// Identifies a chain to monitor and where to reach it.
///
/// Read-only to the monitoring core; owned by whatever registry enumerates
/// the chain set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainDescriptor {
    /// EIP-155 chain id.
    pub chain_id: u64,
    /// Human-readable name, used only in logs and events.
    pub name: String,
    /// RPC endpoints in the order they should be tried at start.
    pub rpc_endpoints: Vec<String>,
}

impl ChainDescriptor {
    /// Build a descriptor from an id, name, and endpoint list.
    #[must_use]
    pub fn new(chain_id: u64, name: impl Into<String>, rpc_endpoints: Vec<String>) -> Self {
        Self {
            chain_id,
            name: name.into(),
            rpc_endpoints,
        }
    }
}

/// A contract-creation transaction awaiting bytecode retrieval.
///
/// `retries_left` is decremented before each attempt; a task observed with
/// `retries_left < 0` performs no further RPC calls.
#[derive(Debug, Clone, Copy)]
pub struct BytecodeTask {
    /// Hash of the transaction that created the contract.
    pub creator_tx_hash: B256,
    /// The deployed contract's deterministically derived address.
    pub deployed_address: Address,
    /// Remaining retry budget, pre-decrement.
    pub retries_left: i64,
}

/// Opaque pointer into content-addressed source storage, decoded from a
/// contract's CBOR metadata trailer.
///
/// The monitoring core never interprets this value; it only routes it to
/// the source fetcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceAddress(pub serde_json::Value);

/// The CBOR structure decoded from a bytecode's metadata trailer, before it
/// has been turned into a [`SourceAddress`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CborMetadata(pub serde_json::Value);

/// A source-assembled contract, ready for verification.
///
/// Opaque payload; the core only threads it from the source fetcher to the
/// verification service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckedContract {
    /// The metadata pointer this contract was assembled from.
    pub source_address: SourceAddress,
    /// Assembled contract payload, opaque to this crate.
    pub payload: serde_json::Value,
}

/// Result of a verification attempt: match outcome plus a storage receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationOutcome {
    /// Whether the reconstituted contract matched on-chain bytecode.
    pub matched: bool,
    /// Opaque receipt returned by the verification service, forwarded to
    /// the repository on store.
    pub receipt: serde_json::Value,
}

/// Lifecycle state of a [`crate::ChainMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Constructed, `start` not yet called.
    Idle,
    /// `start` is probing RPC endpoints.
    Starting,
    /// A provider is live and the block loop is scheduled.
    Running,
    /// `stop` has been called; draining in-flight work.
    Stopping,
    /// Fully stopped; no timers will fire.
    Stopped,
}

impl MonitorState {
    pub(crate) const fn to_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Starting => 1,
            Self::Running => 2,
            Self::Stopping => 3,
            Self::Stopped => 4,
        }
    }

    pub(crate) const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Starting,
            2 => Self::Running,
            3 => Self::Stopping,
            4 => Self::Stopped,
            _ => Self::Idle,
        }
    }
}

/// Direction for the adaptive pacing controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaceDirection {
    /// Blocks are not keeping up with the poller; slow down.
    Increase,
    /// The poller is keeping up; speed up.
    Decrease,
}
