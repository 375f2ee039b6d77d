//! Error types for the monitoring core.
//!
//! All of these are recovered locally by [`crate::ChainMonitor`] — nothing
//! escapes a monitor's task loop. The variants exist so that the event
//! emitted for a failure can carry a structured cause, and so collaborator
//! adapters have a concrete error type to return.

use thiserror::Error;

/// Result type alias using [`MonitorError`].
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors surfaced by external collaborator ports and internal bookkeeping.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MonitorError {
    /// The RPC layer failed; see [`chain_rpc::ChainRpcError`] for detail.
    #[error("chain rpc error: {0}")]
    ChainRpc(#[from] chain_rpc::ChainRpcError),

    /// The CBOR metadata trailer could not be decoded or was structurally
    /// invalid.
    #[error("metadata decode failure: {0}")]
    MetadataDecode(String),

    /// The source fetcher failed to assemble a checked contract.
    #[error("source assembly failure: {0}")]
    SourceAssembly(String),

    /// The verification service rejected or failed to process a contract.
    #[error("verification failure: {0}")]
    Verification(String),

    /// The repository service failed to read or write a match.
    #[error("repository failure: {0}")]
    Repository(String),

    /// Configuration was missing or malformed at startup.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Internal invariant violation (e.g. no provider after a successful
    /// start). Indicates a bug in this crate, not a collaborator failure.
    #[error("internal invariant violated: {0}")]
    Internal(String),
}
