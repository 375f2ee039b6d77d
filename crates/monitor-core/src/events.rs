//! Structured events emitted by a [`crate::ChainMonitor`].
//!
//! These are fire-and-forget: nothing in this crate awaits or inspects the
//! result of publishing one. The two upward signals
//! (`contract-verified-successfully`, `contract-already-verified`) ride the
//! same bus rather than a separate channel — see [`MonitorEvent::VerifiedSuccessfully`]
//! and [`MonitorEvent::AlreadyVerified`].

use alloy::primitives::{Address, B256};

/// One structured event raised during a chain's monitoring lifecycle.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// `Monitor.Started` — a provider was found and the block loop began.
    Started { chain_id: u64, provider_url: String, start_block: u64 },
    /// `Monitor.Stopped` — the monitor has fully drained and stopped.
    Stopped { chain_id: u64 },
    /// `Monitor.Error.CantStart` — every RPC endpoint failed its probe.
    CantStart { chain_id: u64 },
    /// `Monitor.ProcessingBlock` — a non-null block was fetched.
    ProcessingBlock { chain_id: u64, block_number: u64, pause_ms: u64 },
    /// `Monitor.NewContract` — a creation transaction was detected and a
    /// bytecode task was scheduled.
    NewContract { chain_id: u64, address: Address, creator_tx_hash: B256 },
    /// The repository already has this address.
    ///
    /// This *is* the `contract-already-verified` upward signal (no separate
    /// `Monitor.AlreadyVerified` telemetry event is raised, mirroring
    /// [`MonitorEvent::VerifiedSuccessfully`]'s single-name treatment of the
    /// other upward signal).
    AlreadyVerified { chain_id: u64, address: Address },
    /// `Monitor.Error.ProcessingBlock` — fetching or handling a block failed.
    ProcessingBlockError { chain_id: u64, block_number: u64, message: String },
    /// `Monitor.Error.ProcessingBytecode` — CBOR metadata decode failed.
    ProcessingBytecodeError { chain_id: u64, address: Address, message: String },
    /// `Monitor.Error.GettingBytecode` — a `getCode` call failed.
    GettingBytecodeError { chain_id: u64, address: Address, message: String },
    /// `Monitor.Error.VerifyError` — verification or storage failed.
    VerifyError { chain_id: u64, address: Address, message: String },
    /// `contract-verified-successfully` upward signal.
    VerifiedSuccessfully { chain_id: u64, address: Address },
}

impl MonitorEvent {
    /// The dotted event name, matching what the bus would key on.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "Monitor.Started",
            Self::Stopped { .. } => "Monitor.Stopped",
            Self::CantStart { .. } => "Monitor.Error.CantStart",
            Self::ProcessingBlock { .. } => "Monitor.ProcessingBlock",
            Self::NewContract { .. } => "Monitor.NewContract",
            Self::AlreadyVerified { .. } => "contract-already-verified",
            Self::ProcessingBlockError { .. } => "Monitor.Error.ProcessingBlock",
            Self::ProcessingBytecodeError { .. } => "Monitor.Error.ProcessingBytecode",
            Self::GettingBytecodeError { .. } => "Monitor.Error.GettingBytecode",
            Self::VerifyError { .. } => "Monitor.Error.VerifyError",
            Self::VerifiedSuccessfully { .. } => "contract-verified-successfully",
        }
    }

    /// The chain id this event pertains to.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        match self {
            Self::Started { chain_id, .. }
            | Self::Stopped { chain_id }
            | Self::CantStart { chain_id }
            | Self::ProcessingBlock { chain_id, .. }
            | Self::NewContract { chain_id, .. }
            | Self::AlreadyVerified { chain_id, .. }
            | Self::ProcessingBlockError { chain_id, .. }
            | Self::ProcessingBytecodeError { chain_id, .. }
            | Self::GettingBytecodeError { chain_id, .. }
            | Self::VerifyError { chain_id, .. }
            | Self::VerifiedSuccessfully { chain_id, .. } => *chain_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_match_taxonomy() {
        assert_eq!(
            MonitorEvent::Started { chain_id: 1, provider_url: String::new(), start_block: 0 }
                .name(),
            "Monitor.Started"
        );
        assert_eq!(
            MonitorEvent::AlreadyVerified { chain_id: 1, address: Address::ZERO }.name(),
            "contract-already-verified"
        );
        assert_eq!(
            MonitorEvent::VerifiedSuccessfully { chain_id: 1, address: Address::ZERO }.name(),
            "contract-verified-successfully"
        );
    }
}
