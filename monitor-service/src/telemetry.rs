//! [`EventBus`] adapter that logs every event as a structured tracing span.

use monitor_core::{EventBus, MonitorEvent};
use tracing::info;

/// Publishes events as `tracing` records; nothing is retained in-process.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventBus;

impl TracingEventBus {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl EventBus for TracingEventBus {
    fn trigger(&self, event: MonitorEvent) {
        match event {
            MonitorEvent::Started { chain_id, provider_url, start_block } => {
                info!(chain_id, provider_url, start_block, "monitor started");
            }
            MonitorEvent::Stopped { chain_id } => {
                info!(chain_id, "monitor stopped");
            }
            MonitorEvent::CantStart { chain_id } => {
                info!(chain_id, "monitor could not start: no endpoint responded");
            }
            MonitorEvent::ProcessingBlock { chain_id, block_number, pause_ms } => {
                info!(chain_id, block_number, pause_ms, "processing block");
            }
            MonitorEvent::NewContract { chain_id, address, creator_tx_hash } => {
                info!(chain_id, %address, %creator_tx_hash, "new contract creation detected");
            }
            MonitorEvent::AlreadyVerified { chain_id, address } => {
                info!(chain_id, %address, "contract already verified");
            }
            MonitorEvent::ProcessingBlockError { chain_id, block_number, message } => {
                info!(chain_id, block_number, message, "error processing block");
            }
            MonitorEvent::ProcessingBytecodeError { chain_id, address, message } => {
                info!(chain_id, %address, message, "error processing bytecode");
            }
            MonitorEvent::GettingBytecodeError { chain_id, address, message } => {
                info!(chain_id, %address, message, "error getting bytecode");
            }
            MonitorEvent::VerifyError { chain_id, address, message } => {
                info!(chain_id, %address, message, "error verifying contract");
            }
            MonitorEvent::VerifiedSuccessfully { chain_id, address } => {
                info!(chain_id, %address, "contract verified successfully");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_does_not_panic_for_every_variant() {
        let bus = TracingEventBus::new();
        bus.trigger(MonitorEvent::Stopped { chain_id: 1 });
        bus.trigger(MonitorEvent::CantStart { chain_id: 1 });
    }
}
