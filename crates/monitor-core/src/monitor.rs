//! [`ChainMonitor`]: one instance per monitored chain.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use alloy::primitives::{Address, B256};
use chain_rpc::{ChainRpc, ChainRpcConnector};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::config::MonitorTunables;
use crate::events::MonitorEvent;
use crate::ports::{
    EventBus, MetadataDecoder, RepositoryService, SourceAddressFactory, SourceFetcher,
    VerificationService,
};
use crate::types::{CheckedContract, ChainDescriptor, MonitorState, PaceDirection};

/// Drives one chain's polling loop: detects contract creations, retrieves
/// bytecode with bounded retries, and hands assembled contracts off to
/// verification.
///
/// Cheap to clone (everything is `Arc`-wrapped); the expected usage is to
/// wrap a single instance in an `Arc` and call [`ChainMonitor::start`] on it.
#[derive(Debug)]
pub struct ChainMonitor {
    descriptor: ChainDescriptor,
    connector: Arc<dyn ChainRpcConnector>,
    fetcher: Arc<dyn SourceFetcher>,
    verification: Arc<dyn VerificationService>,
    repository: Arc<dyn RepositoryService>,
    decoder: Arc<dyn MetadataDecoder>,
    address_factory: Arc<dyn SourceAddressFactory>,
    events: Arc<dyn EventBus>,
    tunables: MonitorTunables,
    cancel: CancellationToken,
    state: AtomicU8,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ChainMonitor {
    /// Construct a monitor for `descriptor`, wired to its collaborators.
    ///
    /// Starts in [`MonitorState::Idle`]; call [`ChainMonitor::start`] to
    /// begin polling.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        descriptor: ChainDescriptor,
        connector: Arc<dyn ChainRpcConnector>,
        fetcher: Arc<dyn SourceFetcher>,
        verification: Arc<dyn VerificationService>,
        repository: Arc<dyn RepositoryService>,
        decoder: Arc<dyn MetadataDecoder>,
        address_factory: Arc<dyn SourceAddressFactory>,
        events: Arc<dyn EventBus>,
        tunables: MonitorTunables,
    ) -> Self {
        Self {
            descriptor,
            connector,
            fetcher,
            verification,
            repository,
            decoder,
            address_factory,
            events,
            tunables,
            cancel: CancellationToken::new(),
            state: AtomicU8::new(MonitorState::Idle.to_u8()),
            task: Mutex::new(None),
        }
    }

    /// Chain id this monitor watches.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.descriptor.chain_id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> MonitorState {
        MonitorState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: MonitorState) {
        self.state.store(state.to_u8(), Ordering::SeqCst);
    }

    /// Probe RPC endpoints in order; on the first success, schedule the
    /// block loop and return. Never panics on a per-endpoint failure —
    /// every attempt is logged and the next endpoint is tried.
    #[instrument(skip(self), fields(chain_id = self.descriptor.chain_id))]
    pub async fn start(self: &Arc<Self>) {
        self.set_state(MonitorState::Starting);

        for endpoint in &self.descriptor.rpc_endpoints {
            let rpc = match self.connector.connect(endpoint).await {
                Ok(rpc) => rpc,
                Err(err) => {
                    warn!(%endpoint, %err, "rpc endpoint failed to connect");
                    continue;
                }
            };

            let head = match rpc.block_number().await {
                Ok(head) => head,
                Err(err) => {
                    warn!(%endpoint, %err, "rpc endpoint probe failed");
                    continue;
                }
            };

            let start_block = self
                .tunables
                .start_block_override(self.descriptor.chain_id)
                .unwrap_or(head);

            self.events.trigger(MonitorEvent::Started {
                chain_id: self.descriptor.chain_id,
                provider_url: endpoint.clone(),
                start_block,
            });
            info!(%endpoint, start_block, "monitor started");
            self.set_state(MonitorState::Running);

            let this = Arc::clone(self);
            let handle = tokio::spawn(async move { this.run_block_loop(rpc, start_block).await });
            *self.task.lock().await = Some(handle);
            return;
        }

        self.set_state(MonitorState::Stopped);
        self.events.trigger(MonitorEvent::CantStart {
            chain_id: self.descriptor.chain_id,
        });
    }

    /// Signal the block loop and any in-flight bytecode tasks to stop, then
    /// wait for the block loop to drain. Idempotent: a second call is a
    /// no-op.
    pub async fn stop(&self) {
        if matches!(self.state(), MonitorState::Stopped | MonitorState::Idle) {
            return;
        }
        self.cancel.cancel();
        self.set_state(MonitorState::Stopping);

        let handle = self.task.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        self.set_state(MonitorState::Stopped);
        self.events.trigger(MonitorEvent::Stopped {
            chain_id: self.descriptor.chain_id,
        });
    }

    async fn run_block_loop(self: Arc<Self>, rpc: Arc<dyn ChainRpc>, start_block: u64) {
        let mut cursor = start_block;
        let mut pause_ms = self.clamp_pause(self.tunables.get_block_pause_ms);

        loop {
            if self.cancel.is_cancelled() {
                return;
            }

            let (next_pause, handles) = self.process_block(&rpc, &mut cursor, pause_ms).await;
            pause_ms = next_pause;
            // Bytecode tasks are fire-and-forget w.r.t. the block loop; the
            // handles exist purely so tests can await deterministic completion.
            drop(handles);

            if self.cancel.is_cancelled() {
                return;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep(std::time::Duration::from_millis(pause_ms)) => {}
            }
        }
    }

    /// Processes block `*cursor`, returning the (possibly adapted) pause to
    /// wait before the next tick plus a handle per contract-creation
    /// transaction discovered. Advances `*cursor` only on a non-null fetch.
    ///
    /// Callers that only drive the polling loop may drop the handles; they
    /// exist so tests can await deterministic completion of fire-and-forget
    /// bytecode tasks.
    pub async fn process_block(
        self: &Arc<Self>,
        rpc: &Arc<dyn ChainRpc>,
        cursor: &mut u64,
        pause_ms: u64,
    ) -> (u64, Vec<JoinHandle<()>>) {
        let chain_id = self.descriptor.chain_id;
        let block_number = *cursor;

        match rpc.block_with_transactions(block_number).await {
            Ok(None) => (self.clamp_pause(self.adapt(pause_ms, PaceDirection::Increase)), Vec::new()),
            Ok(Some(block)) => {
                let pause_ms = self.clamp_pause(self.adapt(pause_ms, PaceDirection::Decrease));
                self.events.trigger(MonitorEvent::ProcessingBlock {
                    chain_id,
                    block_number,
                    pause_ms,
                });

                let handles = block
                    .transactions
                    .iter()
                    .filter(|tx| tx.is_contract_creation())
                    .map(|tx| self.handle_contract_creation(Arc::clone(rpc), tx.deployed_address(), tx.hash))
                    .collect();

                *cursor = block_number + 1;
                (pause_ms, handles)
            }
            Err(err) => {
                self.events.trigger(MonitorEvent::ProcessingBlockError {
                    chain_id,
                    block_number,
                    message: err.to_string(),
                });
                (pause_ms, Vec::new())
            }
        }
    }

    fn handle_contract_creation(
        self: &Arc<Self>,
        rpc: Arc<dyn ChainRpc>,
        address: Address,
        creator_tx_hash: B256,
    ) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let chain_id = this.descriptor.chain_id;
            match this.repository.check_by_chain_and_address(chain_id, address).await {
                Ok(true) => {
                    this.events.trigger(MonitorEvent::AlreadyVerified { chain_id, address });
                }
                Ok(false) => {
                    this.events.trigger(MonitorEvent::NewContract {
                        chain_id,
                        address,
                        creator_tx_hash,
                    });
                    let retries_left = i64::from(this.tunables.initial_get_bytecode_tries);
                    this.run_bytecode_task(rpc, creator_tx_hash, address, retries_left).await;
                }
                Err(err) => {
                    warn!(%chain_id, %address, %err, "repository check failed; dropping creation event");
                }
            }
        });
    }

    /// Pre-decrement-before-attempt retry loop for one contract's bytecode.
    pub async fn run_bytecode_task(
        self: Arc<Self>,
        rpc: Arc<dyn ChainRpc>,
        creator_tx_hash: B256,
        address: Address,
        mut retries_left: i64,
    ) {
        let chain_id = self.descriptor.chain_id;

        loop {
            retries_left -= 1;
            if retries_left < 0 {
                return;
            }
            if self.cancel.is_cancelled() {
                return;
            }

            match rpc.code_at(address).await {
                Ok(code) if code.is_empty() => {
                    if self.sleep_or_cancel(self.tunables.get_bytecode_retry_pause()).await {
                        return;
                    }
                }
                Ok(code) => {
                    match self
                        .decoder
                        .decode(&code)
                        .and_then(|meta| self.address_factory.from_cbor_data(&meta))
                    {
                        Ok(source_address) => {
                            self.dispatch_assembly(source_address, address, creator_tx_hash).await;
                        }
                        Err(err) => {
                            self.events.trigger(MonitorEvent::ProcessingBytecodeError {
                                chain_id,
                                address,
                                message: err.to_string(),
                            });
                        }
                    }
                    return;
                }
                Err(err) => {
                    self.events.trigger(MonitorEvent::GettingBytecodeError {
                        chain_id,
                        address,
                        message: err.to_string(),
                    });
                    if self.sleep_or_cancel(self.tunables.get_bytecode_retry_pause()).await {
                        return;
                    }
                }
            }
        }
    }

    async fn dispatch_assembly(
        self: &Arc<Self>,
        source_address: crate::types::SourceAddress,
        address: Address,
        creator_tx_hash: B256,
    ) {
        match self.fetcher.assemble(source_address).await {
            Ok(contract) => self.verify_and_store(contract, address, creator_tx_hash).await,
            Err(_err) => {
                // The fetcher owns retry/failure handling for assembly; this
                // monitor has no further obligation once it has delegated.
            }
        }
    }

    async fn verify_and_store(
        self: &Arc<Self>,
        contract: CheckedContract,
        address: Address,
        creator_tx_hash: B256,
    ) {
        let chain_id = self.descriptor.chain_id;

        let outcome = match self
            .verification
            .verify_deployed(&contract, chain_id, address, creator_tx_hash)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                self.events.trigger(MonitorEvent::VerifyError {
                    chain_id,
                    address,
                    message: err.to_string(),
                });
                return;
            }
        };

        match self.repository.store_match(chain_id, address, &contract, &outcome).await {
            Ok(()) => {
                self.events.trigger(MonitorEvent::VerifiedSuccessfully { chain_id, address });
            }
            Err(err) => {
                self.events.trigger(MonitorEvent::VerifyError {
                    chain_id,
                    address,
                    message: err.to_string(),
                });
            }
        }
    }

    /// Sleeps for `duration`, returning `true` if cancellation fired first.
    async fn sleep_or_cancel(&self, duration: std::time::Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => true,
            _ = tokio::time::sleep(duration) => false,
        }
    }

    fn adapt(&self, pause_ms: u64, direction: PaceDirection) -> u64 {
        adapt_pause(pause_ms, direction, self.tunables.block_pause_factor)
    }

    fn clamp_pause(&self, pause_ms: u64) -> u64 {
        pause_ms.clamp(
            self.tunables.block_pause_lower_limit_ms,
            self.tunables.block_pause_upper_limit_ms,
        )
    }
}

/// Multiplicative pacing step, unclamped. Exposed standalone for direct
/// testing against the documented scenarios.
#[must_use]
pub fn adapt_pause(pause_ms: u64, direction: PaceDirection, factor: f64) -> u64 {
    let scaled = match direction {
        PaceDirection::Increase => pause_ms as f64 * factor,
        PaceDirection::Decrease => pause_ms as f64 / factor,
    };
    scaled.round() as u64
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn increase_scales_up_by_factor() {
        assert_eq!(adapt_pause(10_000, PaceDirection::Increase, 1.1), 11_000);
    }

    #[test]
    fn decrease_scales_down_by_factor() {
        let decreased = adapt_pause(11_000, PaceDirection::Decrease, 1.1);
        assert_eq!(decreased, 10_000);
    }

    #[test]
    fn clamp_holds_pacing_at_ceiling_across_two_null_blocks() {
        let tunables = MonitorTunables {
            block_pause_upper_limit_ms: 30_000,
            ..MonitorTunables::default()
        };
        let clamp = |p: u64| p.clamp(tunables.block_pause_lower_limit_ms, tunables.block_pause_upper_limit_ms);

        let first = clamp(adapt_pause(29_000, PaceDirection::Increase, 1.1));
        assert_eq!(first, 30_000);
        let second = clamp(adapt_pause(first, PaceDirection::Increase, 1.1));
        assert_eq!(second, 30_000);
    }
}
