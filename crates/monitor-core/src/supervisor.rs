//! [`MonitorSupervisor`]: lifecycle fan-out across many chains.

use std::sync::Arc;

use chain_rpc::ChainRpcConnector;
use futures::future::join_all;

use crate::config::MonitorTunables;
use crate::monitor::ChainMonitor;
use crate::ports::{
    ChainRegistry, EventBus, MetadataDecoder, RepositoryService, SourceAddressFactory,
    SourceFetcher, VerificationService,
};
use crate::types::ChainDescriptor;

/// Creates and owns every [`ChainMonitor`] for a chain set, fans `start`
/// and `stop` across them, and owns the shared [`SourceFetcher`].
///
/// The two upward signals (`contract-verified-successfully`,
/// `contract-already-verified`) need no explicit re-wiring here: every
/// monitor is constructed with the same [`EventBus`] handle, so whatever a
/// monitor publishes is already visible on the bus the supervisor's caller
/// subscribed to.
#[derive(Debug)]
pub struct MonitorSupervisor {
    monitors: Vec<Arc<ChainMonitor>>,
    fetcher: Arc<dyn SourceFetcher>,
}

impl MonitorSupervisor {
    /// Build a supervisor for `chains`, or the registry's default set if
    /// `chains` is empty.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        chains: Vec<ChainDescriptor>,
        registry: &dyn ChainRegistry,
        connector: Arc<dyn ChainRpcConnector>,
        fetcher: Arc<dyn SourceFetcher>,
        verification: Arc<dyn VerificationService>,
        repository: Arc<dyn RepositoryService>,
        decoder: Arc<dyn MetadataDecoder>,
        address_factory: Arc<dyn SourceAddressFactory>,
        events: Arc<dyn EventBus>,
        tunables: MonitorTunables,
    ) -> Self {
        let chains = if chains.is_empty() { registry.default_chains() } else { chains };

        let monitors = chains
            .into_iter()
            .map(|descriptor| {
                Arc::new(ChainMonitor::new(
                    descriptor,
                    Arc::clone(&connector),
                    Arc::clone(&fetcher),
                    Arc::clone(&verification),
                    Arc::clone(&repository),
                    Arc::clone(&decoder),
                    Arc::clone(&address_factory),
                    Arc::clone(&events),
                    tunables.clone(),
                ))
            })
            .collect();

        Self { monitors, fetcher }
    }

    /// Monitors under this supervisor, for introspection and tests.
    #[must_use]
    pub fn monitors(&self) -> &[Arc<ChainMonitor>] {
        &self.monitors
    }

    /// Start every monitor concurrently, waiting for each one's startup
    /// procedure (not its polling loop) to finish.
    pub async fn start(&self) {
        join_all(self.monitors.iter().map(|monitor| monitor.start())).await;
    }

    /// Stop every monitor, then drain the shared source fetcher.
    ///
    /// Ordering matters: monitors stop first so no new fetch is enqueued
    /// after the fetcher is told to drain.
    pub async fn stop(&self) {
        join_all(self.monitors.iter().map(|monitor| monitor.stop())).await;
        if let Err(err) = self.fetcher.stop().await {
            tracing::warn!(%err, "source fetcher failed to stop cleanly");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chain_rpc::mock::{MockChainRpc, MockConnector};

    use super::*;
    use crate::ports::mocks::{
        AlwaysVerifies, CannedFetcher, MockRepository, PassthroughDecoder, RecordingEventBus,
        StaticRegistry,
    };

    #[tokio::test]
    async fn empty_chain_list_falls_back_to_registry_default() {
        let connector = Arc::new(MockConnector::new());
        connector.register(
            "mock://a",
            Arc::new(MockChainRpc::new("mock://a").with_probe_failure()),
        );
        let registry = StaticRegistry::new(vec![ChainDescriptor::new(
            7,
            "default-chain",
            vec!["mock://a".into()],
        )]);
        let decoder = Arc::new(PassthroughDecoder::new());

        let supervisor = MonitorSupervisor::new(
            vec![],
            &registry,
            connector,
            Arc::new(CannedFetcher::new()),
            Arc::new(AlwaysVerifies::new()),
            Arc::new(MockRepository::new()),
            decoder.clone(),
            decoder,
            Arc::new(RecordingEventBus::new()),
            MonitorTunables::default(),
        );

        assert_eq!(supervisor.monitors().len(), 1);
        assert_eq!(supervisor.monitors()[0].chain_id(), 7);
    }

    #[tokio::test]
    async fn stop_drains_fetcher_after_every_monitor() {
        let connector = Arc::new(MockConnector::new());
        connector.register(
            "mock://a",
            Arc::new(MockChainRpc::new("mock://a").with_probe_failure()),
        );
        let registry = StaticRegistry::new(vec![]);
        let fetcher = Arc::new(CannedFetcher::new());
        let decoder = Arc::new(PassthroughDecoder::new());

        let supervisor = MonitorSupervisor::new(
            vec![ChainDescriptor::new(1, "a", vec!["mock://a".into()])],
            &registry,
            connector,
            Arc::clone(&fetcher) as Arc<dyn SourceFetcher>,
            Arc::new(AlwaysVerifies::new()),
            Arc::new(MockRepository::new()),
            decoder.clone(),
            decoder,
            Arc::new(RecordingEventBus::new()),
            MonitorTunables::default(),
        );

        supervisor.start().await;
        supervisor.stop().await;

        assert!(fetcher.was_stopped());
    }
}
