//! Integration tests for the concrete scenarios a per-chain monitor must
//! satisfy: creation detection, the already-verified short-circuit, null
//! blocks, pacing clamp, bytecode retry exhaustion, and RPC fail-over.
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use alloy::primitives::{Address, B256};
use chain_rpc::mock::{MockChainRpc, MockConnector};
use chain_rpc::ChainRpc;
use monitor_core::ports::mocks::{
    AlwaysVerifies, CannedFetcher, MockRepository, PassthroughDecoder, RecordingEventBus,
};
use monitor_core::{ChainDescriptor, ChainMonitor, MonitorTunables};

fn creation_tx(from: Address, nonce: u64) -> chain_rpc::RpcTransaction {
    chain_rpc::RpcTransaction {
        hash: B256::repeat_byte(0xAB),
        to: None,
        from,
        nonce,
    }
}

#[allow(clippy::too_many_arguments)]
fn build_monitor(
    rpc_endpoint: &str,
    rpc: Arc<MockChainRpc>,
    repository: Arc<MockRepository>,
    verification: Arc<AlwaysVerifies>,
    fetcher: Arc<CannedFetcher>,
    decoder: Arc<PassthroughDecoder>,
    events: Arc<RecordingEventBus>,
    tunables: MonitorTunables,
) -> Arc<ChainMonitor> {
    let connector = Arc::new(MockConnector::new());
    connector.register(rpc_endpoint, rpc);
    let descriptor = ChainDescriptor::new(1, "testnet", vec![rpc_endpoint.to_string()]);

    Arc::new(ChainMonitor::new(
        descriptor,
        connector,
        fetcher,
        verification,
        repository,
        decoder.clone(),
        decoder,
        events,
        tunables,
    ))
}

#[tokio::test]
async fn happy_path_creation_is_verified_exactly_once() {
    let sender = Address::repeat_byte(0xAA);
    let tx = creation_tx(sender, 0);
    let deployed = tx.deployed_address();

    let rpc = Arc::new(MockChainRpc::new("mock://primary").with_head(100));
    rpc.set_block(100, chain_rpc::RpcBlock { number: 100, transactions: vec![tx] });
    rpc.push_code(deployed, vec![0xde, 0xad, 0xbe, 0xef]);

    let repository = Arc::new(MockRepository::new());
    let verification = Arc::new(AlwaysVerifies::new());
    let fetcher = Arc::new(CannedFetcher::new());
    let decoder = Arc::new(PassthroughDecoder::new());
    let events = Arc::new(RecordingEventBus::new());

    let monitor = build_monitor(
        "mock://primary",
        Arc::clone(&rpc),
        Arc::clone(&repository),
        Arc::clone(&verification),
        Arc::clone(&fetcher),
        decoder,
        Arc::clone(&events),
        MonitorTunables::default(),
    );

    let rpc_dyn: Arc<dyn ChainRpc> = rpc;
    let mut cursor = 100u64;
    let (_, handles) = monitor.process_block(&rpc_dyn, &mut cursor, 10_000).await;
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(cursor, 101, "cursor advances unconditionally on a non-null fetch");
    assert_eq!(repository.store_call_count(), 1);
    assert_eq!(events.count_named("contract-verified-successfully"), 1);
}

#[tokio::test]
async fn already_verified_short_circuits_before_bytecode_fetch() {
    let sender = Address::repeat_byte(0xAA);
    let tx = creation_tx(sender, 0);
    let deployed = tx.deployed_address();

    let rpc = Arc::new(MockChainRpc::new("mock://primary").with_head(100));
    rpc.set_block(100, chain_rpc::RpcBlock { number: 100, transactions: vec![tx] });

    let repository = Arc::new(MockRepository::new().mark_verified(1, deployed));
    let verification = Arc::new(AlwaysVerifies::new());
    let fetcher = Arc::new(CannedFetcher::new());
    let decoder = Arc::new(PassthroughDecoder::new());
    let events = Arc::new(RecordingEventBus::new());

    let monitor = build_monitor(
        "mock://primary",
        Arc::clone(&rpc),
        Arc::clone(&repository),
        Arc::clone(&verification),
        Arc::clone(&fetcher),
        decoder,
        Arc::clone(&events),
        MonitorTunables::default(),
    );

    let rpc_dyn: Arc<dyn ChainRpc> = Arc::clone(&rpc) as Arc<dyn ChainRpc>;
    let mut cursor = 100u64;
    let (_, handles) = monitor.process_block(&rpc_dyn, &mut cursor, 10_000).await;
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(cursor, 101);
    assert_eq!(rpc.code_call_count(), 0, "no getCode round-trip when already verified");
    assert_eq!(fetcher.assemble_call_count(), 0);
    assert_eq!(events.count_named("contract-already-verified"), 1);
    assert_eq!(
        events.count_named("contract-verified-successfully"),
        0,
        "a short-circuited address must not also report success"
    );
}

#[tokio::test]
async fn null_block_backs_off_without_advancing_cursor() {
    let rpc = Arc::new(MockChainRpc::new("mock://primary").with_head(500));
    rpc.set_block_not_mined(500);

    let monitor = build_monitor(
        "mock://primary",
        Arc::clone(&rpc),
        Arc::new(MockRepository::new()),
        Arc::new(AlwaysVerifies::new()),
        Arc::new(CannedFetcher::new()),
        Arc::new(PassthroughDecoder::new()),
        Arc::new(RecordingEventBus::new()),
        MonitorTunables::default(),
    );

    let rpc_dyn: Arc<dyn ChainRpc> = rpc;
    let mut cursor = 500u64;
    let (pause, handles) = monitor.process_block(&rpc_dyn, &mut cursor, 10_000).await;
    assert!(handles.is_empty());

    assert_eq!(cursor, 500, "a null block leaves the cursor fixed");
    assert_eq!(pause, 11_000, "10000ms at factor 1.1 increases to 11000ms");
}

#[tokio::test]
async fn pacing_clamps_at_ceiling_across_consecutive_null_blocks() {
    let rpc = Arc::new(MockChainRpc::new("mock://primary").with_head(1));
    rpc.set_block_not_mined(1);

    let monitor = build_monitor(
        "mock://primary",
        Arc::clone(&rpc),
        Arc::new(MockRepository::new()),
        Arc::new(AlwaysVerifies::new()),
        Arc::new(CannedFetcher::new()),
        Arc::new(PassthroughDecoder::new()),
        Arc::new(RecordingEventBus::new()),
        MonitorTunables {
            block_pause_upper_limit_ms: 30_000,
            ..MonitorTunables::default()
        },
    );

    let rpc_dyn: Arc<dyn ChainRpc> = rpc;
    let mut cursor = 1u64;
    let (first_pause, _) = monitor.process_block(&rpc_dyn, &mut cursor, 29_000).await;
    assert_eq!(first_pause, 30_000);

    let (second_pause, _) = monitor.process_block(&rpc_dyn, &mut cursor, first_pause).await;
    assert_eq!(second_pause, 30_000);
}

#[tokio::test]
async fn bytecode_retry_budget_caps_attempts_at_three() {
    let address = Address::repeat_byte(0xCC);
    let rpc = Arc::new(MockChainRpc::new("mock://primary"));
    // More `0x` responses queued than the retry budget allows; only the
    // first three should ever be consumed.
    for _ in 0..5 {
        rpc.push_empty_code(address);
    }

    let decoder = Arc::new(PassthroughDecoder::new());
    let monitor = build_monitor(
        "mock://primary",
        Arc::clone(&rpc),
        Arc::new(MockRepository::new()),
        Arc::new(AlwaysVerifies::new()),
        Arc::new(CannedFetcher::new()),
        decoder,
        Arc::new(RecordingEventBus::new()),
        MonitorTunables {
            get_bytecode_retry_pause_ms: 1,
            initial_get_bytecode_tries: 3,
            ..MonitorTunables::default()
        },
    );

    let rpc_dyn: Arc<dyn ChainRpc> = Arc::clone(&rpc) as Arc<dyn ChainRpc>;
    Arc::clone(&monitor)
        .run_bytecode_task(rpc_dyn, B256::ZERO, address, 3)
        .await;

    assert_eq!(
        rpc.code_call_count(),
        3,
        "decrement-before-attempt caps attempts at the initial budget"
    );
}

#[tokio::test]
async fn bytecode_fetch_success_after_retries_decodes_and_verifies() {
    let address = Address::repeat_byte(0xCC);
    let rpc = Arc::new(MockChainRpc::new("mock://primary"));
    rpc.push_empty_code(address);
    rpc.push_code(address, vec![0x60, 0x60]);

    let decoder = Arc::new(PassthroughDecoder::new());
    let repository = Arc::new(MockRepository::new());
    let events = Arc::new(RecordingEventBus::new());
    let monitor = build_monitor(
        "mock://primary",
        Arc::clone(&rpc),
        Arc::clone(&repository),
        Arc::new(AlwaysVerifies::new()),
        Arc::new(CannedFetcher::new()),
        decoder,
        Arc::clone(&events),
        MonitorTunables {
            get_bytecode_retry_pause_ms: 1,
            ..MonitorTunables::default()
        },
    );

    let rpc_dyn: Arc<dyn ChainRpc> = Arc::clone(&rpc) as Arc<dyn ChainRpc>;
    Arc::clone(&monitor)
        .run_bytecode_task(rpc_dyn, B256::ZERO, address, 3)
        .await;

    assert_eq!(rpc.code_call_count(), 2, "one 0x retry then one successful fetch");
    assert_eq!(repository.store_call_count(), 1);
    assert_eq!(events.count_named("contract-verified-successfully"), 1);
}

#[tokio::test]
async fn rpc_fail_over_uses_the_first_working_endpoint() {
    let failing = Arc::new(MockChainRpc::new("mock://primary").with_probe_failure());
    let working = Arc::new(MockChainRpc::new("mock://secondary").with_head(777));

    let connector = Arc::new(MockConnector::new());
    connector.register("mock://primary", failing);
    connector.register("mock://secondary", Arc::clone(&working));

    let descriptor = ChainDescriptor::new(
        1,
        "testnet",
        vec!["mock://primary".into(), "mock://secondary".into()],
    );
    let events = Arc::new(RecordingEventBus::new());
    let decoder = Arc::new(PassthroughDecoder::new());

    let monitor = Arc::new(ChainMonitor::new(
        descriptor,
        connector,
        Arc::new(CannedFetcher::new()),
        Arc::new(AlwaysVerifies::new()),
        Arc::new(MockRepository::new()),
        decoder.clone(),
        decoder,
        Arc::clone(&events),
        MonitorTunables::default(),
    ));

    monitor.start().await;
    // Let the spawned block loop's first tick run before tearing down.
    tokio::task::yield_now().await;
    monitor.stop().await;

    let started = events.events().into_iter().find_map(|event| match event {
        monitor_core::MonitorEvent::Started { provider_url, start_block, .. } => {
            Some((provider_url, start_block))
        }
        _ => None,
    });
    assert_eq!(started, Some(("mock://secondary".to_string(), 777)));
}
