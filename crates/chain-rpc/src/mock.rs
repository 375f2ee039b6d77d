//! Programmable test doubles for [`crate::ChainRpc`] and
//! [`crate::ChainRpcConnector`].
#![allow(clippy::expect_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;

use crate::error::{ChainRpcError, Result};
use crate::provider::{ChainRpc, ChainRpcConnector};
use crate::types::RpcBlock;

/// A scripted response for one `block_with_transactions` call.
#[derive(Debug, Clone)]
enum BlockResponse {
    Found(RpcBlock),
    NotYetMined,
    Failure,
}

/// Programmable [`ChainRpc`] double.
///
/// Blocks and code are registered ahead of time; call counters let tests
/// assert how many RPC round-trips actually happened.
#[derive(Debug, Default)]
pub struct MockChainRpc {
    endpoint: String,
    head: AtomicU64,
    probe_fails: std::sync::atomic::AtomicBool,
    blocks: RwLock<HashMap<u64, BlockResponse>>,
    /// Queued `code_at` responses per address, consumed front-to-back.
    code_queue: RwLock<HashMap<Address, std::collections::VecDeque<Result<Bytes>>>>,
    code_calls: AtomicU64,
    block_calls: AtomicU64,
}

impl MockChainRpc {
    /// Build a mock bound to a nominal endpoint string (used only for
    /// logging/assertions, never dialed).
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Set the head block number returned by `block_number`.
    #[must_use]
    pub fn with_head(self, head: u64) -> Self {
        self.head.store(head, Ordering::SeqCst);
        self
    }

    /// Make the initial probe (`block_number`) fail.
    #[must_use]
    pub fn with_probe_failure(self) -> Self {
        self.probe_fails.store(true, Ordering::SeqCst);
        self
    }

    /// Register a block to be returned for `number`.
    pub fn set_block(&self, number: u64, block: RpcBlock) {
        self.blocks
            .write()
            .expect("lock poisoned")
            .insert(number, BlockResponse::Found(block));
    }

    /// Register `number` as not-yet-mined (`get_block` returns null).
    pub fn set_block_not_mined(&self, number: u64) {
        self.blocks
            .write()
            .expect("lock poisoned")
            .insert(number, BlockResponse::NotYetMined);
    }

    /// Register `number` as failing with a transport error.
    pub fn set_block_failure(&self, number: u64) {
        self.blocks
            .write()
            .expect("lock poisoned")
            .insert(number, BlockResponse::Failure);
    }

    /// Queue a successful `code_at` response for `address`.
    pub fn push_code(&self, address: Address, code: impl Into<Bytes>) {
        self.code_queue
            .write()
            .expect("lock poisoned")
            .entry(address)
            .or_default()
            .push_back(Ok(code.into()));
    }

    /// Queue the empty-code sentinel for `address`.
    pub fn push_empty_code(&self, address: Address) {
        self.push_code(address, Bytes::new());
    }

    /// Queue a transport failure for `address`.
    pub fn push_code_failure(&self, address: Address) {
        self.code_queue
            .write()
            .expect("lock poisoned")
            .entry(address)
            .or_default()
            .push_back(Err(ChainRpcError::Transport("mock failure".into())));
    }

    /// Number of `code_at` calls observed so far.
    #[must_use]
    pub fn code_call_count(&self) -> u64 {
        self.code_calls.load(Ordering::SeqCst)
    }

    /// Number of `block_with_transactions` calls observed so far.
    #[must_use]
    pub fn block_call_count(&self) -> u64 {
        self.block_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainRpc for MockChainRpc {
    async fn block_number(&self) -> Result<u64> {
        if self.probe_fails.load(Ordering::SeqCst) {
            return Err(ChainRpcError::Connection("mock probe failure".into()));
        }
        Ok(self.head.load(Ordering::SeqCst))
    }

    async fn block_with_transactions(&self, number: u64) -> Result<Option<RpcBlock>> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        match self.blocks.read().expect("lock poisoned").get(&number) {
            Some(BlockResponse::Found(block)) => Ok(Some(block.clone())),
            Some(BlockResponse::NotYetMined) | None => Ok(None),
            Some(BlockResponse::Failure) => {
                Err(ChainRpcError::Transport("mock block failure".into()))
            }
        }
    }

    async fn code_at(&self, address: Address) -> Result<Bytes> {
        self.code_calls.fetch_add(1, Ordering::SeqCst);
        let mut queue = self.code_queue.write().expect("lock poisoned");
        match queue.get_mut(&address).and_then(std::collections::VecDeque::pop_front) {
            Some(result) => result,
            None => Ok(Bytes::new()),
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// [`ChainRpcConnector`] that hands back pre-registered [`MockChainRpc`]
/// instances keyed by endpoint string.
#[derive(Debug, Default)]
pub struct MockConnector {
    clients: RwLock<HashMap<String, Arc<MockChainRpc>>>,
}

impl MockConnector {
    /// Create an empty connector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the client returned when `endpoint` is dialed.
    pub fn register(&self, endpoint: impl Into<String>, client: Arc<MockChainRpc>) {
        self.clients
            .write()
            .expect("lock poisoned")
            .insert(endpoint.into(), client);
    }
}

#[async_trait]
impl ChainRpcConnector for MockConnector {
    async fn connect(&self, endpoint: &str) -> Result<Arc<dyn ChainRpc>> {
        self.clients
            .read()
            .expect("lock poisoned")
            .get(endpoint)
            .cloned()
            .map(|client| client as Arc<dyn ChainRpc>)
            .ok_or_else(|| ChainRpcError::Connection(format!("no endpoint registered: {endpoint}")))
    }
}
