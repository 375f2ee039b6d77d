//! [`ChainRpc`] port and its production adapter over `alloy`.

use std::sync::Arc;
use std::time::Duration;

use alloy::eips::BlockNumberOrTag;
use alloy::primitives::{Address, Bytes};
use alloy::providers::{DynProvider, Provider, ProviderBuilder, WsConnect};
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::{ChainRpcError, Result};
use crate::types::{RpcBlock, RpcTransaction};

/// The three read-only calls a block-polling monitor needs from a chain.
#[async_trait]
pub trait ChainRpc: Send + Sync + std::fmt::Debug {
    /// Current chain head.
    async fn block_number(&self) -> Result<u64>;

    /// Fetch a block with its full transaction list, or `None` if it hasn't
    /// been mined yet.
    async fn block_with_transactions(&self, number: u64) -> Result<Option<RpcBlock>>;

    /// Fetch the code deployed at `address`.
    ///
    /// Returns empty bytes (the `"0x"` sentinel) rather than an error when
    /// the node has no code for the address yet.
    async fn code_at(&self, address: Address) -> Result<Bytes>;

    /// The endpoint this client was constructed from, for logging.
    fn endpoint(&self) -> &str;
}

/// Turns an endpoint URL into a live [`ChainRpc`] client.
///
/// Transport is chosen by URL scheme: `http`/`https` get a request-response
/// JSON-RPC client, `ws`/`wss` get a persistent websocket connection.
#[async_trait]
pub trait ChainRpcConnector: Send + Sync {
    /// Dial `endpoint` and return a ready client. Does not itself probe
    /// liveness; callers should follow up with [`ChainRpc::block_number`].
    async fn connect(&self, endpoint: &str) -> Result<Arc<dyn ChainRpc>>;
}

/// Production [`ChainRpcConnector`] built on `alloy`'s HTTP and WS providers.
#[derive(Debug, Clone)]
pub struct AlloyConnector {
    timeout: Duration,
}

impl AlloyConnector {
    /// Build a connector with the given per-call timeout hint.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ChainRpcConnector for AlloyConnector {
    #[instrument(skip(self), fields(endpoint = %endpoint))]
    async fn connect(&self, endpoint: &str) -> Result<Arc<dyn ChainRpc>> {
        let scheme = endpoint
            .split_once("://")
            .map(|(scheme, _)| scheme)
            .ok_or_else(|| ChainRpcError::UnsupportedScheme(endpoint.to_string()))?;

        let provider = match scheme {
            "http" | "https" => {
                let url = endpoint
                    .parse()
                    .map_err(|e| ChainRpcError::InvalidResponse(format!("bad url: {e}")))?;
                ProviderBuilder::new().connect_http(url).erased()
            }
            "ws" | "wss" => ProviderBuilder::new()
                .connect_ws(WsConnect::new(endpoint))
                .await
                .map_err(|e| ChainRpcError::Connection(e.to_string()))?
                .erased(),
            other => return Err(ChainRpcError::UnsupportedScheme(other.to_string())),
        };

        debug!("connected");
        Ok(Arc::new(AlloyChainRpc {
            provider,
            endpoint: endpoint.to_string(),
            timeout: self.timeout,
        }))
    }
}

/// [`ChainRpc`] adapter wrapping an erased `alloy` provider.
#[derive(Debug)]
struct AlloyChainRpc {
    provider: DynProvider,
    endpoint: String,
    timeout: Duration,
}

#[async_trait]
impl ChainRpc for AlloyChainRpc {
    async fn block_number(&self) -> Result<u64> {
        tokio::time::timeout(self.timeout, self.provider.get_block_number())
            .await
            .map_err(|_| ChainRpcError::Timeout(self.timeout))?
            .map_err(ChainRpcError::from)
    }

    async fn block_with_transactions(&self, number: u64) -> Result<Option<RpcBlock>> {
        let fut = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(number))
            .full();

        let block = tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| ChainRpcError::Timeout(self.timeout))?
            .map_err(ChainRpcError::from)?;

        let Some(block) = block else {
            return Ok(None);
        };

        let transactions = block
            .transactions
            .txns()
            .map(|tx| RpcTransaction {
                hash: *tx.inner.tx_hash(),
                to: tx.to(),
                from: tx.from,
                nonce: tx.nonce(),
            })
            .collect();

        Ok(Some(RpcBlock {
            number,
            transactions,
        }))
    }

    async fn code_at(&self, address: Address) -> Result<Bytes> {
        tokio::time::timeout(self.timeout, self.provider.get_code_at(address))
            .await
            .map_err(|_| ChainRpcError::Timeout(self.timeout))?
            .map_err(ChainRpcError::from)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
