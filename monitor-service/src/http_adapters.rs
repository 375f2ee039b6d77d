//! HTTP-client adapters to the external verification, repository, and
//! source-fetcher services.
//!
//! Each collaborator is reached over plain JSON-over-HTTP via a shared
//! `reqwest::Client`; these are the only adapters in this crate that leave
//! the process.

use std::time::Duration;

use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use monitor_core::{
    CheckedContract, MonitorError, RepositoryService, Result, SourceAddress, SourceFetcher,
    VerificationOutcome, VerificationService,
};
use serde::Serialize;
use tracing::instrument;

/// Shared HTTP client configuration for every collaborator adapter below.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub verification_base_url: String,
    pub repository_base_url: String,
    pub source_fetcher_base_url: String,
    pub request_timeout: Duration,
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// [`RepositoryService`] backed by a JSON HTTP repository API.
#[derive(Debug)]
pub struct HttpRepository {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRepository {
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self { client: build_client(timeout), base_url: base_url.into() }
    }
}

#[async_trait]
impl RepositoryService for HttpRepository {
    #[instrument(skip(self))]
    async fn check_by_chain_and_address(&self, chain_id: u64, address: Address) -> Result<bool> {
        let url = format!("{}/matches/{chain_id}/{address}", self.base_url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| MonitorError::Repository(err.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }

        let matches: Vec<serde_json::Value> = response
            .error_for_status()
            .map_err(|err| MonitorError::Repository(err.to_string()))?
            .json()
            .await
            .map_err(|err| MonitorError::Repository(err.to_string()))?;

        Ok(!matches.is_empty())
    }

    #[instrument(skip(self, contract, outcome))]
    async fn store_match(
        &self,
        chain_id: u64,
        address: Address,
        contract: &CheckedContract,
        outcome: &VerificationOutcome,
    ) -> Result<()> {
        #[derive(Serialize)]
        struct StoreMatchRequest<'a> {
            chain_id: u64,
            address: Address,
            contract: &'a CheckedContract,
            outcome: &'a VerificationOutcome,
        }

        let url = format!("{}/matches", self.base_url);
        self.client
            .post(url)
            .json(&StoreMatchRequest { chain_id, address, contract, outcome })
            .send()
            .await
            .map_err(|err| MonitorError::Repository(err.to_string()))?
            .error_for_status()
            .map_err(|err| MonitorError::Repository(err.to_string()))?;

        Ok(())
    }
}

/// [`VerificationService`] backed by a JSON HTTP verification API.
#[derive(Debug)]
pub struct HttpVerificationService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpVerificationService {
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self { client: build_client(timeout), base_url: base_url.into() }
    }
}

#[async_trait]
impl VerificationService for HttpVerificationService {
    #[instrument(skip(self, contract))]
    async fn verify_deployed(
        &self,
        contract: &CheckedContract,
        chain_id: u64,
        address: Address,
        creator_tx_hash: B256,
    ) -> Result<VerificationOutcome> {
        #[derive(Serialize)]
        struct VerifyRequest<'a> {
            contract: &'a CheckedContract,
            chain_id: u64,
            address: Address,
            creator_tx_hash: B256,
        }

        let url = format!("{}/verify", self.base_url);
        let outcome = self
            .client
            .post(url)
            .json(&VerifyRequest { contract, chain_id, address, creator_tx_hash })
            .send()
            .await
            .map_err(|err| MonitorError::Verification(err.to_string()))?
            .error_for_status()
            .map_err(|err| MonitorError::Verification(err.to_string()))?
            .json::<VerificationOutcome>()
            .await
            .map_err(|err| MonitorError::Verification(err.to_string()))?;

        Ok(outcome)
    }
}

/// [`SourceFetcher`] backed by a JSON HTTP source-assembly API.
#[derive(Debug)]
pub struct HttpSourceFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSourceFetcher {
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self { client: build_client(timeout), base_url: base_url.into() }
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    #[instrument(skip(self))]
    async fn assemble(&self, source_address: SourceAddress) -> Result<CheckedContract> {
        let url = format!("{}/assemble", self.base_url);
        let contract = self
            .client
            .post(url)
            .json(&source_address)
            .send()
            .await
            .map_err(|err| MonitorError::SourceAssembly(err.to_string()))?
            .error_for_status()
            .map_err(|err| MonitorError::SourceAssembly(err.to_string()))?
            .json::<CheckedContract>()
            .await
            .map_err(|err| MonitorError::SourceAssembly(err.to_string()))?;

        Ok(contract)
    }

    async fn stop(&self) -> Result<()> {
        let url = format!("{}/stop", self.base_url);
        let _ = self.client.post(url).send().await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use alloy::primitives::{Address, B256};
    use monitor_core::SourceAddress;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn check_by_chain_and_address_true_on_non_empty_match_list() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{"id": 1}])))
            .mount(&mock_server)
            .await;

        let repository = HttpRepository::new(mock_server.uri(), Duration::from_secs(5));
        let verified = repository
            .check_by_chain_and_address(1, Address::ZERO)
            .await
            .unwrap();

        assert!(verified);
    }

    #[tokio::test]
    async fn check_by_chain_and_address_false_on_404() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let repository = HttpRepository::new(mock_server.uri(), Duration::from_secs(5));
        let verified = repository
            .check_by_chain_and_address(1, Address::ZERO)
            .await
            .unwrap();

        assert!(!verified);
    }

    #[tokio::test]
    async fn store_match_posts_to_matches_endpoint() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/matches"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let repository = HttpRepository::new(mock_server.uri(), Duration::from_secs(5));
        let contract = CheckedContract {
            source_address: SourceAddress(serde_json::json!({"ipfs": "bafy..."})),
            payload: serde_json::json!({}),
        };
        let outcome = VerificationOutcome { matched: true, receipt: serde_json::json!({}) };

        repository
            .store_match(1, Address::ZERO, &contract, &outcome)
            .await
            .expect("store_match should succeed against a mounted mock");
    }

    #[tokio::test]
    async fn verify_deployed_returns_the_decoded_outcome() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "matched": true,
                "receipt": {"id": "r1"}
            })))
            .mount(&mock_server)
            .await;

        let verification = HttpVerificationService::new(mock_server.uri(), Duration::from_secs(5));
        let contract = CheckedContract {
            source_address: SourceAddress(serde_json::json!({"ipfs": "bafy..."})),
            payload: serde_json::json!({}),
        };

        let outcome = verification
            .verify_deployed(&contract, 1, Address::ZERO, B256::ZERO)
            .await
            .unwrap();

        assert!(outcome.matched);
    }

    #[tokio::test]
    async fn verify_deployed_maps_server_error_to_verification_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let verification = HttpVerificationService::new(mock_server.uri(), Duration::from_secs(5));
        let contract = CheckedContract {
            source_address: SourceAddress(serde_json::json!({"ipfs": "bafy..."})),
            payload: serde_json::json!({}),
        };

        let result = verification.verify_deployed(&contract, 1, Address::ZERO, B256::ZERO).await;

        assert!(matches!(result, Err(MonitorError::Verification(_))));
    }

    #[tokio::test]
    async fn assemble_returns_the_fetched_contract() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/assemble"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "source_address": {"ipfs": "bafy..."},
                "payload": {"files": []}
            })))
            .mount(&mock_server)
            .await;

        let fetcher = HttpSourceFetcher::new(mock_server.uri(), Duration::from_secs(5));
        let contract = fetcher
            .assemble(SourceAddress(serde_json::json!({"ipfs": "bafy..."})))
            .await
            .unwrap();

        assert_eq!(contract.payload, serde_json::json!({"files": []}));
    }

    #[tokio::test]
    async fn stop_does_not_fail_when_the_endpoint_is_unreachable() {
        let fetcher = HttpSourceFetcher::new("http://127.0.0.1:0", Duration::from_millis(50));
        fetcher.stop().await.unwrap();
    }
}
