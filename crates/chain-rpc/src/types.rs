//! Shapes handed back from a [`crate::ChainRpc`] implementation.

use alloy::primitives::{Address, B256};

/// A fetched block, narrowed to the fields a creation-scanning loop needs.
#[derive(Debug, Clone)]
pub struct RpcBlock {
    /// Block number.
    pub number: u64,
    /// Transactions in the block's declared order.
    pub transactions: Vec<RpcTransaction>,
}

/// A single transaction, narrowed to the fields needed to detect and derive
/// a contract-creation address.
#[derive(Debug, Clone)]
pub struct RpcTransaction {
    /// Transaction hash.
    pub hash: B256,
    /// Destination address; `None` marks a contract-creation transaction.
    pub to: Option<Address>,
    /// Sender address.
    pub from: Address,
    /// Sender's nonce at the time this transaction executed.
    pub nonce: u64,
}

impl RpcTransaction {
    /// Whether this transaction creates a contract.
    #[must_use]
    pub const fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }

    /// The deterministic address a creation transaction deploys to.
    ///
    /// Standard `sender + nonce` derivation; meaningless if this is not a
    /// creation transaction.
    #[must_use]
    pub fn deployed_address(&self) -> Address {
        self.from.create(self.nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_transaction_has_no_destination() {
        let tx = RpcTransaction {
            hash: B256::ZERO,
            to: None,
            from: Address::ZERO,
            nonce: 0,
        };
        assert!(tx.is_contract_creation());
    }

    #[test]
    fn non_creation_transaction_reports_false() {
        let tx = RpcTransaction {
            hash: B256::ZERO,
            to: Some(Address::ZERO),
            from: Address::ZERO,
            nonce: 0,
        };
        assert!(!tx.is_contract_creation());
    }
}
