use crate::actions::{Action, Stage};
use alloy_primitives::{Bytes, TxHash};
use thiserror::Error;

/// Failures reported by the chain interaction layer.
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    #[error("execution reverted: {message}")]
    Reverted {
        message: String,
        data: Option<Bytes>,
    },

    #[error("transaction {0} reverted on-chain")]
    RevertedOnChain(TxHash),

    #[error("timed out waiting for confirmation of {0}")]
    Timeout(TxHash),

    #[error("user rejected the request: {0}")]
    Rejected(String),

    #[error("no signer configured for the connected account")]
    NoSigner,

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("failed to decode contract response: {0}")]
    Decode(String),
}

impl ChainError {
    pub fn revert_data(&self) -> Option<&Bytes> {
        match self {
            ChainError::Reverted { data, .. } => data.as_ref(),
            _ => None,
        }
    }
}

/// Outcome of a rejected or failed orchestrator invocation.
#[derive(Debug, Error)]
pub enum TxError {
    #[error("wallet not connected")]
    WalletNotConnected,

    #[error("amount must be greater than 0")]
    InvalidAmount,

    #[error("vault contract address is not configured")]
    VaultNotConfigured,

    #[error("{0} is already in progress")]
    AlreadyInFlight(Action),

    #[error("{action} failed while {stage}: {message}")]
    Failed {
        action: Action,
        stage: Stage,
        message: String,
        #[source]
        source: ChainError,
    },
}

impl TxError {
    /// True when the invocation was rejected before any network call.
    pub fn is_precondition(&self) -> bool {
        !matches!(self, TxError::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("invalid amount: {0:?}")]
    Malformed(String),

    #[error("amount {input:?} has more than {decimals} fractional digits")]
    TooPrecise { input: String, decimals: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_classification() {
        assert!(TxError::WalletNotConnected.is_precondition());
        assert!(TxError::InvalidAmount.is_precondition());
        assert!(TxError::VaultNotConfigured.is_precondition());
        assert!(TxError::AlreadyInFlight(Action::Deposit).is_precondition());

        let failed = TxError::Failed {
            action: Action::Deposit,
            stage: Stage::Simulating,
            message: "Insufficient Allowance".to_string(),
            source: ChainError::Rpc("boom".to_string()),
        };
        assert!(!failed.is_precondition());
    }

    #[test]
    fn test_error_display() {
        let err = TxError::Failed {
            action: Action::Withdraw,
            stage: Stage::Confirming,
            message: "Transaction was rejected by user".to_string(),
            source: ChainError::Rejected("denied".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "withdraw failed while confirming: Transaction was rejected by user"
        );
        assert_eq!(
            ChainError::Rpc("connection refused".to_string()).to_string(),
            "RPC error: connection refused"
        );
    }
}
