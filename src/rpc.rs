use crate::chain::{
    Chain, ConfirmationStatus, ContractCall, PreparedTransaction, TransactionOutcome,
};
use crate::error::ChainError;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::providers::{
    DynProvider, PendingTransactionBuilder, PendingTransactionError, Provider, ProviderBuilder,
    WatchTxError,
};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::TransportError;
use alloy_primitives::{Address, Bytes, TxHash};
use anyhow::Result;
use async_trait::async_trait;
use std::future::IntoFuture;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Phrases wallets and nodes use when a signing request is refused.
const REJECTION_MARKERS: [&str; 3] = ["user rejected", "user denied", "rejected the request"];

#[derive(Clone)]
pub struct RpcClient {
    provider: DynProvider,
    url: String,
    signer: Option<Address>,
    confirmation_timeout: Duration,
}

impl RpcClient {
    pub fn new(
        rpc_url: &str,
        signer: Option<PrivateKeySigner>,
        confirmation_timeout: Duration,
    ) -> Result<Self> {
        let parsed_url = rpc_url
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid RPC URL: {}", rpc_url))?;

        let signer_address = signer.as_ref().map(|s| s.address());
        let provider = match signer {
            Some(signer) => ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect_http(parsed_url)
                .erased(),
            None => ProviderBuilder::new().connect_http(parsed_url).erased(),
        };

        Ok(RpcClient {
            provider,
            url: rpc_url.to_string(),
            signer: signer_address,
            confirmation_timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn signer_address(&self) -> Option<Address> {
        self.signer
    }

    fn to_request(call: &ContractCall) -> TransactionRequest {
        let request = TransactionRequest::default()
            .with_to(call.target)
            .with_input(call.calldata.clone());
        match call.caller {
            Some(caller) => request.with_from(caller),
            None => request,
        }
    }

    async fn with_timeout<T, F>(&self, future: F) -> Result<T, ChainError>
    where
        F: IntoFuture<Output = Result<T, TransportError>>,
    {
        match timeout(REQUEST_TIMEOUT, future).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                let error = classify_transport_error(e);
                warn!("RPC error on {}: {}", self.url, error);
                Err(error)
            }
            Err(_) => {
                warn!(
                    "Request timeout after {} seconds on {}",
                    REQUEST_TIMEOUT.as_secs(),
                    self.url
                );
                Err(ChainError::Rpc(format!(
                    "Request timeout after {} seconds",
                    REQUEST_TIMEOUT.as_secs()
                )))
            }
        }
    }
}

#[async_trait]
impl Chain for RpcClient {
    async fn simulate(&self, call: &ContractCall) -> Result<PreparedTransaction, ChainError> {
        let request = Self::to_request(call);

        debug!("Simulating {} on {:?}", call.function, call.target);
        self.with_timeout(self.provider.call(request.clone())).await?;
        let gas_limit = self.with_timeout(self.provider.estimate_gas(request)).await?;

        Ok(PreparedTransaction {
            call: call.clone(),
            gas_limit,
        })
    }

    async fn submit(&self, request: PreparedTransaction) -> Result<TxHash, ChainError> {
        let signer = self.signer.ok_or(ChainError::NoSigner)?;
        if request.call.caller.is_some_and(|caller| caller != signer) {
            return Err(ChainError::Rejected(format!(
                "signer {signer:?} cannot send on behalf of another account"
            )));
        }

        let tx = Self::to_request(&request.call)
            .with_from(signer)
            .with_gas_limit(request.gas_limit);

        let pending = self.with_timeout(self.provider.send_transaction(tx)).await?;
        let hash = *pending.tx_hash();
        info!("Broadcast {} as {}", request.call.function, hash);
        Ok(hash)
    }

    async fn wait_for_confirmation(&self, hash: TxHash) -> Result<TransactionOutcome, ChainError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), hash)
            .with_timeout(Some(self.confirmation_timeout))
            .get_receipt()
            .await
            .map_err(|e| match e {
                PendingTransactionError::TxWatcher(WatchTxError::Timeout) => {
                    ChainError::Timeout(hash)
                }
                other => ChainError::Rpc(other.to_string()),
            })?;

        let status = if receipt.status() {
            ConfirmationStatus::Success
        } else {
            ConfirmationStatus::Reverted
        };
        debug!("Receipt for {}: {:?}", hash, status);

        Ok(TransactionOutcome {
            hash,
            status,
            block_number: receipt.block_number,
        })
    }

    async fn read(&self, call: &ContractCall) -> Result<Bytes, ChainError> {
        let request = Self::to_request(call);
        self.with_timeout(self.provider.call(request)).await
    }
}

/// Map a transport failure onto the chain error taxonomy, keeping revert data.
fn classify_transport_error(error: TransportError) -> ChainError {
    if let Some(payload) = error.as_error_resp() {
        let message = payload.message.to_string();
        let data = payload.as_revert_data();
        if data.is_some() || message.contains("revert") {
            return ChainError::Reverted { message, data };
        }
        if is_rejection(&message) {
            return ChainError::Rejected(message);
        }
        return ChainError::Rpc(message);
    }

    let message = error.to_string();
    if is_rejection(&message) {
        ChainError::Rejected(message)
    } else {
        ChainError::Rpc(message)
    }
}

fn is_rejection(message: &str) -> bool {
    let lower = message.to_lowercase();
    REJECTION_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_rejected() {
        let result = RpcClient::new("not a url", None, Duration::from_secs(1));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_submit_without_signer() {
        let client =
            RpcClient::new("http://127.0.0.1:8545", None, Duration::from_secs(1)).unwrap();
        assert_eq!(client.signer_address(), None);

        let request = PreparedTransaction {
            call: ContractCall {
                target: Address::ZERO,
                function: "approve(address,uint256)",
                calldata: Bytes::new(),
                caller: None,
            },
            gas_limit: 21_000,
        };
        let result = client.submit(request).await;
        assert!(matches!(result, Err(ChainError::NoSigner)));
    }

    #[test]
    fn test_is_rejection() {
        assert!(is_rejection("User rejected the request."));
        assert!(is_rejection("MetaMask Tx Signature: User denied transaction signature"));
        assert!(!is_rejection("nonce too low"));
    }

    #[test]
    fn test_signer_address_recorded() {
        let signer = PrivateKeySigner::random();
        let expected = signer.address();
        let client =
            RpcClient::new("http://127.0.0.1:8545", Some(signer), Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.signer_address(), Some(expected));
        assert_eq!(client.url(), "http://127.0.0.1:8545");
    }
}
