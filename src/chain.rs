use crate::error::ChainError;
use alloy::sol_types::SolCall;
use alloy_primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;
use serde::Serialize;

/// A contract call before it has been validated against chain state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub target: Address,
    pub function: &'static str,
    pub calldata: Bytes,
    pub caller: Option<Address>,
}

impl ContractCall {
    pub fn new<C: SolCall>(target: Address, caller: Option<Address>, call: C) -> Self {
        ContractCall {
            target,
            function: C::SIGNATURE,
            calldata: call.abi_encode().into(),
            caller,
        }
    }

    pub fn read<C: SolCall>(target: Address, call: C) -> Self {
        Self::new(target, None, call)
    }
}

/// A call that survived simulation and is ready to be signed and broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTransaction {
    pub call: ContractCall,
    pub gas_limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationStatus {
    Success,
    Reverted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionOutcome {
    pub hash: TxHash,
    pub status: ConfirmationStatus,
    pub block_number: Option<u64>,
}

/// Chain primitives consumed by the orchestrators and readers.
#[async_trait]
pub trait Chain: Send + Sync {
    /// Dry-run `call` against the latest state and return the concrete request.
    async fn simulate(&self, call: &ContractCall) -> Result<PreparedTransaction, ChainError>;

    /// Sign and broadcast a simulated request.
    async fn submit(&self, request: PreparedTransaction) -> Result<TxHash, ChainError>;

    async fn wait_for_confirmation(&self, hash: TxHash) -> Result<TransactionOutcome, ChainError>;

    async fn read(&self, call: &ContractCall) -> Result<Bytes, ChainError>;
}

/// Execute a view call and decode its return value.
pub async fn read_contract<C: SolCall>(
    chain: &dyn Chain,
    target: Address,
    call: C,
) -> Result<C::Return, ChainError> {
    let raw = chain.read(&ContractCall::read(target, call)).await?;
    C::abi_decode_returns(&raw).map_err(|e| ChainError::Decode(e.to_string()))
}
