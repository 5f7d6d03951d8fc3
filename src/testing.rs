//! In-memory chain and notifier used by the unit tests.

use crate::chain::{
    Chain, ConfirmationStatus, ContractCall, PreparedTransaction, TransactionOutcome,
};
use crate::contracts::IERC20;
use crate::error::ChainError;
use crate::notify::{ExplorerLink, NotificationKey, Notifier};
use alloy::sol_types::SolCall;
use alloy_primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Simulate,
    Submit,
    Confirm,
    Read,
}

#[derive(Default)]
struct FakeState {
    balances: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
    counts: HashMap<CallKind, usize>,
    simulated: Vec<ContractCall>,
    failures: HashMap<(CallKind, &'static str), ChainError>,
    reverts: HashSet<&'static str>,
    gates: HashMap<&'static str, Arc<Notify>>,
    pending: HashMap<TxHash, ContractCall>,
    nonce: u64,
}

/// Chain double that applies `approve` and `mint` effects on confirmation.
#[derive(Default)]
pub struct FakeChain {
    state: Mutex<FakeState>,
}

impl FakeChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn set_balance(&self, token: Address, account: Address, value: U256) {
        self.state().balances.insert((token, account), value);
    }

    pub fn balance(&self, token: Address, account: Address) -> U256 {
        self.state()
            .balances
            .get(&(token, account))
            .copied()
            .unwrap_or_default()
    }

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, value: U256) {
        self.state().allowances.insert((token, owner, spender), value);
    }

    /// Make every `kind` call to `function` fail with `error`.
    pub fn fail(&self, kind: CallKind, function: &'static str, error: ChainError) {
        self.state().failures.insert((kind, function), error);
    }

    /// Mine calls to `function` with a failed receipt.
    pub fn revert_on_chain(&self, function: &'static str) {
        self.state().reverts.insert(function);
    }

    /// Block confirmations of `function` until the returned handle is notified.
    pub fn hold_confirmations(&self, function: &'static str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state().gates.insert(function, gate.clone());
        gate
    }

    pub fn count(&self, kind: CallKind) -> usize {
        self.state().counts.get(&kind).copied().unwrap_or(0)
    }

    /// Calls that reached simulation, in order.
    pub fn simulated(&self) -> Vec<ContractCall> {
        self.state().simulated.clone()
    }

    fn enter(&self, kind: CallKind, function: &'static str) -> Result<(), ChainError> {
        let mut state = self.state();
        *state.counts.entry(kind).or_default() += 1;
        match state.failures.get(&(kind, function)) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn apply(&self, call: &ContractCall) {
        let mut state = self.state();
        let Some(caller) = call.caller else {
            return;
        };
        if let Ok(approve) = IERC20::approveCall::abi_decode(&call.calldata) {
            state
                .allowances
                .insert((call.target, caller, approve.spender), approve.amount);
        } else if let Ok(mint) = IERC20::mintCall::abi_decode(&call.calldata) {
            *state.balances.entry((call.target, mint.to)).or_default() += mint.amount;
        }
    }
}

fn encode_uint(value: U256) -> Bytes {
    Bytes::from(value.to_be_bytes::<32>().to_vec())
}

#[async_trait]
impl Chain for FakeChain {
    async fn simulate(&self, call: &ContractCall) -> Result<PreparedTransaction, ChainError> {
        self.enter(CallKind::Simulate, call.function)?;
        self.state().simulated.push(call.clone());
        Ok(PreparedTransaction {
            call: call.clone(),
            gas_limit: 100_000,
        })
    }

    async fn submit(&self, request: PreparedTransaction) -> Result<TxHash, ChainError> {
        self.enter(CallKind::Submit, request.call.function)?;
        let mut state = self.state();
        state.nonce += 1;
        let hash = TxHash::from(U256::from(state.nonce).to_be_bytes::<32>());
        state.pending.insert(hash, request.call);
        Ok(hash)
    }

    async fn wait_for_confirmation(&self, hash: TxHash) -> Result<TransactionOutcome, ChainError> {
        let (call, gate) = {
            let mut state = self.state();
            let call = state
                .pending
                .remove(&hash)
                .ok_or_else(|| ChainError::Rpc(format!("unknown transaction {hash}")))?;
            let gate = state.gates.get(call.function).cloned();
            (call, gate)
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.enter(CallKind::Confirm, call.function)?;

        let reverted = self.state().reverts.contains(call.function);
        let status = if reverted {
            ConfirmationStatus::Reverted
        } else {
            self.apply(&call);
            ConfirmationStatus::Success
        };
        Ok(TransactionOutcome {
            hash,
            status,
            block_number: Some(1),
        })
    }

    async fn read(&self, call: &ContractCall) -> Result<Bytes, ChainError> {
        self.enter(CallKind::Read, call.function)?;
        let state = self.state();
        if let Ok(query) = IERC20::balanceOfCall::abi_decode(&call.calldata) {
            let value = state
                .balances
                .get(&(call.target, query.account))
                .copied()
                .unwrap_or_default();
            return Ok(encode_uint(value));
        }
        if let Ok(query) = IERC20::allowanceCall::abi_decode(&call.calldata) {
            let value = state
                .allowances
                .get(&(call.target, query.owner, query.spender))
                .copied()
                .unwrap_or_default();
            return Ok(encode_uint(value));
        }
        Err(ChainError::Rpc(format!("unsupported read {}", call.function)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Loading {
        key: NotificationKey,
        message: String,
        description: Option<String>,
    },
    Success {
        title: String,
        description: String,
        link: Option<ExplorerLink>,
    },
    Error {
        title: String,
        description: Option<String>,
    },
    Dismiss {
        key: NotificationKey,
    },
}

#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().unwrap().clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Notification::Success { title, .. } => Some(title),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<(String, Option<String>)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Notification::Error { title, description } => Some((title, description)),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Notification) {
        self.events.lock().unwrap().push(event);
    }
}

impl Notifier for RecordingNotifier {
    fn loading(&self, key: &NotificationKey, message: &str, description: Option<&str>) {
        self.push(Notification::Loading {
            key: *key,
            message: message.to_string(),
            description: description.map(str::to_string),
        });
    }

    fn success(&self, title: &str, description: &str, link: Option<&ExplorerLink>) {
        self.push(Notification::Success {
            title: title.to_string(),
            description: description.to_string(),
            link: link.cloned(),
        });
    }

    fn error(&self, title: &str, description: Option<&str>) {
        self.push(Notification::Error {
            title: title.to_string(),
            description: description.map(str::to_string),
        });
    }

    fn dismiss(&self, key: &NotificationKey) {
        self.push(Notification::Dismiss { key: *key });
    }
}
