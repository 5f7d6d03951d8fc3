use super::{Action, CONFIRMING_MESSAGE, Stage, TxState};
use crate::amount::TokenAmount;
use crate::chain::{Chain, ConfirmationStatus, ContractCall, TransactionOutcome};
use crate::classify::parse_contract_error;
use crate::error::{ChainError, TxError};
use crate::notify::{Explorer, NotificationKey, Notifier};
use crate::readers::AllowanceReader;
use crate::wallet::WalletProvider;
use alloy_primitives::Address;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info, warn};

/// Contracts the orchestrator acts on.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    pub token: Address,
    pub vault: Option<Address>,
    pub explorer: Explorer,
}

/// Runs contract actions through simulate, submit and confirm, keeping the
/// user informed through a [`Notifier`].
pub struct Orchestrator {
    pub(super) chain: Arc<dyn Chain>,
    pub(super) wallet: Arc<dyn WalletProvider>,
    pub(super) notifier: Arc<dyn Notifier>,
    pub(super) config: VaultConfig,
    pub(super) allowance: AllowanceReader,
    states: Mutex<HashMap<Action, TxState>>,
    in_flight: Mutex<HashSet<Action>>,
}

/// Marks an action kind as in flight until dropped.
pub(super) struct InFlight<'a> {
    set: &'a Mutex<HashSet<Action>>,
    action: Action,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.set).remove(&self.action);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Orchestrator {
    pub fn new(
        chain: Arc<dyn Chain>,
        wallet: Arc<dyn WalletProvider>,
        notifier: Arc<dyn Notifier>,
        config: VaultConfig,
    ) -> Self {
        let allowance =
            AllowanceReader::new(chain.clone(), wallet.clone(), config.token, config.vault);
        Orchestrator {
            chain,
            wallet,
            notifier,
            config,
            allowance,
            states: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// State of the latest invocation of `action`.
    pub fn state(&self, action: Action) -> TxState {
        lock(&self.states).get(&action).copied().unwrap_or_default()
    }

    pub fn is_pending(&self, action: Action) -> bool {
        lock(&self.in_flight).contains(&action)
    }

    /// True while any action is in flight.
    pub fn is_loading(&self) -> bool {
        !lock(&self.in_flight).is_empty()
    }

    pub(super) fn ensure_wallet(&self) -> Result<Address, TxError> {
        self.wallet.account().ok_or_else(|| {
            self.notifier.error(
                "Wallet not connected",
                Some("Please connect your wallet to continue."),
            );
            TxError::WalletNotConnected
        })
    }

    pub(super) fn ensure_amount(&self, amount: TokenAmount) -> Result<(), TxError> {
        if amount.is_zero() {
            self.notifier.error(
                "Invalid amount",
                Some("Please enter a valid amount greater than 0."),
            );
            return Err(TxError::InvalidAmount);
        }
        Ok(())
    }

    pub(super) fn ensure_vault(&self) -> Result<Address, TxError> {
        self.config.vault.ok_or_else(|| {
            self.notifier.error(
                "Contract not found",
                Some("Vault contract address is not configured."),
            );
            TxError::VaultNotConfigured
        })
    }

    pub(super) fn begin(&self, action: Action) -> Result<InFlight<'_>, TxError> {
        if !lock(&self.in_flight).insert(action) {
            warn!("Rejected {}: an invocation is already in flight", action);
            self.notifier.error(
                "Transaction in progress",
                Some("Wait for the current transaction to finish."),
            );
            return Err(TxError::AlreadyInFlight(action));
        }
        Ok(InFlight {
            set: &self.in_flight,
            action,
        })
    }

    fn transition(&self, action: Action, state: TxState) {
        lock(&self.states).insert(action, state);
    }

    /// Simulate, submit and confirm `call`, reporting progress under a fresh key.
    pub(super) async fn execute(
        &self,
        action: Action,
        call: ContractCall,
    ) -> Result<TransactionOutcome, TxError> {
        let _in_flight = self.begin(action)?;
        self.run(action, call).await
    }

    /// Like [`Self::execute`], for a caller already holding the action's [`InFlight`] slot.
    pub(super) async fn run(
        &self,
        action: Action,
        call: ContractCall,
    ) -> Result<TransactionOutcome, TxError> {
        let key = NotificationKey::next(action);
        info!(key = %key, "Starting {} on {:?}", action, call.target);

        self.transition(action, TxState::Simulating);
        let (message, description) = action.simulating_message();
        self.notifier.loading(&key, message, description);
        let request = self
            .chain
            .simulate(&call)
            .await
            .map_err(|e| self.fail(&key, Stage::Simulating, e))?;

        self.transition(action, TxState::Submitting);
        let (message, description) = action.submitting_message();
        self.notifier.loading(&key, message, description);
        let hash = self
            .chain
            .submit(request)
            .await
            .map_err(|e| self.fail(&key, Stage::Submitting, e))?;

        self.transition(action, TxState::Confirming);
        let tx_url = self.config.explorer.tx_url(&hash);
        self.notifier
            .loading(&key, CONFIRMING_MESSAGE, Some(tx_url.as_str()));
        let outcome = self
            .chain
            .wait_for_confirmation(hash)
            .await
            .and_then(|outcome| match outcome.status {
                ConfirmationStatus::Success => Ok(outcome),
                ConfirmationStatus::Reverted => Err(ChainError::RevertedOnChain(outcome.hash)),
            })
            .map_err(|e| self.fail(&key, Stage::Confirming, e))?;

        self.transition(action, TxState::Succeeded);
        self.notifier.dismiss(&key);
        let (title, description) = action.success_message();
        let link = self.config.explorer.link(&outcome.hash);
        self.notifier.success(title, description, Some(&link));
        info!(
            key = %key,
            "{} confirmed in block {:?}: {}",
            action, outcome.block_number, outcome.hash
        );

        Ok(outcome)
    }

    fn fail(&self, key: &NotificationKey, stage: Stage, source: ChainError) -> TxError {
        let action = key.action;
        self.transition(action, TxState::Failed(stage));
        self.notifier.dismiss(key);

        let message = parse_contract_error(&source);
        match action.failure_title() {
            Some(title) => self.notifier.error(title, Some(message)),
            None => self.notifier.error(message, None),
        }
        error!(key = %key, "{} failed while {}: {}", action, stage, source);

        TxError::Failed {
            action,
            stage,
            message: message.to_string(),
            source,
        }
    }

    /// Re-read the allowance after an approval-changing transaction.
    pub async fn refresh_allowance(&self) -> Result<TokenAmount, ChainError> {
        self.allowance.refresh().await
    }

    pub(super) async fn refresh_allowance_after(&self, action: Action) {
        if let Err(e) = self.refresh_allowance().await {
            warn!("Failed to refresh allowance after {}: {}", action, e);
        }
    }
}
