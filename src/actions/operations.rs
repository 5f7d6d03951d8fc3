use super::orchestrator::Orchestrator;
use super::{Action, Stage};
use crate::amount::TokenAmount;
use crate::chain::{ContractCall, TransactionOutcome};
use crate::classify::parse_contract_error;
use crate::contracts::{IERC20, IVault, MAX_UINT256};
use crate::error::TxError;
use alloy_primitives::{Address, U256};
use serde::Serialize;
use tracing::{error, info};

/// Transactions performed by [`Orchestrator::deposit_with_approval_check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositReceipt {
    pub approval: Option<TransactionOutcome>,
    pub deposit: TransactionOutcome,
}

impl Orchestrator {
    /// Approve the vault to spend exactly `amount` of the token.
    pub async fn approve(&self, amount: TokenAmount) -> Result<TransactionOutcome, TxError> {
        let account = self.ensure_wallet()?;
        self.ensure_amount(amount)?;
        let spender = self.ensure_vault()?;

        self.set_allowance(Action::Approve, account, spender, amount.raw())
            .await
    }

    pub async fn approve_max(&self) -> Result<TransactionOutcome, TxError> {
        let account = self.ensure_wallet()?;
        let spender = self.ensure_vault()?;

        self.set_allowance(Action::ApproveMax, account, spender, MAX_UINT256)
            .await
    }

    pub async fn reset_allowance(&self) -> Result<TransactionOutcome, TxError> {
        let account = self.ensure_wallet()?;
        let spender = self.ensure_vault()?;

        self.set_allowance(Action::ResetAllowance, account, spender, U256::ZERO)
            .await
    }

    async fn set_allowance(
        &self,
        action: Action,
        account: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TransactionOutcome, TxError> {
        let call = ContractCall::new(
            self.config.token,
            Some(account),
            IERC20::approveCall { spender, amount },
        );
        let outcome = self.execute(action, call).await?;
        self.refresh_allowance_after(action).await;
        Ok(outcome)
    }

    /// Deposit `amount` into the vault, crediting shares to the connected account.
    pub async fn deposit(&self, amount: TokenAmount) -> Result<TransactionOutcome, TxError> {
        let account = self.ensure_wallet()?;
        self.ensure_amount(amount)?;
        let vault = self.ensure_vault()?;

        self.execute(Action::Deposit, deposit_call(vault, account, amount)).await
    }

    /// Deposit, approving exactly `amount` first when the allowance is short.
    ///
    /// The allowance is re-read for the connected account before deciding.
    /// A failed approval aborts without attempting the deposit.
    pub async fn deposit_with_approval_check(
        &self,
        amount: TokenAmount,
    ) -> Result<DepositReceipt, TxError> {
        let account = self.ensure_wallet()?;
        self.ensure_amount(amount)?;
        let vault = self.ensure_vault()?;
        // Held across the approval so a running deposit blocks it before anything is sent.
        let _deposit_slot = self.begin(Action::Deposit)?;

        if let Err(source) = self.allowance.refresh().await {
            let message = parse_contract_error(&source);
            self.notifier.error(message, None);
            error!("Failed to read allowance before deposit: {}", source);
            return Err(TxError::Failed {
                action: Action::Deposit,
                stage: Stage::CheckingAllowance,
                message: message.to_string(),
                source,
            });
        }
        let current = self
            .allowance
            .current()
            .filter(|allowance| allowance.owner == account)
            .map(|allowance| allowance.amount)
            .unwrap_or_default();

        let approval = if amount > current {
            info!(
                "Allowance {} is below {}, approving before deposit",
                current, amount
            );
            Some(self.approve(amount).await?)
        } else {
            None
        };

        let deposit = self
            .run(Action::Deposit, deposit_call(vault, account, amount))
            .await?;
        Ok(DepositReceipt { approval, deposit })
    }

    /// Redeem vault shares worth `amount` of the token back to the connected account.
    pub async fn withdraw(&self, amount: TokenAmount) -> Result<TransactionOutcome, TxError> {
        let account = self.ensure_wallet()?;
        self.ensure_amount(amount)?;
        let vault = self.ensure_vault()?;

        let call = ContractCall::new(
            vault,
            Some(account),
            IVault::withdrawCall {
                assets: amount.raw(),
                receiver: account,
                owner: account,
            },
        );
        self.execute(Action::Withdraw, call).await
    }

    /// Mint test tokens to the connected account.
    pub async fn mint(&self, amount: TokenAmount) -> Result<TransactionOutcome, TxError> {
        let account = self.ensure_wallet()?;
        self.ensure_amount(amount)?;

        let call = ContractCall::new(
            self.config.token,
            Some(account),
            IERC20::mintCall {
                to: account,
                amount: amount.raw(),
            },
        );
        self.execute(Action::Mint, call).await
    }

    /// Cached allowance of the connected account.
    pub fn allowance(&self) -> TokenAmount {
        self.allowance.allowance()
    }

    pub fn needs_approval(&self, amount: TokenAmount) -> bool {
        amount > self.allowance()
    }
}

fn deposit_call(vault: Address, account: Address, amount: TokenAmount) -> ContractCall {
    ContractCall::new(
        vault,
        Some(account),
        IVault::depositCall {
            assets: amount.raw(),
            receiver: account,
        },
    )
}
