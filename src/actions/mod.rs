pub mod operations;
pub mod orchestrator;

pub use operations::DepositReceipt;
pub use orchestrator::{Orchestrator, VaultConfig};

use serde::Serialize;
use std::fmt;

pub const CONFIRMING_MESSAGE: &str = "Waiting for confirmation...";

/// Contract actions a user can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Approve,
    ApproveMax,
    ResetAllowance,
    Deposit,
    Withdraw,
    Mint,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Approve,
        Action::ApproveMax,
        Action::ResetAllowance,
        Action::Deposit,
        Action::Withdraw,
        Action::Mint,
    ];

    /// Fixed notification key of the action kind.
    pub fn notification_key(self) -> &'static str {
        match self {
            Action::Approve => "approve-toast",
            Action::ApproveMax => "approve-max-toast",
            Action::ResetAllowance => "reset-allowance-toast",
            Action::Deposit => "deposit-loading",
            Action::Withdraw => "withdraw-loading",
            Action::Mint => "mint-toast",
        }
    }

    pub fn requires_amount(self) -> bool {
        !matches!(self, Action::ApproveMax | Action::ResetAllowance)
    }

    /// Whether the action needs the vault address, as target or as spender.
    pub fn requires_vault(self) -> bool {
        !matches!(self, Action::Mint)
    }

    pub fn changes_allowance(self) -> bool {
        matches!(
            self,
            Action::Approve | Action::ApproveMax | Action::ResetAllowance
        )
    }

    pub fn simulating_message(self) -> (&'static str, Option<&'static str>) {
        const VALIDATING: Option<&str> = Some("Validating transaction before sending...");
        match self {
            Action::Approve => ("Simulating approval...", None),
            Action::ApproveMax => ("Simulating unlimited approval...", VALIDATING),
            Action::ResetAllowance => ("Simulating allowance reset...", VALIDATING),
            Action::Deposit => ("Simulating deposit...", None),
            Action::Withdraw => ("Simulating withdraw...", None),
            Action::Mint => ("Simulating mint...", None),
        }
    }

    pub fn submitting_message(self) -> (&'static str, Option<&'static str>) {
        match self {
            Action::Approve => ("Requesting approval...", None),
            Action::ApproveMax => (
                "Requesting unlimited approval...",
                Some("This allows unlimited deposits without future approvals."),
            ),
            Action::ResetAllowance => (
                "Resetting allowance to 0...",
                Some("This will revoke all previous approvals."),
            ),
            Action::Deposit => ("Processing deposit...", None),
            Action::Withdraw => ("Processing withdraw...", None),
            Action::Mint => ("Minting token...", None),
        }
    }

    pub fn success_message(self) -> (&'static str, &'static str) {
        match self {
            Action::Approve => (
                "Approval successful!",
                "You can now proceed with the deposit.",
            ),
            Action::ApproveMax => ("Approval successful!", "Unlimited approval granted."),
            Action::ResetAllowance => (
                "Allowance reset",
                "All previous approvals have been revoked.",
            ),
            Action::Deposit => (
                "Deposit successful!",
                "Your tokens have been deposited to the vault.",
            ),
            Action::Withdraw => (
                "Withdraw successful!",
                "Your tokens have been withdrawn from the vault.",
            ),
            Action::Mint => ("Mint successful!", "You minted tokens."),
        }
    }

    /// Title of the error notification; approvals show the message alone.
    pub fn failure_title(self) -> Option<&'static str> {
        match self {
            Action::Deposit => Some("Deposit Failed"),
            Action::Withdraw => Some("Withdraw Failed"),
            Action::Mint => Some("Mint Failed"),
            Action::Approve | Action::ApproveMax | Action::ResetAllowance => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Approve => "approve",
            Action::ApproveMax => "approve-max",
            Action::ResetAllowance => "reset-allowance",
            Action::Deposit => "deposit",
            Action::Withdraw => "withdraw",
            Action::Mint => "mint",
        };
        f.write_str(name)
    }
}

/// Network-facing stage an invocation can fail in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    CheckingAllowance,
    Simulating,
    Submitting,
    Confirming,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::CheckingAllowance => "checking allowance",
            Stage::Simulating => "simulating",
            Stage::Submitting => "submitting",
            Stage::Confirming => "confirming",
        };
        f.write_str(name)
    }
}

/// Lifecycle of the most recent invocation of an action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TxState {
    #[default]
    Idle,
    Simulating,
    Submitting,
    Confirming,
    Succeeded,
    Failed(Stage),
}

impl TxState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TxState::Succeeded | TxState::Failed(_))
    }

    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            TxState::Simulating | TxState::Submitting | TxState::Confirming
        )
    }
}
