use super::poller::Poller;
use crate::amount::TokenAmount;
use crate::chain::{Chain, read_contract};
use crate::contracts::IERC20;
use crate::error::ChainError;
use crate::wallet::WalletProvider;
use alloy_primitives::Address;
use futures::FutureExt;
use serde::Serialize;
use std::sync::Arc;

/// Spending permission granted by `owner` to `spender` on `token`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Allowance {
    pub owner: Address,
    pub spender: Address,
    pub token: Address,
    pub amount: TokenAmount,
}

/// Allowance of the connected account towards a spender.
///
/// Only refreshed on request; callers refresh after every approval-changing
/// transaction.
pub struct AllowanceReader {
    wallet: Arc<dyn WalletProvider>,
    poller: Arc<Poller<Allowance>>,
}

impl AllowanceReader {
    pub fn new(
        chain: Arc<dyn Chain>,
        wallet: Arc<dyn WalletProvider>,
        token: Address,
        spender: Option<Address>,
    ) -> Self {
        let owner_source = wallet.clone();
        let poller = Poller::new(
            "allowance",
            Box::new(move || {
                let chain = chain.clone();
                let owner = owner_source.account();
                async move {
                    let (Some(owner), Some(spender)) = (owner, spender) else {
                        return Ok(None);
                    };
                    let amount = read_contract(
                        chain.as_ref(),
                        token,
                        IERC20::allowanceCall { owner, spender },
                    )
                    .await?;
                    Ok(Some(Allowance {
                        owner,
                        spender,
                        token,
                        amount: TokenAmount::from(amount),
                    }))
                }
                .boxed()
            }),
        );

        AllowanceReader { wallet, poller }
    }

    /// Cached allowance for the connected account.
    ///
    /// Zero when disconnected, before the first read, or when the cached
    /// value belongs to a previously connected account.
    pub fn allowance(&self) -> TokenAmount {
        self.current().map(|a| a.amount).unwrap_or_default()
    }

    pub fn current(&self) -> Option<Allowance> {
        let account = self.wallet.account()?;
        self.poller
            .latest()
            .filter(|allowance| allowance.owner == account)
    }

    /// Read the allowance for the connected account from the chain.
    pub async fn refresh(&self) -> Result<TokenAmount, ChainError> {
        let fetched = self.poller.refresh().await?;
        Ok(fetched.map(|a| a.amount).unwrap_or_default())
    }
}
