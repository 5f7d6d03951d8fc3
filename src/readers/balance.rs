use super::poller::Poller;
use crate::amount::TokenAmount;
use crate::chain::{Chain, read_contract};
use crate::contracts::IERC20;
use crate::error::ChainError;
use crate::wallet::WalletProvider;
use alloy_primitives::Address;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Token balance of the connected account, polled while enabled.
pub struct BalanceReader {
    token: Option<Address>,
    poll_interval: Duration,
    poller: Arc<Poller<TokenAmount>>,
}

impl BalanceReader {
    /// A reader without a token is disabled and never touches the chain.
    pub fn new(
        chain: Arc<dyn Chain>,
        wallet: Arc<dyn WalletProvider>,
        token: Option<Address>,
        poll_interval: Duration,
    ) -> Self {
        let poller = Poller::new(
            "token balance",
            Box::new(move || {
                let chain = chain.clone();
                let account = wallet.account();
                async move {
                    let (Some(token), Some(account)) = (token, account) else {
                        return Ok(None);
                    };
                    let balance =
                        read_contract(chain.as_ref(), token, IERC20::balanceOfCall { account })
                            .await?;
                    Ok(Some(TokenAmount::from(balance)))
                }
                .boxed()
            }),
        );

        BalanceReader {
            token,
            poll_interval,
            poller,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Begin background polling; a disabled reader stays idle.
    pub fn start(&self) {
        if self.is_enabled() {
            self.poller.start(self.poll_interval);
        }
    }

    pub fn stop(&self) {
        self.poller.stop();
    }

    /// Latest known balance, `None` before the first successful read.
    pub fn balance(&self) -> Option<TokenAmount> {
        self.poller.latest()
    }

    pub async fn refresh(&self) -> Result<Option<TokenAmount>, ChainError> {
        self.poller.refresh().await
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<TokenAmount>> {
        self.poller.subscribe()
    }
}
