use alloy_primitives::Address;
use tokio::sync::watch;
use tracing::info;

/// Source of the currently connected account.
pub trait WalletProvider: Send + Sync {
    fn account(&self) -> Option<Address>;

    fn is_connected(&self) -> bool {
        self.account().is_some()
    }
}

/// Connection state owned by the caller and shared with readers and orchestrators.
#[derive(Debug)]
pub struct WalletSession {
    changes: watch::Sender<Option<Address>>,
}

impl WalletSession {
    pub fn new(account: Option<Address>) -> Self {
        let (changes, _) = watch::channel(account);
        WalletSession { changes }
    }

    pub fn disconnected() -> Self {
        Self::new(None)
    }

    pub fn connect(&self, account: Address) {
        self.set(Some(account));
        info!("Wallet connected: {:?}", account);
    }

    pub fn disconnect(&self) {
        self.set(None);
        info!("Wallet disconnected");
    }

    /// Receive the account every time it changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Address>> {
        self.changes.subscribe()
    }

    fn set(&self, account: Option<Address>) {
        self.changes.send_replace(account);
    }
}

impl WalletProvider for WalletSession {
    fn account(&self) -> Option<Address> {
        *self.changes.borrow()
    }
}
