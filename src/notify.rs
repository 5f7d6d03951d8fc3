use crate::actions::Action;
use alloy_primitives::TxHash;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, info};

pub const DEFAULT_EXPLORER_URL: &str = "https://sepolia.basescan.org";

/// Identifies one live progress notification.
///
/// The action's fixed key is combined with a per-invocation counter so two
/// invocations of the same action never overwrite each other's status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationKey {
    pub action: Action,
    pub invocation: u64,
}

impl NotificationKey {
    pub fn next(action: Action) -> Self {
        static INVOCATIONS: AtomicU64 = AtomicU64::new(1);
        NotificationKey {
            action,
            invocation: INVOCATIONS.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl fmt::Display for NotificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.action.notification_key(), self.invocation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explorer {
    base_url: String,
}

impl Explorer {
    pub fn new(base_url: &str) -> Self {
        Explorer {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn tx_url(&self, hash: &TxHash) -> String {
        format!("{}/tx/{}", self.base_url, hash)
    }

    pub fn link(&self, hash: &TxHash) -> ExplorerLink {
        ExplorerLink {
            label: "View on Explorer",
            url: self.tx_url(hash),
        }
    }
}

impl Default for Explorer {
    fn default() -> Self {
        Explorer::new(DEFAULT_EXPLORER_URL)
    }
}

/// Optional action attached to a success notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplorerLink {
    pub label: &'static str,
    pub url: String,
}

/// User feedback surface driven by the orchestrators.
pub trait Notifier: Send + Sync {
    /// Show or replace the progress line identified by `key`.
    fn loading(&self, key: &NotificationKey, message: &str, description: Option<&str>);

    fn success(&self, title: &str, description: &str, link: Option<&ExplorerLink>);

    fn error(&self, title: &str, description: Option<&str>);

    fn dismiss(&self, key: &NotificationKey);
}

/// Renders notifications as log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn loading(&self, key: &NotificationKey, message: &str, description: Option<&str>) {
        match description {
            Some(description) => info!(key = %key, "{} {}", message, description),
            None => info!(key = %key, "{}", message),
        }
    }

    fn success(&self, title: &str, description: &str, link: Option<&ExplorerLink>) {
        match link {
            Some(link) => info!("{} {} {}: {}", title, description, link.label, link.url),
            None => info!("{} {}", title, description),
        }
    }

    fn error(&self, title: &str, description: Option<&str>) {
        match description {
            Some(description) => error!("{}: {}", title, description),
            None => error!("{}", title),
        }
    }

    fn dismiss(&self, _key: &NotificationKey) {}
}
