use crate::error::ChainError;
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

/// Produces the next value, or `None` when there is nothing to read yet.
pub type FetchFn<T> = Box<dyn Fn() -> BoxFuture<'static, Result<Option<T>, ChainError>> + Send + Sync>;

/// Poll-and-cache cell.
///
/// The latest value is always available without waiting; `refresh` performs
/// a read and publishes the result, and `start` repeats that on a timer.
pub struct Poller<T> {
    name: &'static str,
    fetch: FetchFn<T>,
    latest: watch::Sender<Option<T>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<T> Poller<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, fetch: FetchFn<T>) -> Arc<Self> {
        let (latest, _) = watch::channel(None);
        Arc::new(Poller {
            name,
            fetch,
            latest,
            task: Mutex::new(None),
        })
    }

    pub fn latest(&self) -> Option<T> {
        self.latest.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.latest.subscribe()
    }

    pub async fn refresh(&self) -> Result<Option<T>, ChainError> {
        let value = (self.fetch)().await?;
        self.latest.send_replace(value.clone());
        debug!("Refreshed {}", self.name);
        Ok(value)
    }

    /// Begin polling every `every`, replacing any running schedule.
    ///
    /// The first read happens immediately. A failed read keeps the previous
    /// value and is logged; the next tick tries again.
    pub fn start(self: &Arc<Self>, every: Duration) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let name = self.name;
        let handle = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(poller) = weak.upgrade() else {
                    break;
                };
                if let Err(e) = poller.refresh().await {
                    warn!("Failed to refresh {}: {}", name, e);
                }
            }
        });

        if let Some(previous) = self.replace_task(Some(handle)) {
            previous.abort();
        }
    }

    pub fn stop(&self) {
        if let Some(handle) = self.replace_task(None) {
            handle.abort();
        }
    }

    fn replace_task(&self, handle: Option<JoinHandle<()>>) -> Option<JoinHandle<()>> {
        match self.task.lock() {
            Ok(mut slot) => std::mem::replace(&mut *slot, handle),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), handle),
        }
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        let slot = match self.task.get_mut() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}
