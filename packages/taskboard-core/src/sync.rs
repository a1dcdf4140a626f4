/// Change propagation: keeps the board registry in step with storage
/// changes made by other processes or windows.
///
/// Only the registry key is followed. Board documents changed elsewhere are
/// not reloaded; the last save wins.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::registry::BoardRegistry;
use crate::storage::ChangeSubscription;

pub struct RegistrySync {
    registry: Arc<BoardRegistry>,
    subscription: ChangeSubscription,
}

impl RegistrySync {
    pub fn new(registry: Arc<BoardRegistry>) -> Self {
        let subscription = registry
            .gateway()
            .on_external_change(&registry.registry_key());
        Self {
            registry,
            subscription,
        }
    }

    pub fn registry(&self) -> &Arc<BoardRegistry> {
        &self.registry
    }

    /// Handle everything that arrived since the last call, without waiting.
    /// Several pending notifications collapse into one resync.
    /// Returns true if the registry was reloaded.
    pub fn pump(&mut self) -> bool {
        if self.subscription.poll_changed() {
            log::info!("[taskboard.sync] External registry change, resyncing");
            self.registry.resync();
            true
        } else {
            false
        }
    }

    /// Resync on every external change until `shutdown` flips to true,
    /// the sender is dropped, or the change source goes away.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                changed = self.subscription.changed() => {
                    if !changed {
                        log::info!("[taskboard.sync] Change source closed");
                        break;
                    }
                    log::info!("[taskboard.sync] External registry change, resyncing");
                    self.registry.resync();
                }
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        log::info!("[taskboard.sync] Shutdown signal received");
                        break;
                    }
                }
            }
        }
    }

    /// Run on the current tokio runtime.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
