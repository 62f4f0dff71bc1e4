use std::{sync::Weak, time::Duration};

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::registry::SessionRegistry;

/// Background task evicting expired sessions from a [`SessionRegistry`].
pub struct Pruner {
    cancel_token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Drop for Pruner {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

impl Pruner {
    /// Spawns the sweep loop on the current tokio runtime.
    ///
    /// The task holds only a weak reference, so it ends on its own once the
    /// registry is gone.
    pub fn spawn(
        registry: Weak<SessionRegistry>,
        interval: Duration,
        cancel_token: CancellationToken,
    ) -> Self {
        let token = cancel_token.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(registry) = registry.upgrade() else { break };
                        let removed = registry.prune();
                        if removed > 0 {
                            debug!(
                                "Pruned {} stopped session(s), {} remaining",
                                removed,
                                registry.len()
                            );
                        }
                    }
                }
            }

            info!("Session pruner stopped");
        });

        Self {
            cancel_token,
            handle: Some(handle),
        }
    }

    /// Cancels future sweeps and waits for the task to exit.
    pub async fn stop(mut self) {
        self.cancel_token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}
