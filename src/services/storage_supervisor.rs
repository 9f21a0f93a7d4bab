use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{game_store::GameStore, storage::StorageError},
    state::SharedState,
};

/// Timing knobs of the supervisor loop.
#[derive(Debug, Clone, Copy)]
pub struct SupervisorPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub health_interval: Duration,
    pub reconnect_attempts: u32,
}

impl Default for SupervisorPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            health_interval: Duration::from_secs(5),
            reconnect_attempts: 3,
        }
    }
}

impl SupervisorPolicy {
    fn backoff(&self, current: Duration) -> Duration {
        (current * 2).min(self.max_delay)
    }
}

/// Connect to the storage backend and keep the shared state in degraded mode
/// whenever it is unreachable. Runs forever.
pub async fn run<F, Fut>(state: SharedState, policy: SupervisorPolicy, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn GameStore>, StorageError>> + Send,
{
    let mut delay = policy.initial_delay;

    loop {
        match connect().await {
            Ok(store) => {
                state.set_game_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = policy.initial_delay;

                watch_health(&state, &policy, store.as_ref()).await;
                warn!("storage lost; opening a fresh connection");
            }
            Err(err) => warn!(error = %err, "storage connection attempt failed"),
        }

        sleep(delay).await;
        delay = policy.backoff(delay);
    }
}

/// Poll the store until it fails and cannot be reconnected in place.
async fn watch_health(state: &SharedState, policy: &SupervisorPolicy, store: &dyn GameStore) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded().await {
                    info!("storage healthy again; leaving degraded mode");
                    state.update_degraded(false).await;
                }
            }
            Err(err) => {
                warn!(error = %err, "storage health check failed; entering degraded mode");
                state.update_degraded(true).await;
                if !reconnect(policy, store).await {
                    warn!("exhausted storage reconnect attempts; staying in degraded mode");
                    return;
                }
                state.update_degraded(false).await;
            }
        }
        sleep(policy.health_interval).await;
    }
}

async fn reconnect(policy: &SupervisorPolicy, store: &dyn GameStore) -> bool {
    let mut delay = policy.initial_delay;
    for attempt in 1..=policy.reconnect_attempts {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnected after health check failure");
                return true;
            }
            Err(err) => {
                warn!(attempt, error = %err, "storage reconnect attempt failed");
                sleep(delay).await;
                delay = policy.backoff(delay);
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::{
        config::AppConfig, dao::game_store::memory::InMemoryGameStore, state::AppState,
    };

    fn fast() -> SupervisorPolicy {
        SupervisorPolicy {
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            health_interval: Duration::from_millis(5),
            reconnect_attempts: 2,
        }
    }

    #[tokio::test]
    async fn leaves_degraded_mode_once_connected() {
        let state = AppState::new(AppConfig::default());
        let attempts = Arc::new(AtomicU32::new(0));

        let counter = attempts.clone();
        let task = tokio::spawn(run(state.clone(), fast(), move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(StorageError::unavailable(
                        "not yet".into(),
                        std::io::Error::other("refused"),
                    ))
                } else {
                    Ok(Arc::new(InMemoryGameStore::new()) as Arc<dyn GameStore>)
                }
            }
        }));

        let mut watcher = state.degraded_watcher();
        tokio::time::timeout(Duration::from_secs(2), watcher.wait_for(|degraded| !degraded))
            .await
            .expect("supervisor never connected")
            .unwrap();

        assert!(attempts.load(Ordering::SeqCst) >= 3);
        assert!(state.require_game_store().await.is_ok());
        task.abort();
    }
}
