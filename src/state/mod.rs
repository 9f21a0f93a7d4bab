pub mod catalog;
pub mod identity;
pub mod session;
pub mod state_machine;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, watch};

use crate::{
    config::AppConfig, dao::game_store::GameStore, error::ServiceError,
    state::identity::UserId,
};

pub type SharedState = Arc<AppState>;

type UserGates = Arc<DashMap<UserId, Arc<Mutex<()>>>>;

/// Exclusive hold on one user's session mutations.
///
/// Releasing the last hold on a user drops its entry from the gate table.
pub struct UserGate {
    guard: Option<OwnedMutexGuard<()>>,
    gates: UserGates,
    user_id: UserId,
}

impl Drop for UserGate {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters keep their own clone, so a count of one means only the table holds it.
        self.gates
            .remove_if(&self.user_id, |_, gate| Arc::strong_count(gate) == 1);
    }
}

/// Central application state holding the storage handle and per-user locks.
pub struct AppState {
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
    user_gates: UserGates,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            game_store: RwLock::new(None),
            degraded: degraded_tx,
            config,
            user_gates: Arc::new(DashMap::new()),
        })
    }

    /// Build a state with `store` already installed. Used by tests and the
    /// in-memory backend, which never needs supervision.
    pub async fn with_store(config: AppConfig, store: Arc<dyn GameStore>) -> SharedState {
        let state = Self::new(config);
        state.set_game_store(store).await;
        state
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current game store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current game store, or [`ServiceError::Degraded`] while storage is down.
    pub async fn require_game_store(&self) -> Result<Arc<dyn GameStore>, ServiceError> {
        if self.is_degraded().await {
            return Err(ServiceError::Degraded);
        }
        self.game_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new game store implementation and leave degraded mode.
    pub async fn set_game_store(&self, store: Arc<dyn GameStore>) {
        {
            let mut guard = self.game_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Serialize session mutations of one user within this process.
    pub async fn user_gate(&self, user_id: UserId) -> UserGate {
        let gate = self
            .user_gates
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = gate.lock_owned().await;
        UserGate {
            guard: Some(guard),
            gates: Arc::clone(&self.user_gates),
            user_id,
        }
    }
}
