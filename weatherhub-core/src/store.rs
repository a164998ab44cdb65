//! Application state with pure reducers, shared through a cloneable [`Store`] handle.
//!
//! Views never mutate state directly: they [`Store::dispatch`] actions and read
//! snapshots or subscribe to changes.

use std::sync::Arc;

use tokio::sync::watch;

pub mod auth_ui;
pub mod identity;
pub mod weather;

pub use auth_ui::{AuthUiAction, AuthUiState};
pub use identity::{IdentityAction, IdentityState};
pub use weather::{WeatherAction, WeatherState};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub weather: WeatherState,
    pub identity: IdentityState,
    pub auth_ui: AuthUiState,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Weather(WeatherAction),
    Identity(IdentityAction),
    AuthUi(AuthUiAction),
}

impl From<WeatherAction> for Action {
    fn from(action: WeatherAction) -> Self {
        Action::Weather(action)
    }
}

impl From<IdentityAction> for Action {
    fn from(action: IdentityAction) -> Self {
        Action::Identity(action)
    }
}

impl From<AuthUiAction> for Action {
    fn from(action: AuthUiAction) -> Self {
        Action::AuthUi(action)
    }
}

pub fn reduce(state: &AppState, action: Action) -> AppState {
    match action {
        Action::Weather(a) => AppState {
            weather: weather::reduce(&state.weather, a),
            ..state.clone()
        },
        Action::Identity(a) => AppState {
            identity: identity::reduce(&state.identity, a),
            ..state.clone()
        },
        Action::AuthUi(a) => AppState {
            auth_ui: auth_ui::reduce(&state.auth_ui, a),
            ..state.clone()
        },
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    tx: Arc<watch::Sender<AppState>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl Store {
    pub fn new(initial: AppState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Apply `action`; subscribers are notified only when the state changed.
    pub fn dispatch(&self, action: impl Into<Action>) {
        let action = action.into();
        tracing::trace!(?action, "dispatch");

        self.tx.send_if_modified(|state| {
            let next = reduce(state, action);
            if next == *state {
                false
            } else {
                *state = next;
                true
            }
        });
    }

    /// Snapshot of the whole state.
    pub fn state(&self) -> AppState {
        self.tx.borrow().clone()
    }

    pub fn select<T>(&self, selector: impl FnOnce(&AppState) -> T) -> T {
        selector(&self.tx.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.tx.subscribe()
    }

    /// Resolve once `predicate` holds for the current state.
    pub async fn wait_for(&self, mut predicate: impl FnMut(&AppState) -> bool) -> AppState {
        let mut rx = self.tx.subscribe();
        match rx.wait_for(|state| predicate(state)).await {
            Ok(state) => state.clone(),
            // The sender lives in `self`, so the channel cannot be closed here.
            Err(_) => self.state(),
        }
    }
}
