//! Sign-up, sign-in and sign-out, plus forwarding of auth state into the store.

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;

use crate::{
    auth::{AuthService, AuthUser},
    document::DocumentStore,
    error::AuthError,
    favorites::FavoritesSync,
    model::UserProfile,
    store::{AuthUiAction, IdentityAction, Store},
};

/// How long an auth error stays visible in the modal.
pub const AUTH_MESSAGE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct AuthFlow {
    auth: Arc<dyn AuthService>,
    docs: Arc<dyn DocumentStore>,
    store: Store,
    message_ttl: Duration,
}

impl AuthFlow {
    pub fn new(auth: Arc<dyn AuthService>, docs: Arc<dyn DocumentStore>, store: Store) -> Self {
        Self { auth, docs, store, message_ttl: AUTH_MESSAGE_TTL }
    }

    pub fn toggle_modal(&self) {
        self.store.dispatch(AuthUiAction::ToggleModal);
    }

    pub fn close_modal(&self) {
        self.store.dispatch(AuthUiAction::CloseModal);
    }

    /// Switch between the sign-up and login forms.
    pub fn toggle_form(&self) {
        self.store.dispatch(AuthUiAction::ToggleForm);
    }

    /// Create the account, name it and write an empty profile document.
    ///
    /// If naming or the profile write fails, the new session is ended again so the
    /// account is not left signed in behind an error message.
    pub async fn sign_up(
        &self,
        display_name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        let user = match self.auth.create_user(email, password).await {
            Ok(user) => user,
            Err(err) => return self.settle(Err(err), "sign-up"),
        };

        let result = self.finish_sign_up(user.uid.clone(), display_name, email).await;
        if result.is_err() {
            tracing::warn!(uid = %user.uid, "sign-up incomplete, ending session");
            // Failure is logged by sign_out.
            self.sign_out().await.ok();
        }

        self.settle(result, "sign-up")
    }

    async fn finish_sign_up(
        &self,
        uid: String,
        display_name: &str,
        email: &str,
    ) -> Result<(), AuthError> {
        self.auth.update_profile(display_name).await?;

        let profile = UserProfile::new(uid, display_name, email);
        self.docs.set_profile(&profile).await?;
        Ok(())
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let result = self.auth.sign_in(email, password).await.map(|_| ());
        self.settle(result, "sign-in")
    }

    /// End the remote session and forget the local user.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.auth.sign_out().await.inspect_err(|err| {
            tracing::error!(error = %err, "sign-out failed");
        })?;
        self.store.dispatch(IdentityAction::LogoutUser);
        Ok(())
    }

    fn settle(&self, result: Result<(), AuthError>, what: &str) -> Result<(), AuthError> {
        match &result {
            Ok(()) => self.store.dispatch(AuthUiAction::CloseModal),
            Err(err) => {
                if err.is_known() {
                    tracing::info!(code = err.code(), "{what} rejected");
                } else {
                    tracing::error!(code = err.code(), error = %err, "{what} failed");
                }
                self.show_error(err.user_message());
            }
        }
        result
    }

    fn show_error(&self, message: &str) {
        self.store.dispatch(AuthUiAction::ShowError { message: message.to_string() });
        let generation = self.store.select(|s| s.auth_ui.error_generation);

        let store = self.store.clone();
        let ttl = self.message_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            store.dispatch(AuthUiAction::ClearError { generation });
        });
    }
}

/// Live subscription to auth state. Dropping it unsubscribes.
#[derive(Debug)]
pub struct AuthStateBinding {
    task: JoinHandle<()>,
}

impl Drop for AuthStateBinding {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Mirror auth sessions into the identity slice, hydrating saved cities on every new uid.
///
/// A session is logged in as soon as it has a uid. Names that arrive later (sign-up sets
/// the display name after creating the account) replace the ones already shown.
pub fn bind_auth_state(
    auth: &dyn AuthService,
    store: Store,
    favorites: FavoritesSync,
) -> AuthStateBinding {
    let mut rx = auth.subscribe();

    let task = tokio::spawn(async move {
        loop {
            let session: Option<AuthUser> = rx.borrow_and_update().clone();

            match session {
                Some(user) => {
                    let current = store.select(|s| s.identity.user.clone());
                    match current {
                        Some(profile) if profile.uid == user.uid => {
                            let updated = with_session_names(profile.clone(), user);
                            if updated != profile {
                                tracing::debug!(uid = %updated.uid, "session names updated");
                                store.dispatch(IdentityAction::LoginUser(updated));
                            }
                        }
                        _ => {
                            let saved_cities = favorites.load_saved_cities(&user.uid).await;
                            let profile = UserProfile {
                                saved_cities,
                                ..with_session_names(UserProfile::default(), user)
                            };
                            tracing::info!(uid = %profile.uid, "user signed in");
                            store.dispatch(IdentityAction::LoginUser(profile));
                        }
                    }
                }
                None => {
                    if store.select(|s| s.identity.is_logged_in()) {
                        tracing::info!("user signed out");
                        store.dispatch(IdentityAction::LogoutUser);
                    }
                }
            }

            if rx.changed().await.is_err() {
                tracing::error!("authentication state stream closed");
                break;
            }
        }
    });

    AuthStateBinding { task }
}

/// Copy uid, email and display name from `user`; missing names keep what `profile` had.
fn with_session_names(profile: UserProfile, user: AuthUser) -> UserProfile {
    UserProfile {
        uid: user.uid,
        email: user.email.filter(|e| !e.is_empty()).unwrap_or(profile.email),
        display_name: user
            .display_name
            .filter(|n| !n.is_empty())
            .unwrap_or(profile.display_name),
        saved_cities: profile.saved_cities,
    }
}
