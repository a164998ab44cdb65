use async_trait::async_trait;
use std::fmt::Debug;
use tokio::sync::watch;

use crate::error::AuthError;

/// What the app observes about an authenticated session.
///
/// The display name is unknown between account creation and naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

#[async_trait]
pub trait AuthService: Send + Sync + Debug {
    /// Current session; `None` while signed out.
    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>>;

    /// Register and sign in.
    async fn create_user(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Set the display name of the signed-in user.
    async fn update_profile(&self, display_name: &str) -> Result<AuthUser, AuthError>;
}
