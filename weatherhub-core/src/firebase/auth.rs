use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::watch;

use crate::{
    auth::{AuthService, AuthUser},
    error::AuthError,
    firebase::FirebaseSettings,
};

/// Email/password accounts via the Identity Toolkit REST API.
///
/// Sessions live in memory only; the id token is shared with [`super::FirestoreStore`]
/// through [`FirebaseAuth::id_token`].
#[derive(Debug)]
pub struct FirebaseAuth {
    http: Client,
    settings: FirebaseSettings,
    session: watch::Sender<Option<AuthUser>>,
    token: watch::Sender<Option<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseAuth {
    pub fn new(settings: FirebaseSettings) -> Self {
        let (session, _) = watch::channel(None);
        let (token, _) = watch::channel(None);
        Self { http: Client::new(), settings, session, token }
    }

    /// Id token of the current session, updated on every sign-in and sign-out.
    pub fn id_token(&self) -> watch::Receiver<Option<String>> {
        self.token.subscribe()
    }

    async fn call<B, R>(&self, endpoint: &str, body: &B) -> Result<R, AuthError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/accounts:{endpoint}", self.settings.auth_url);

        let res = self
            .http
            .post(&url)
            .query(&[("key", self.settings.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(map_error(&message));
        }

        serde_json::from_str(&text).map_err(|e| AuthError::Service {
            code: "auth/invalid-response".into(),
            message: e.to_string(),
        })
    }

    fn publish(&self, account: AccountResponse, fallback_name: Option<String>) -> AuthUser {
        let user = AuthUser {
            uid: account.local_id,
            email: account.email,
            display_name: account.display_name.filter(|n| !n.is_empty()).or(fallback_name),
        };
        if let Some(token) = account.id_token {
            self.token.send_replace(Some(token));
        }
        self.session.send_replace(Some(user.clone()));
        user
    }
}

/// Identity Toolkit reports errors as `CODE` or `CODE : details`.
fn map_error(message: &str) -> AuthError {
    let code = message.split(" : ").next().unwrap_or(message).trim();
    let web_code = match code {
        "EMAIL_EXISTS" => "auth/email-already-in-use".to_string(),
        "WEAK_PASSWORD" => "auth/weak-password".to_string(),
        "INVALID_LOGIN_CREDENTIALS" | "INVALID_PASSWORD" | "EMAIL_NOT_FOUND" => {
            "auth/invalid-login-credentials".to_string()
        }
        other => format!("auth/{}", other.to_lowercase().replace('_', "-")),
    };
    AuthError::from_code(&web_code, message)
}

#[async_trait]
impl AuthService for FirebaseAuth {
    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.session.subscribe()
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let req = PasswordRequest { email, password, return_secure_token: true };
        let account: AccountResponse = self.call("signUp", &req).await?;
        tracing::info!(uid = %account.local_id, "account created");
        Ok(self.publish(account, None))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let req = PasswordRequest { email, password, return_secure_token: true };
        let account: AccountResponse = self.call("signInWithPassword", &req).await?;
        tracing::info!(uid = %account.local_id, "signed in");
        Ok(self.publish(account, None))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.token.send_replace(None);
        self.session.send_replace(None);
        tracing::info!("signed out");
        Ok(())
    }

    async fn update_profile(&self, display_name: &str) -> Result<AuthUser, AuthError> {
        let id_token = self.token.borrow().clone().ok_or(AuthError::NotSignedIn)?;
        let req = UpdateRequest { id_token: &id_token, display_name, return_secure_token: true };
        let account: AccountResponse = self.call("update", &req).await?;
        Ok(self.publish(account, Some(display_name.to_string())))
    }
}
