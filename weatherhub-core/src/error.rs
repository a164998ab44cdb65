//! Error types for the remote collaborators: weather API, auth service, document store.

use thiserror::Error;

/// Failure to obtain a weather document.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Weather API request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse weather document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Weather document has no location name")]
    MissingLocation,
}

/// Shown for any auth failure without a dedicated message.
pub const GENERIC_AUTH_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email already in use")]
    EmailAlreadyInUse,

    #[error("password is too weak")]
    WeakPassword,

    #[error("invalid login credentials")]
    InvalidCredentials,

    #[error("no user is signed in")]
    NotSignedIn,

    #[error("auth service error ({code}): {message}")]
    Service { code: String, message: String },

    #[error("failed to store user profile: {0}")]
    Profile(#[from] DocumentError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl AuthError {
    /// Build an error from a service error code such as `auth/weak-password`.
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        match code {
            "auth/email-already-in-use" => Self::EmailAlreadyInUse,
            "auth/weak-password" => Self::WeakPassword,
            "auth/invalid-login-credentials" | "auth/wrong-password" | "auth/user-not-found" => {
                Self::InvalidCredentials
            }
            _ => Self::Service { code: code.to_string(), message: message.into() },
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::EmailAlreadyInUse => "auth/email-already-in-use",
            Self::WeakPassword => "auth/weak-password",
            Self::InvalidCredentials => "auth/invalid-login-credentials",
            Self::NotSignedIn => "auth/no-current-user",
            Self::Service { code, .. } => code,
            Self::Profile(_) => "store/profile-write-failed",
            Self::Network(_) => "auth/network-request-failed",
        }
    }

    /// Message shown in the auth modal.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmailAlreadyInUse => "Email already in use.",
            Self::WeakPassword => "Provide a password with minimum 6 characters.",
            Self::InvalidCredentials => "Invalid login credentials.",
            _ => GENERIC_AUTH_MESSAGE,
        }
    }

    /// Whether the failure has a dedicated user-facing message.
    pub fn is_known(&self) -> bool {
        matches!(self, Self::EmailAlreadyInUse | Self::WeakPassword | Self::InvalidCredentials)
    }
}

/// Failure talking to the user document store.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Document store request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("No document for user '{0}'")]
    NotFound(String),

    #[error("Document store unavailable: {0}")]
    Unavailable(String),
}
