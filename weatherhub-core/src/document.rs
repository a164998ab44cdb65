use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::DocumentError, model::UserProfile};

/// Collection holding one [`UserProfile`] per uid.
pub const USERS_COLLECTION: &str = "Users";

/// Server-side set operation on `savedCities`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayOp {
    Union(String),
    Remove(String),
}

impl ArrayOp {
    pub fn city(&self) -> &str {
        match self {
            ArrayOp::Union(city) | ArrayOp::Remove(city) => city,
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync + Debug {
    /// `Ok(None)` when the user has no document.
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, DocumentError>;

    /// Create or overwrite the user's document.
    async fn set_profile(&self, profile: &UserProfile) -> Result<(), DocumentError>;

    /// Apply `op` to `savedCities` atomically on the server. Fails if the document is missing.
    async fn update_saved_cities(&self, uid: &str, op: ArrayOp) -> Result<(), DocumentError>;
}
