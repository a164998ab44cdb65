//! In-process [`AuthService`] and [`DocumentStore`] implementations.
//!
//! They follow the remote services' semantics closely enough to drive the dashboard
//! end to end without network access, and can be told to fail on demand.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
};

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};

use crate::{
    auth::{AuthService, AuthUser},
    document::{ArrayOp, DocumentStore},
    error::{AuthError, DocumentError},
    model::UserProfile,
};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    password: String,
    display_name: Option<String>,
}

#[derive(Debug)]
pub struct InMemoryAuth {
    accounts: Mutex<HashMap<String, Account>>,
    session: watch::Sender<Option<AuthUser>>,
    next_uid: AtomicU64,
    /// Calls still allowed to succeed, and the error for the one after them.
    injected: Mutex<Option<(usize, AuthError)>>,
}

impl Default for InMemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuth {
    pub fn new() -> Self {
        let (session, _rx) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            session,
            next_uid: AtomicU64::new(1),
            injected: Mutex::new(None),
        }
    }

    /// Make the next call fail with `err`.
    pub async fn fail_next(&self, err: AuthError) {
        self.fail_after(0, err).await;
    }

    /// Let `successes` calls through, then fail the following one with `err`.
    pub async fn fail_after(&self, successes: usize, err: AuthError) {
        *self.injected.lock().await = Some((successes, err));
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.session.borrow().clone()
    }

    async fn take_injected(&self) -> Result<(), AuthError> {
        let mut injected = self.injected.lock().await;
        match injected.take() {
            Some((0, err)) => Err(err),
            Some((n, err)) => {
                *injected = Some((n - 1, err));
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn publish(&self, email: &str, account: &Account) -> AuthUser {
        let user = AuthUser {
            uid: account.uid.clone(),
            email: Some(email.to_string()),
            display_name: account.display_name.clone(),
        };
        self.session.send_replace(Some(user.clone()));
        user
    }
}

#[async_trait]
impl AuthService for InMemoryAuth {
    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.session.subscribe()
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        self.take_injected().await?;

        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(email) {
            return Err(AuthError::EmailAlreadyInUse);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let uid = format!("user-{}", self.next_uid.fetch_add(1, Ordering::SeqCst));
        let account = Account { uid, password: password.to_string(), display_name: None };
        let user = self.publish(email, &account);
        accounts.insert(email.to_string(), account);
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        self.take_injected().await?;

        let accounts = self.accounts.lock().await;
        match accounts.get(email) {
            Some(account) if account.password == password => Ok(self.publish(email, account)),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.take_injected().await?;
        self.session.send_replace(None);
        Ok(())
    }

    async fn update_profile(&self, display_name: &str) -> Result<AuthUser, AuthError> {
        self.take_injected().await?;

        let email = self
            .current_user()
            .and_then(|u| u.email)
            .ok_or(AuthError::NotSignedIn)?;

        let mut accounts = self.accounts.lock().await;
        let account = accounts.get_mut(&email).ok_or(AuthError::NotSignedIn)?;
        account.display_name = Some(display_name.to_string());
        let account = account.clone();
        Ok(self.publish(&email, &account))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    docs: Mutex<HashMap<String, UserProfile>>,
    failing: AtomicBool,
    writes: AtomicU64,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, profile: UserProfile) {
        self.docs.lock().await.insert(profile.uid.clone(), profile);
    }

    pub async fn profile(&self, uid: &str) -> Option<UserProfile> {
        self.docs.lock().await.get(uid).cloned()
    }

    /// While set, every operation fails with [`DocumentError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), DocumentError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DocumentError::Unavailable("in-memory store set to fail".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, DocumentError> {
        self.check_available()?;
        Ok(self.profile(uid).await)
    }

    async fn set_profile(&self, profile: &UserProfile) -> Result<(), DocumentError> {
        self.check_available()?;
        self.insert(profile.clone()).await;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update_saved_cities(&self, uid: &str, op: ArrayOp) -> Result<(), DocumentError> {
        self.check_available()?;

        let mut docs = self.docs.lock().await;
        let profile = docs.get_mut(uid).ok_or_else(|| DocumentError::NotFound(uid.to_string()))?;

        match op {
            ArrayOp::Union(city) => {
                if !profile.has_saved_city(&city) {
                    profile.saved_cities.push(city);
                }
            }
            ArrayOp::Remove(city) => profile.saved_cities.retain(|c| *c != city),
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
