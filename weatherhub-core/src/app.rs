//! Composition root: wires the store to the weather provider, auth service and document store.

use std::{sync::Arc, time::Duration};

use anyhow::Result;

use crate::{
    auth::AuthService,
    config::Config,
    document::DocumentStore,
    favorites::FavoritesSync,
    fetch::{FetchOutcome, WeatherFetcher},
    firebase::{FirebaseAuth, FirestoreStore},
    provider::{QueryTemplate, RapidApiProvider, WeatherProvider},
    session::{AuthFlow, AuthStateBinding, bind_auth_state},
    store::{AppState, Store, WeatherState},
};

/// A running dashboard. Must be created inside a Tokio runtime.
#[derive(Debug)]
pub struct Dashboard {
    store: Store,
    fetcher: Arc<WeatherFetcher>,
    favorites: FavoritesSync,
    auth_flow: AuthFlow,
    _auth_binding: AuthStateBinding,
}

impl Dashboard {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        template: QueryTemplate,
        auth: Arc<dyn AuthService>,
        docs: Arc<dyn DocumentStore>,
        default_city: &str,
    ) -> Self {
        let store = Store::new(AppState {
            weather: WeatherState::with_search_term(default_city),
            ..AppState::default()
        });

        let fetcher = Arc::new(WeatherFetcher::new(provider, template, store.clone()));
        let favorites = FavoritesSync::new(docs.clone(), store.clone());
        let auth_flow = AuthFlow::new(auth.clone(), docs, store.clone());
        let auth_binding = bind_auth_state(auth.as_ref(), store.clone(), favorites.clone());

        Self {
            store,
            fetcher,
            favorites,
            auth_flow,
            _auth_binding: auth_binding,
        }
    }

    /// Build against the configured weather API and Firebase project.
    pub fn from_config(config: &Config) -> Result<Self> {
        let template = config.query_template()?;
        let settings = config.firebase_settings()?;

        let auth = Arc::new(FirebaseAuth::new(settings.clone()));
        let docs = Arc::new(FirestoreStore::new(settings).with_id_token(auth.id_token()));

        Ok(Self::new(
            Arc::new(RapidApiProvider::new()),
            template,
            auth,
            docs,
            &config.weather.default_city,
        ))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn state(&self) -> AppState {
        self.store.state()
    }

    pub fn fetcher(&self) -> &Arc<WeatherFetcher> {
        &self.fetcher
    }

    pub fn favorites(&self) -> &FavoritesSync {
        &self.favorites
    }

    pub fn auth(&self) -> &AuthFlow {
        &self.auth_flow
    }

    /// Fetch the current search term (the initial load).
    pub async fn load(&self) -> FetchOutcome {
        self.fetcher.refresh().await
    }

    pub async fn search(&self, city: &str) -> FetchOutcome {
        self.fetcher.search(city).await
    }

    /// Wait until the auth binding has caught up with a sign-in or sign-out.
    pub async fn settle_identity(&self, signed_in: bool) -> AppState {
        self.store.wait_for(|s| s.identity.is_logged_in() == signed_in).await
    }

    /// [`Dashboard::settle_identity`], giving up with `None` after `limit`.
    pub async fn settle_identity_within(
        &self,
        signed_in: bool,
        limit: Duration,
    ) -> Option<AppState> {
        match tokio::time::timeout(limit, self.settle_identity(signed_in)).await {
            Ok(state) => Some(state),
            Err(_) => {
                tracing::warn!(signed_in, ?limit, "identity did not settle in time");
                None
            }
        }
    }
}
