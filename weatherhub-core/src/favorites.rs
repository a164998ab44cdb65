//! Keeps the signed-in user's saved cities in step with their remote document.
//!
//! The remote document is the source of truth. Writes go through the store's set
//! primitives and the local list is then refreshed from a fresh read. Remote failures
//! are logged and leave local state untouched.

use std::sync::Arc;

use crate::{
    document::{ArrayOp, DocumentStore},
    error::DocumentError,
    store::{IdentityAction, Store},
};

#[derive(Debug, Clone)]
pub struct FavoritesSync {
    docs: Arc<dyn DocumentStore>,
    store: Store,
}

impl FavoritesSync {
    pub fn new(docs: Arc<dyn DocumentStore>, store: Store) -> Self {
        Self { docs, store }
    }

    /// Saved cities for `uid`; empty when the document is missing or unreadable.
    pub async fn load_saved_cities(&self, uid: &str) -> Vec<String> {
        match self.docs.get_profile(uid).await {
            Ok(Some(profile)) => profile.saved_cities,
            Ok(None) => {
                tracing::info!(uid, "no profile document, starting without saved cities");
                Vec::new()
            }
            Err(err) => {
                tracing::warn!(uid, error = %err, "failed to read profile document");
                Vec::new()
            }
        }
    }

    /// Re-read the signed-in user's document into local state.
    pub async fn hydrate(&self) {
        let Some(uid) = self.current_uid() else {
            return;
        };

        match self.docs.get_profile(&uid).await {
            Ok(Some(profile)) => {
                self.store.dispatch(IdentityAction::SetSavedCities(profile.saved_cities));
            }
            Ok(None) => tracing::info!(%uid, "no profile document to hydrate from"),
            Err(err) => tracing::warn!(%uid, error = %err, "failed to hydrate saved cities"),
        }
    }

    /// Add the displayed city to the user's saved cities.
    pub async fn save_current_city(&self) {
        self.apply_to_current(ArrayOp::Union).await;
    }

    /// Remove the displayed city from the user's saved cities.
    pub async fn remove_current_city(&self) {
        self.apply_to_current(ArrayOp::Remove).await;
    }

    async fn apply_to_current(&self, op: fn(String) -> ArrayOp) {
        let Some(uid) = self.current_uid() else {
            tracing::debug!("not signed in, ignoring saved-city change");
            return;
        };
        let displayed = self.store.select(|s| s.weather.displayed_city().map(str::to_string));
        let Some(city) = displayed else {
            tracing::debug!("no city displayed, ignoring saved-city change");
            return;
        };

        if let Err(err) = self.try_apply(&uid, op(city)).await {
            tracing::warn!(%uid, error = %err, "saved-city update failed");
        }
    }

    async fn try_apply(&self, uid: &str, op: ArrayOp) -> Result<(), DocumentError> {
        let Some(profile) = self.docs.get_profile(uid).await? else {
            tracing::info!(uid, "no profile document, saved-city change dropped");
            return Ok(());
        };

        let already = profile.has_saved_city(op.city());
        let needs_write = match &op {
            ArrayOp::Union(_) => !already,
            ArrayOp::Remove(_) => already,
        };

        let cities = if needs_write {
            tracing::debug!(uid, ?op, "updating saved cities");
            self.docs.update_saved_cities(uid, op).await?;
            match self.docs.get_profile(uid).await? {
                Some(profile) => profile.saved_cities,
                None => return Err(DocumentError::NotFound(uid.to_string())),
            }
        } else {
            profile.saved_cities
        };

        // The user may have signed out while we were waiting on the store.
        if self.current_uid().as_deref() == Some(uid) {
            self.store.dispatch(IdentityAction::SetSavedCities(cities));
        }
        Ok(())
    }

    fn current_uid(&self) -> Option<String> {
        self.store.select(|s| s.identity.uid().map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        memory::InMemoryDocumentStore,
        model::{Location, UserProfile, WeatherDocument},
        store::WeatherAction,
    };

    async fn setup(
        saved: &[&str],
        displayed: &str,
    ) -> (Arc<InMemoryDocumentStore>, Store, FavoritesSync) {
        let docs = Arc::new(InMemoryDocumentStore::new());
        let mut profile = UserProfile::new("u1", "Ana", "ana@example.com");
        profile.saved_cities = saved.iter().map(|c| c.to_string()).collect();
        docs.insert(profile.clone()).await;

        let store = Store::default();
        store.dispatch(IdentityAction::LoginUser(profile));
        store.dispatch(WeatherAction::FetchStarted { request_id: 1 });
        store.dispatch(WeatherAction::ReplaceDocument {
            request_id: 1,
            document: WeatherDocument {
                location: Location { name: displayed.into(), ..Default::default() },
                ..Default::default()
            },
        });

        let sync = FavoritesSync::new(docs.clone(), store.clone());
        (docs, store, sync)
    }

    fn local(store: &Store) -> Vec<String> {
        store.select(|s| s.identity.saved_cities().to_vec())
    }

    #[tokio::test]
    async fn save_adds_city_locally_and_remotely() {
        let (docs, store, sync) = setup(&["Rome"], "Paris").await;

        sync.save_current_city().await;

        assert_eq!(local(&store), vec!["Rome", "Paris"]);
        assert_eq!(docs.profile("u1").await.unwrap().saved_cities, vec!["Rome", "Paris"]);
    }

    #[tokio::test]
    async fn saving_an_already_saved_city_does_not_duplicate() {
        let (docs, store, sync) = setup(&["Paris"], "Paris").await;

        sync.save_current_city().await;
        sync.save_current_city().await;

        assert_eq!(local(&store), vec!["Paris"]);
        assert_eq!(docs.profile("u1").await.unwrap().saved_cities, vec!["Paris"]);
        assert_eq!(docs.write_count(), 0);
    }

    #[tokio::test]
    async fn removing_displayed_city_empties_both_sides() {
        let (docs, store, sync) = setup(&["Paris"], "Paris").await;

        sync.remove_current_city().await;

        assert!(local(&store).is_empty());
        assert!(docs.profile("u1").await.unwrap().saved_cities.is_empty());
    }

    #[tokio::test]
    async fn removing_unsaved_city_is_a_no_op() {
        let (docs, store, sync) = setup(&["Rome"], "Paris").await;

        sync.remove_current_city().await;

        assert_eq!(local(&store), vec!["Rome"]);
        assert_eq!(docs.profile("u1").await.unwrap().saved_cities, vec!["Rome"]);
        assert_eq!(docs.write_count(), 0);
    }

    #[tokio::test]
    async fn local_mirror_is_refreshed_from_remote() {
        let (docs, store, sync) = setup(&[], "Paris").await;
        // Another session saved Oslo after we signed in.
        docs.update_saved_cities("u1", ArrayOp::Union("Oslo".into())).await.unwrap();

        sync.save_current_city().await;

        assert_eq!(local(&store), vec!["Oslo", "Paris"]);
    }

    #[tokio::test]
    async fn remote_failure_leaves_local_state_unchanged() {
        let (docs, store, sync) = setup(&["Rome"], "Paris").await;
        docs.set_failing(true);

        sync.save_current_city().await;
        sync.hydrate().await;

        assert_eq!(local(&store), vec!["Rome"]);
    }

    #[tokio::test]
    async fn hydrate_pulls_remote_list() {
        let (docs, store, sync) = setup(&[], "Paris").await;
        docs.update_saved_cities("u1", ArrayOp::Union("Lima".into())).await.unwrap();

        sync.hydrate().await;

        assert_eq!(local(&store), vec!["Lima"]);
    }

    #[tokio::test]
    async fn missing_document_yields_no_saved_cities() {
        let docs = Arc::new(InMemoryDocumentStore::new());
        let sync = FavoritesSync::new(docs, Store::default());

        assert!(sync.load_saved_cities("nobody").await.is_empty());
    }

    #[tokio::test]
    async fn nothing_happens_while_signed_out() {
        let (docs, store, sync) = setup(&[], "Paris").await;
        store.dispatch(IdentityAction::LogoutUser);

        sync.save_current_city().await;

        assert!(docs.profile("u1").await.unwrap().saved_cities.is_empty());
    }
}
