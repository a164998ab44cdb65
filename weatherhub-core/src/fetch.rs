//! Turns search-term changes into weather requests.
//!
//! Every request carries an id from a monotonically increasing counter; the weather
//! reducer drops any response whose id is not the newest, so a slow earlier request can
//! never overwrite a later search.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::task::JoinHandle;

use crate::{
    provider::{QueryTemplate, WeatherProvider},
    store::{Store, WeatherAction},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Loaded,
    NotFound,
    /// A newer request was issued before this one settled.
    Superseded,
}

#[derive(Debug)]
pub struct WeatherFetcher {
    provider: Arc<dyn WeatherProvider>,
    template: QueryTemplate,
    store: Store,
    next_request: AtomicU64,
}

impl WeatherFetcher {
    pub fn new(provider: Arc<dyn WeatherProvider>, template: QueryTemplate, store: Store) -> Self {
        Self { provider, template, store, next_request: AtomicU64::new(0) }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Set the search term and fetch it.
    pub async fn search(&self, city: &str) -> FetchOutcome {
        self.store.dispatch(WeatherAction::SetSearchTerm(city.to_string()));
        self.refresh().await
    }

    /// Fetch the current search term.
    pub async fn refresh(&self) -> FetchOutcome {
        let request_id = self.next_request.fetch_add(1, Ordering::SeqCst) + 1;
        self.store.dispatch(WeatherAction::FetchStarted { request_id });

        let city = self.store.select(|s| s.weather.search_term.clone());
        let query = self.template.for_city(&city);

        let result = self.provider.fetch_forecast(&query).await;

        let outcome = match result {
            Ok(document) => {
                tracing::info!(%city, request_id, "weather loaded");
                self.store.dispatch(WeatherAction::ReplaceDocument { request_id, document });
                FetchOutcome::Loaded
            }
            Err(err) => {
                tracing::warn!(%city, request_id, error = %err, "weather fetch failed");
                self.store.dispatch(WeatherAction::FetchFailed { request_id });
                FetchOutcome::NotFound
            }
        };

        if self.store.select(|s| s.weather.latest_request) != request_id {
            tracing::debug!(%city, request_id, "discarding superseded weather response");
            return FetchOutcome::Superseded;
        }

        outcome
    }

    /// Fetch now and again on every search-term change until the trigger is dropped.
    pub fn watch(self: Arc<Self>) -> FetchTrigger {
        let task = tokio::spawn(async move {
            let mut rx = self.store.subscribe();
            let mut term = rx.borrow_and_update().weather.search_term.clone();
            let mut in_flight = AbortOnDrop(spawn_refresh(&self));

            while rx.changed().await.is_ok() {
                let next = rx.borrow_and_update().weather.search_term.clone();
                if next == term {
                    continue;
                }
                term = next;
                // Replacing the guard aborts the previous request.
                in_flight = AbortOnDrop(spawn_refresh(&self));
            }

            drop(in_flight);
        });

        FetchTrigger { task }
    }
}

fn spawn_refresh(fetcher: &Arc<WeatherFetcher>) -> JoinHandle<()> {
    let fetcher = Arc::clone(fetcher);
    tokio::spawn(async move {
        fetcher.refresh().await;
    })
}

struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Running search-term watcher. Dropping it stops fetching and aborts any request in flight.
#[derive(Debug)]
pub struct FetchTrigger {
    task: JoinHandle<()>,
}

impl Drop for FetchTrigger {
    fn drop(&mut self) {
        self.task.abort();
    }
}
