use crate::{error::FetchError, model::WeatherDocument};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod rapidapi;

pub use rapidapi::RapidApiProvider;

/// Credential header pair sent with every weather request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub key: String,
    pub host: String,
}

/// Everything but the city: built once from config, reused for every search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    pub base_url: String,
    pub days: Option<u8>,
    pub credentials: ApiCredentials,
}

impl QueryTemplate {
    pub fn for_city(&self, city: &str) -> ForecastQuery {
        ForecastQuery {
            base_url: self.base_url.clone(),
            city: city.to_string(),
            days: self.days,
            credentials: self.credentials.clone(),
        }
    }
}

/// A fully-formed weather request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastQuery {
    pub base_url: String,
    pub city: String,
    pub days: Option<u8>,
    pub credentials: ApiCredentials,
}

impl ForecastQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("q", self.city.clone())];
        if let Some(days) = self.days {
            pairs.push(("days", days.to_string()));
        }
        pairs
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Perform exactly one request; no retries.
    async fn fetch_forecast(&self, query: &ForecastQuery) -> Result<WeatherDocument, FetchError>;
}
