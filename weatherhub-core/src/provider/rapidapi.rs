use async_trait::async_trait;
use reqwest::Client;

use crate::{
    error::FetchError,
    model::WeatherDocument,
    provider::{ForecastQuery, WeatherProvider},
};

/// weatherapi.com forecast endpoint behind the RapidAPI gateway.
#[derive(Debug, Clone, Default)]
pub struct RapidApiProvider {
    http: Client,
}

impl RapidApiProvider {
    pub fn new() -> Self {
        Self { http: Client::new() }
    }
}

#[async_trait]
impl WeatherProvider for RapidApiProvider {
    async fn fetch_forecast(&self, query: &ForecastQuery) -> Result<WeatherDocument, FetchError> {
        tracing::debug!(city = %query.city, "requesting forecast");

        let res = self
            .http
            .get(&query.base_url)
            .query(&query.query_pairs())
            .header("X-RapidAPI-Key", &query.credentials.key)
            .header("X-RapidAPI-Host", &query.credentials.host)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16(), body: truncate_body(&body) });
        }

        WeatherDocument::from_json(&body)
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
