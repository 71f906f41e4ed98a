//! IEEE Xplore Metadata API client.
//!
//! One GET per search, no pagination: the API returns at most
//! [`MAX_RECORDS`] articles per call. The JSON body is handed back as-is in a
//! [`ResultEnvelope`] of raw article values.

use crate::error::{IeeeError, Result};
use crate::query::YearRange;
use crate::record::{Record, ResultEnvelope};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

/// IEEE Xplore search endpoint
pub const IEEE_API_URL: &str = "https://ieeexploreapi.ieee.org/api/v1/search/articles";

/// Per-call cap imposed by the API
pub const MAX_RECORDS: u64 = 200;

/// Raw API envelope: `{ total_records, total_searched, articles: [...] }`
pub type ApiEnvelope = ResultEnvelope<Value>;

/// Client for the search endpoint.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    /// Create a client for the public endpoint.
    ///
    /// Certificate validation is disabled: the API host sits behind network
    /// layers that present certificates which fail verification. Only the
    /// search response is affected, but it also means the response and the
    /// API key travel over a connection whose peer is not authenticated.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, IEEE_API_URL)
    }

    /// Create a client for another endpoint (mirrors, tests).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| IeeeError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Search for `query` within `years`.
    ///
    /// # Errors
    ///
    /// Any transport failure or non-success status. No retries are attempted.
    pub async fn search(&self, query: &str, years: Option<YearRange>) -> Result<ApiEnvelope> {
        let url = self.search_url(query, years)?;
        info!(query = query, years = ?years, "Querying IEEE Xplore API");

        let result = self.fetch(url).await;
        if let Err(e) = &result {
            error!(error = %e, "IEEE API request failed");
        }
        result
    }

    async fn fetch(&self, url: Url) -> Result<ApiEnvelope> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IeeeError::Api {
                code: status.as_u16(),
                message: format!("IEEE API returned {}: {}", status, body.trim()),
            });
        }

        let envelope: ApiEnvelope = response.json().await?;
        debug!(
            total_records = envelope.total_records,
            returned = envelope.articles.len(),
            "API response parsed"
        );
        Ok(envelope)
    }

    fn search_url(&self, query: &str, years: Option<YearRange>) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| IeeeError::Config(format!("Invalid API URL: {}", e)))?;
        let params = search_params(&self.api_key, query, years);
        url.set_query(Some(&encode_params(&params)));
        Ok(url)
    }
}

/// Whether a response hit the per-call cap and may be missing records.
pub fn is_capped(envelope: &ApiEnvelope) -> bool {
    envelope.total_records > MAX_RECORDS
}

/// Normalize raw articles into records, e.g. for the spreadsheet.
pub fn to_records(articles: &[Value]) -> Result<Vec<Record>> {
    articles
        .iter()
        .map(|article| Record::deserialize(article).map_err(IeeeError::from))
        .collect()
}

/// Query parameters for one search, in request order.
pub fn search_params(
    api_key: &str,
    query: &str,
    years: Option<YearRange>,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("querytext", query.to_string()),
        ("max_records", MAX_RECORDS.to_string()),
        ("apikey", api_key.to_string()),
    ];
    if let Some(range) = years {
        params.push(("start_year", range.start.to_string()));
        params.push(("end_year", range.end.to_string()));
    }
    params
}

/// Percent-encode values and join with `&`, without a trailing separator.
pub fn encode_params(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encode like JavaScript's `encodeURIComponent`.
///
/// `urlencoding` escapes everything but `A-Z a-z 0-9 - . _ ~`; the API
/// receives `! ' ( ) *` literally, as browsers send them.
pub fn encode_component(value: &str) -> String {
    // Every '%' left in the output starts an escape, so these are unambiguous
    urlencoding::encode(value)
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}
