//! Outbound HTTP client for the auction portals, with the dual-strategy
//! extraction fallback: structured data first, heuristic markup second.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::extract::{heuristic, structured};
use crate::models::{Listing, SearchCriteria};
use crate::rank;
use crate::scrapers::sources::SourceDescriptor;
use crate::scrapers::traits::PropertySource;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client shared across sources. Failures never escape `fetch`: a
/// portal that errors or stalls simply contributes zero listings.
#[derive(Clone)]
pub struct SourceClient {
    client: Client,
}

impl SourceClient {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("it-IT,it;q=0.9,en;q=0.8"),
        );

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64)")
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Query one portal and extract whatever listings its response carries,
    /// already filtered against the hard criteria.
    pub async fn fetch(&self, descriptor: &SourceDescriptor, criteria: &SearchCriteria) -> Vec<Listing> {
        let params = descriptor.query_params(criteria);
        debug!("Fetching {} with {} params", descriptor.search_url, params.len());

        let response = match self
            .client
            .get(&descriptor.search_url)
            .query(&params)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Request to {} failed: {}", descriptor.name, e);
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            warn!("{} returned status {}", descriptor.name, response.status());
            return Vec::new();
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to read body from {}: {}", descriptor.name, e);
                return Vec::new();
            }
        };
        debug!("Downloaded {} bytes from {}", body.len(), descriptor.name);

        // Embedded structured data first, markup heuristics as fallback.
        let mut listings = structured::extract(&body, &descriptor.base_url);
        if listings.is_empty() {
            debug!("No structured data from {}, trying markup heuristics", descriptor.name);
            listings = heuristic::extract(&body, &descriptor.base_url);
        } else {
            info!("Structured data yielded {} listings from {}", listings.len(), descriptor.name);
        }

        listings.retain(|listing| rank::passes(listing, criteria));
        listings
    }
}

/// One configured portal bound to the shared client.
pub struct ScrapedSource {
    descriptor: SourceDescriptor,
    client: SourceClient,
}

impl ScrapedSource {
    pub fn new(descriptor: SourceDescriptor, client: SourceClient) -> Self {
        Self { descriptor, client }
    }
}

#[async_trait::async_trait]
impl PropertySource for ScrapedSource {
    async fn fetch(&self, criteria: &SearchCriteria) -> Result<Vec<Listing>> {
        Ok(self.client.fetch(&self.descriptor, criteria).await)
    }

    fn name(&self) -> &str {
        &self.descriptor.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::sources::default_sources;

    #[tokio::test]
    async fn transport_failure_degrades_to_empty() {
        let client = SourceClient::new().unwrap();
        let mut descriptor = default_sources()[0].clone();
        // Nothing listens here; the connection is refused immediately.
        descriptor.search_url = "http://127.0.0.1:9/ricerca".to_string();
        descriptor.base_url = "http://127.0.0.1:9".to_string();

        let listings = client
            .fetch(&descriptor, &SearchCriteria::default().with_location("Parma"))
            .await;
        assert!(listings.is_empty());
    }
}
