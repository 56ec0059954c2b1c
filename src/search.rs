//! Search orchestration: sequential source iteration with graceful
//! degradation, early stop at an aggregate threshold and a courtesy delay
//! between portal attempts.

use std::time::Duration;

use tracing::{info, warn};

use crate::models::{Listing, SearchCriteria};
use crate::scrapers::{default_sources, PropertySource, ScrapedSource, SourceClient};

const AGGREGATE_THRESHOLD: usize = 50;
const COURTESY_DELAY: Duration = Duration::from_millis(800);

/// Sole public entry point of the pipeline. Sources are injected, in
/// priority order; earlier sources win under the early-stop rule.
pub struct SearchOrchestrator {
    sources: Vec<Box<dyn PropertySource>>,
    max_results: usize,
    courtesy_delay: Duration,
}

impl SearchOrchestrator {
    pub fn new(sources: Vec<Box<dyn PropertySource>>) -> Self {
        Self {
            sources,
            max_results: AGGREGATE_THRESHOLD,
            courtesy_delay: COURTESY_DELAY,
        }
    }

    /// Wire up the default portal table behind a shared HTTP client.
    pub fn with_default_sources() -> anyhow::Result<Self> {
        let client = SourceClient::new()?;
        let sources = default_sources()
            .into_iter()
            .map(|descriptor| {
                Box::new(ScrapedSource::new(descriptor, client.clone())) as Box<dyn PropertySource>
            })
            .collect();
        Ok(Self::new(sources))
    }

    /// Override the aggregation threshold and inter-source delay.
    pub fn with_policy(mut self, max_results: usize, courtesy_delay: Duration) -> Self {
        self.max_results = max_results;
        self.courtesy_delay = courtesy_delay;
        self
    }

    /// Run one search across all configured sources. Never fails: a source
    /// that errors contributes nothing and iteration continues. An empty
    /// aggregate is a normal outcome.
    pub async fn search(&self, criteria: &SearchCriteria) -> Vec<Listing> {
        let mut all = Vec::new();

        for (i, source) in self.sources.iter().enumerate() {
            info!("Trying source {}...", source.name());
            let batch_len = match source.fetch(criteria).await {
                Ok(listings) if !listings.is_empty() => {
                    info!("Found {} listings from {}", listings.len(), source.name());
                    let batch_len = listings.len();
                    all.extend(listings);
                    batch_len
                }
                Ok(_) => {
                    info!("No results from {}", source.name());
                    0
                }
                Err(e) => {
                    warn!("Source {} failed: {}", source.name(), e);
                    0
                }
            };

            // Stop once another batch like the last would cross the
            // threshold; earlier sources keep priority over later ones.
            if all.len() >= self.max_results
                || (batch_len > 0 && all.len() + batch_len >= self.max_results)
            {
                info!("Aggregate threshold reached with {} listings, stopping early", all.len());
                break;
            }
            if i + 1 < self.sources.len() {
                tokio::time::sleep(self.courtesy_delay).await;
            }
        }

        all
    }
}
