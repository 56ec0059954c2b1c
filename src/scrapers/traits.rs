use crate::models::{Listing, SearchCriteria};
use anyhow::Result;
use async_trait::async_trait;

/// Common trait for all listing sources.
/// This allows easy addition of new auction portals in the future and gives
/// the orchestrator a uniform, stubbable seam.
#[async_trait]
pub trait PropertySource: Send + Sync {
    /// Fetch listings matching the criteria from this source.
    async fn fetch(&self, criteria: &SearchCriteria) -> Result<Vec<Listing>>;

    /// Get the name of the source
    fn name(&self) -> &str;
}
