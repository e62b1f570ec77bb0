// Container runtime seam: listing and single-snapshot stats fetch.

use crate::error::{FetchError, ListError};
use crate::models::{ContainerIdentity, StatsSnapshot};
use async_trait::async_trait;

#[async_trait]
pub trait ContainerRuntime: Send + Sync + 'static {
    /// Point-in-time listing; no ordering guarantee.
    async fn list_containers(&self) -> Result<Vec<ContainerIdentity>, ListError>;

    /// Exactly one (non-streaming) snapshot for `id`.
    async fn fetch_stats(&self, id: &str) -> Result<StatsSnapshot, FetchError>;
}
