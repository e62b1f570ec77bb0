// Error taxonomy for a collection round. None of these are fatal to the process:
// list failures abort one round, everything else skips one container.

use std::time::Duration;

/// The runtime could not enumerate containers; the round is aborted and retried next tick.
#[derive(Debug, thiserror::Error)]
#[error("cannot list containers: {0}")]
pub struct ListError(pub String);

/// A single container's snapshot is unavailable this round.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("stats fetch timed out after {0:?}")]
    Timeout(Duration),
    #[error("container not found")]
    NotFound,
    #[error("stats transport failure: {0}")]
    Transport(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("malformed snapshot for container {container_id}: missing {missing} stats")]
    MalformedSnapshot {
        container_id: String,
        missing: &'static str,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("sink closed")]
    Closed,
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write events: {0}")]
    Io(#[from] std::io::Error),
}
