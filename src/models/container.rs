// Docker container identity models

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Point-in-time identity of a container as reported by the runtime listing.
/// Sourced fresh each round; the collector only references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerIdentity {
    pub id: String,
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub command: String,
    /// Creation time, unix seconds.
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Human-readable status from the runtime (e.g. "Up 2 hours").
    #[serde(default)]
    pub status: String,
}

impl ContainerIdentity {
    /// Identity with only the fields the core needs; the rest left empty.
    pub fn new(id: impl Into<String>, name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: image.into(),
            command: String::new(),
            created: 0,
            labels: BTreeMap::new(),
            status: String::new(),
        }
    }
}
