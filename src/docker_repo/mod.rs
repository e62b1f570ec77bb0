// Docker container listing and single-snapshot stats via bollard

mod stats;

use crate::config::InputConfig;
use crate::error::{FetchError, ListError};
use crate::models::{ContainerIdentity, StatsSnapshot};
use crate::runtime::ContainerRuntime;
use async_trait::async_trait;
use bollard::query_parameters::{ListContainersOptions, StatsOptions};
use bollard::models::ContainerSummary;
use bollard::{API_DEFAULT_VERSION, Docker};
use futures_util::StreamExt;
use std::collections::HashMap;
use tracing::instrument;

/// Seconds bollard waits on a single HTTP request before giving up.
const REQUEST_TIMEOUT_SECS: u64 = 120;

pub struct DockerRepo {
    docker: Docker,
    list_all: bool,
    one_shot: bool,
}

impl DockerRepo {
    /// Connects to the daemon at `input.socket` (`unix://`, `tcp://` or `http://`).
    pub fn connect(input: &InputConfig) -> anyhow::Result<Self> {
        let docker = match socket_endpoint(&input.socket) {
            Endpoint::Unix(path) => {
                Docker::connect_with_socket(path, REQUEST_TIMEOUT_SECS, API_DEFAULT_VERSION)?
            }
            Endpoint::Http(addr) => {
                Docker::connect_with_http(addr, REQUEST_TIMEOUT_SECS, API_DEFAULT_VERSION)?
            }
        };
        Ok(Self {
            docker,
            list_all: input.all,
            one_shot: input.one_shot,
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Endpoint<'a> {
    Unix(&'a str),
    Http(&'a str),
}

pub(crate) fn socket_endpoint(socket: &str) -> Endpoint<'_> {
    if let Some(path) = socket.strip_prefix("unix://") {
        Endpoint::Unix(path)
    } else if socket.starts_with("tcp://") || socket.starts_with("http://") {
        Endpoint::Http(socket)
    } else {
        Endpoint::Unix(socket)
    }
}

fn identity(c: ContainerSummary) -> ContainerIdentity {
    let id = c.id.unwrap_or_default();
    let name = c
        .names
        .as_ref()
        .and_then(|n| n.first())
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_else(|| id.clone());
    ContainerIdentity {
        id,
        name,
        image: c.image.unwrap_or_default(),
        command: c.command.unwrap_or_default(),
        created: c.created.unwrap_or(0),
        labels: c.labels.unwrap_or_default().into_iter().collect(),
        status: c.status.unwrap_or_default(),
    }
}

#[async_trait]
impl ContainerRuntime for DockerRepo {
    #[instrument(skip(self), fields(repo = "docker", operation = "list_containers"))]
    async fn list_containers(&self) -> Result<Vec<ContainerIdentity>, ListError> {
        let filters = (!self.list_all).then(|| {
            let mut filters = HashMap::new();
            filters.insert("status".to_string(), vec!["running".to_string()]);
            filters
        });
        let options = ListContainersOptions {
            all: self.list_all,
            filters,
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| ListError(e.to_string()))?;

        Ok(containers
            .into_iter()
            .filter(|c| c.id.as_ref().is_some_and(|id| !id.is_empty()))
            .map(identity)
            .collect())
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "fetch_stats"))]
    async fn fetch_stats(&self, id: &str) -> Result<StatsSnapshot, FetchError> {
        let options = StatsOptions {
            stream: false,
            one_shot: self.one_shot,
        };
        let mut stream = self.docker.stats(id, Some(options));

        match stream.next().await {
            Some(Ok(s)) => Ok(stats::to_snapshot(&s, chrono::Utc::now())),
            Some(Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404,
                ..
            })) => Err(FetchError::NotFound),
            Some(Err(e)) => Err(FetchError::Transport(e.to_string())),
            None => Err(FetchError::Transport("stats stream ended without data".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_endpoint_by_scheme() {
        assert_eq!(
            socket_endpoint("unix:///var/run/docker.sock"),
            Endpoint::Unix("/var/run/docker.sock")
        );
        assert_eq!(
            socket_endpoint("/run/user/1000/docker.sock"),
            Endpoint::Unix("/run/user/1000/docker.sock")
        );
        assert_eq!(
            socket_endpoint("tcp://127.0.0.1:2375"),
            Endpoint::Http("tcp://127.0.0.1:2375")
        );
        assert_eq!(
            socket_endpoint("http://docker:2375"),
            Endpoint::Http("http://docker:2375")
        );
    }

    #[test]
    fn identity_trims_leading_slash_and_falls_back_to_id() {
        let named = ContainerSummary {
            id: Some("abc".into()),
            names: Some(vec!["/web".into(), "/alias".into()]),
            image: Some("nginx".into()),
            labels: Some(HashMap::from([("tier".to_string(), "front".to_string())])),
            ..Default::default()
        };
        let c = identity(named);
        assert_eq!(c.name, "web");
        assert_eq!(c.image, "nginx");
        assert_eq!(c.labels.get("tier").map(String::as_str), Some("front"));

        let unnamed = ContainerSummary {
            id: Some("def".into()),
            ..Default::default()
        };
        assert_eq!(identity(unnamed).name, "def");
    }
}
