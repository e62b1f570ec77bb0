// One collection round: list containers, fetch one snapshot each in parallel, build and
// publish their events, then evict counters for containers that are gone.
//
// Per-container failures stop at this boundary. They are logged and counted in the
// RoundReport; nothing propagates to the scheduler.

use crate::error::FetchError;
use crate::event_builder::EventBuilder;
use crate::models::ContainerIdentity;
use crate::runtime::ContainerRuntime;
use crate::sink::EventSink;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundReport {
    /// The listing failed and the round was aborted.
    pub list_failed: bool,
    pub listed: usize,
    /// Containers whose batch reached the sink.
    pub published: usize,
    pub events: usize,
    pub fetch_failed: usize,
    pub malformed: usize,
    pub publish_failed: usize,
    /// Per-container tasks that panicked.
    pub task_failed: usize,
    /// Counter store entries removed by the cleanup pass.
    pub evicted: usize,
}

impl RoundReport {
    pub fn skipped(&self) -> usize {
        self.fetch_failed + self.malformed + self.publish_failed + self.task_failed
    }

    fn record(&mut self, outcome: ContainerOutcome) {
        match outcome {
            ContainerOutcome::Published(events) => {
                self.published += 1;
                self.events += events;
            }
            ContainerOutcome::FetchFailed => self.fetch_failed += 1,
            ContainerOutcome::Malformed => self.malformed += 1,
            ContainerOutcome::PublishFailed => self.publish_failed += 1,
        }
    }
}

enum ContainerOutcome {
    Published(usize),
    FetchFailed,
    Malformed,
    PublishFailed,
}

pub struct StatsCollector {
    runtime: Arc<dyn ContainerRuntime>,
    sink: Arc<dyn EventSink>,
    builder: EventBuilder,
    fetch_timeout: Duration,
}

impl StatsCollector {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        sink: Arc<dyn EventSink>,
        builder: EventBuilder,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            runtime,
            sink,
            builder,
            fetch_timeout,
        }
    }

    pub fn builder(&self) -> &EventBuilder {
        &self.builder
    }

    /// Runs one round. Every per-container task is joined before the cleanup pass, so
    /// eviction never races a store update and no task outlives the round.
    pub async fn run_round(&self) -> RoundReport {
        let containers = match self.runtime.list_containers().await {
            Ok(c) => c,
            Err(e) => {
                warn!(
                    error = %e,
                    operation = "list_containers",
                    "Cannot get container list; round aborted"
                );
                return RoundReport {
                    list_failed: true,
                    ..Default::default()
                };
            }
        };

        let live_ids: HashSet<String> = containers.iter().map(|c| c.id.clone()).collect();
        let mut report = RoundReport {
            listed: containers.len(),
            ..Default::default()
        };

        let mut tasks = JoinSet::new();
        for container in containers {
            tasks.spawn(collect_container(
                self.runtime.clone(),
                self.sink.clone(),
                self.builder.clone(),
                container,
                self.fetch_timeout,
            ));
        }
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    error!(error = %e, "container stats task failed");
                    report.task_failed += 1;
                }
            }
        }

        report.evicted = self.builder.store().retain_only(&live_ids);
        if report.evicted > 0 {
            debug!(evicted = report.evicted, "Evicted counters for vanished containers");
        }
        report
    }
}

async fn collect_container(
    runtime: Arc<dyn ContainerRuntime>,
    sink: Arc<dyn EventSink>,
    builder: EventBuilder,
    container: ContainerIdentity,
    fetch_timeout: Duration,
) -> ContainerOutcome {
    let fetched = tokio::time::timeout(fetch_timeout, runtime.fetch_stats(&container.id))
        .await
        .unwrap_or_else(|_| Err(FetchError::Timeout(fetch_timeout)));
    let snapshot = match fetched {
        Ok(s) => s,
        Err(e) => {
            warn!(
                container_id = %container.id,
                container_name = %container.name,
                error = %e,
                operation = "fetch_stats",
                "Skipping container this round"
            );
            return ContainerOutcome::FetchFailed;
        }
    };

    let events = match builder.build(&container, &snapshot) {
        Ok(events) => events,
        Err(e) => {
            warn!(
                container_id = %container.id,
                container_name = %container.name,
                error = %e,
                operation = "build_events",
                "Dropping container events this round"
            );
            return ContainerOutcome::Malformed;
        }
    };

    let count = events.len();
    match sink.publish(events).await {
        Ok(()) => ContainerOutcome::Published(count),
        Err(e) => {
            warn!(
                container_id = %container.id,
                error = %e,
                operation = "publish",
                "Failed to publish container events"
            );
            ContainerOutcome::PublishFailed
        }
    }
}
