// Shared test helpers: a scriptable in-memory runtime and event accessors

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use dockerbeat::error::{FetchError, ListError};
use dockerbeat::models::*;
use dockerbeat::runtime::ContainerRuntime;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
enum FakeStats {
    Counters(NetworkCounters, BlkioCounters),
    Malformed,
    Fail,
    Hang,
}

#[derive(Default)]
struct FakeState {
    containers: Vec<ContainerIdentity>,
    stats: HashMap<String, FakeStats>,
    list_error: bool,
    fetch_delay: Duration,
}

/// In-memory runtime whose listing and per-container stats are set by the test.
#[derive(Default)]
pub struct FakeRuntime {
    state: Mutex<FakeState>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    fetches: AtomicUsize,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_containers(&self, ids: &[&str]) {
        self.state.lock().unwrap().containers = ids
            .iter()
            .map(|id| ContainerIdentity::new(*id, format!("{id}-name"), "busybox:latest"))
            .collect();
    }

    pub fn set_network(&self, id: &str, rx_bytes: u64, tx_bytes: u64) {
        self.set_counters(id, rx_bytes, tx_bytes, 0, 0);
    }

    pub fn set_counters(&self, id: &str, rx: u64, tx: u64, read: u64, write: u64) {
        self.state.lock().unwrap().stats.insert(
            id.to_string(),
            FakeStats::Counters(
                NetworkCounters {
                    rx_bytes: rx,
                    tx_bytes: tx,
                },
                BlkioCounters {
                    read_bytes: read,
                    write_bytes: write,
                },
            ),
        );
    }

    pub fn set_malformed(&self, id: &str) {
        self.state
            .lock()
            .unwrap()
            .stats
            .insert(id.to_string(), FakeStats::Malformed);
    }

    pub fn set_fetch_error(&self, id: &str) {
        self.state
            .lock()
            .unwrap()
            .stats
            .insert(id.to_string(), FakeStats::Fail);
    }

    pub fn set_hang(&self, id: &str) {
        self.state
            .lock()
            .unwrap()
            .stats
            .insert(id.to_string(), FakeStats::Hang);
    }

    pub fn set_list_error(&self, fail: bool) {
        self.state.lock().unwrap().list_error = fail;
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        self.state.lock().unwrap().fetch_delay = delay;
    }

    /// Highest number of fetches that were running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn list_containers(&self) -> Result<Vec<ContainerIdentity>, ListError> {
        let state = self.state.lock().unwrap();
        if state.list_error {
            return Err(ListError("daemon unreachable".into()));
        }
        Ok(state.containers.clone())
    }

    async fn fetch_stats(&self, id: &str) -> Result<StatsSnapshot, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let (stats, delay) = {
            let state = self.state.lock().unwrap();
            (state.stats.get(id).cloned(), state.fetch_delay)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match stats {
            Some(FakeStats::Counters(net, blk)) => {
                Ok(StatsSnapshot::with_counters(Utc::now(), net, blk))
            }
            Some(FakeStats::Malformed) => {
                let mut s = StatsSnapshot::with_counters(
                    Utc::now(),
                    NetworkCounters::default(),
                    BlkioCounters::default(),
                );
                s.memory = None;
                Ok(s)
            }
            Some(FakeStats::Fail) => Err(FetchError::Transport("connection reset".into())),
            Some(FakeStats::Hang) => std::future::pending().await,
            None => Err(FetchError::NotFound),
        }
    }
}

pub fn net_of(events: &[Event]) -> NetEvent {
    events
        .iter()
        .find_map(|e| match &e.body {
            EventBody::Net(n) => Some(n.clone()),
            _ => None,
        })
        .expect("batch has a net event")
}

pub fn blkio_of(events: &[Event]) -> BlkioEvent {
    events
        .iter()
        .find_map(|e| match &e.body {
            EventBody::Blkio(b) => Some(b.clone()),
            _ => None,
        })
        .expect("batch has a blkio event")
}

/// Drains every batch currently queued on a channel sink, keyed by container id.
pub fn drain_batches(
    rx: &mut tokio::sync::mpsc::Receiver<Vec<Event>>,
) -> HashMap<String, Vec<Event>> {
    let mut out = HashMap::new();
    while let Ok(batch) = rx.try_recv() {
        let id = batch[0].container_id.clone();
        out.insert(id, batch);
    }
    out
}
