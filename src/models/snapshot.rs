// Raw stats snapshot as fetched from the runtime (one per container per round)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cumulative network counters summed over all interfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkCounters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Cumulative block I/O counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlkioCounters {
    pub read_bytes: u64,
    pub write_bytes: u64,
}

/// The monotonic counters tracked across rounds for one container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeCounters {
    pub network: NetworkCounters,
    pub blkio: BlkioCounters,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuUsage {
    /// Total CPU time consumed, nanoseconds.
    pub total_usage: u64,
    pub usage_in_kernelmode: u64,
    pub usage_in_usermode: u64,
    #[serde(default)]
    pub percpu_usage: Vec<u64>,
    pub online_cpus: u32,
    /// Utilisation since the runtime's previous sample (0 when unavailable).
    pub percent: f64,
    #[serde(default)]
    pub throttled_periods: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub usage: u64,
    pub max_usage: u64,
    pub limit: u64,
    pub failcnt: u64,
}

impl MemoryUsage {
    /// Usage as a percentage of the limit; 0 when no limit is reported.
    pub fn percent(&self) -> f64 {
        if self.limit > 0 {
            self.usage as f64 / self.limit as f64 * 100.0
        } else {
            0.0
        }
    }
}

/// One stats snapshot for a container. Sections the runtime did not report are `None`;
/// the event builder rejects snapshots missing any of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub cpu: Option<CpuUsage>,
    pub memory: Option<MemoryUsage>,
    pub network: Option<NetworkCounters>,
    pub blkio: Option<BlkioCounters>,
    #[serde(default)]
    pub pids: u64,
}

impl StatsSnapshot {
    /// Snapshot with every section present and zeroed CPU/memory; handy for fakes.
    pub fn with_counters(
        timestamp: DateTime<Utc>,
        network: NetworkCounters,
        blkio: BlkioCounters,
    ) -> Self {
        Self {
            timestamp,
            cpu: Some(CpuUsage::default()),
            memory: Some(MemoryUsage::default()),
            network: Some(network),
            blkio: Some(blkio),
            pids: 0,
        }
    }
}
