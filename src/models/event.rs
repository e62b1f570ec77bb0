// Metric events handed to the sink

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One structured metric record. The body is flattened next to the common header
/// and tagged with `type` (e.g. `{"containerId": "..", "type": "net", "rxBytes": 500}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    pub container_id: String,
    pub container_name: String,
    #[serde(flatten)]
    pub body: EventBody,
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self.body {
            EventBody::Container(_) => "container",
            EventBody::Cpu(_) => "cpu",
            EventBody::Memory(_) => "memory",
            EventBody::Net(_) => "net",
            EventBody::Blkio(_) => "blkio",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventBody {
    Container(ContainerInfoEvent),
    Cpu(CpuEvent),
    Memory(MemoryEvent),
    Net(NetEvent),
    Blkio(BlkioEvent),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerInfoEvent {
    pub image: String,
    pub command: String,
    pub created: i64,
    pub labels: BTreeMap<String, String>,
    pub status: String,
    pub pids: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuEvent {
    pub total_usage: u64,
    pub usage_in_kernelmode: u64,
    pub usage_in_usermode: u64,
    pub percpu_usage: Vec<u64>,
    pub online_cpus: u32,
    pub percent: f64,
    pub throttled_periods: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEvent {
    pub usage: u64,
    pub max_usage: u64,
    pub limit: u64,
    pub failcnt: u64,
    pub percent: f64,
}

/// Network traffic since the previous capture. `rx_bytes`/`tx_bytes` are raw deltas;
/// divide by `interval_ms` for a rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetEvent {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_bytes_total: u64,
    pub tx_bytes_total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,
}

/// Block I/O since the previous capture; same delta semantics as [`NetEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlkioEvent {
    pub read: u64,
    pub write: u64,
    pub total: u64,
    pub read_total: u64,
    pub write_total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,
}
