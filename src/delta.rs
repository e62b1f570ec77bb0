// Per-interval deltas from cumulative runtime counters.
//
// Counters only ever grow while a container lives. A first observation has nothing to
// diff against and a counter that went backwards was reset (restart with a reused id,
// wraparound); both yield 0 rather than the raw total or a negative value.

use crate::models::{BlkioCounters, NetworkCounters};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkDelta {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlkioDelta {
    pub read_bytes: u64,
    pub write_bytes: u64,
}

impl BlkioDelta {
    pub fn total(&self) -> u64 {
        self.read_bytes.saturating_add(self.write_bytes)
    }
}

/// `current - previous`, or 0 when the counter went backwards.
fn counter_delta(current: u64, previous: u64) -> u64 {
    current.saturating_sub(previous)
}

pub fn network_delta(current: &NetworkCounters, previous: Option<&NetworkCounters>) -> NetworkDelta {
    match previous {
        None => NetworkDelta::default(),
        Some(prev) => NetworkDelta {
            rx_bytes: counter_delta(current.rx_bytes, prev.rx_bytes),
            tx_bytes: counter_delta(current.tx_bytes, prev.tx_bytes),
        },
    }
}

pub fn blkio_delta(current: &BlkioCounters, previous: Option<&BlkioCounters>) -> BlkioDelta {
    match previous {
        None => BlkioDelta::default(),
        Some(prev) => BlkioDelta {
            read_bytes: counter_delta(current.read_bytes, prev.read_bytes),
            write_bytes: counter_delta(current.write_bytes, prev.write_bytes),
        },
    }
}

/// Wall time between two captures in milliseconds; `None` without a previous capture.
/// A clock that stepped backwards yields 0.
pub fn elapsed_ms(current: DateTime<Utc>, previous: Option<DateTime<Utc>>) -> Option<u64> {
    previous.map(|prev| (current - prev).num_milliseconds().max(0) as u64)
}
