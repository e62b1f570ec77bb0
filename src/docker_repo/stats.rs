// Convert a raw Docker stats API response into a StatsSnapshot.

use crate::models::{BlkioCounters, CpuUsage, MemoryUsage, NetworkCounters, StatsSnapshot};
use bollard::models::{ContainerBlkioStatEntry, ContainerStatsResponse};
use chrono::{DateTime, Utc};

/// Sections Docker leaves out stay `None` so the event builder can reject them, except
/// `networks`: Docker omits it for containers without a network namespace, which have
/// no traffic to report.
pub(crate) fn to_snapshot(s: &ContainerStatsResponse, timestamp: DateTime<Utc>) -> StatsSnapshot {
    StatsSnapshot {
        timestamp,
        cpu: cpu_usage(s),
        memory: s.memory_stats.as_ref().map(|m| MemoryUsage {
            usage: m.usage.unwrap_or(0),
            max_usage: m.max_usage.unwrap_or(0),
            limit: m.limit.unwrap_or(0),
            failcnt: m.failcnt.unwrap_or(0),
        }),
        network: Some(s.networks.as_ref().map_or_else(NetworkCounters::default, |n| {
            let mut counters = NetworkCounters::default();
            for v in n.values() {
                counters.rx_bytes = counters.rx_bytes.saturating_add(v.rx_bytes.unwrap_or(0));
                counters.tx_bytes = counters.tx_bytes.saturating_add(v.tx_bytes.unwrap_or(0));
            }
            counters
        })),
        blkio: s.blkio_stats.as_ref().map(|b| {
            let (read_bytes, write_bytes) = b
                .io_service_bytes_recursive
                .as_deref()
                .map_or((0, 0), sum_read_write);
            BlkioCounters {
                read_bytes,
                write_bytes,
            }
        }),
        pids: s.pids_stats.as_ref().and_then(|p| p.current).unwrap_or(0),
    }
}

fn sum_read_write(entries: &[ContainerBlkioStatEntry]) -> (u64, u64) {
    let mut read = 0u64;
    let mut write = 0u64;
    for e in entries {
        if e.op
            .as_ref()
            .is_some_and(|op| op.eq_ignore_ascii_case("read"))
        {
            read = read.saturating_add(e.value.unwrap_or(0));
        } else if e
            .op
            .as_ref()
            .is_some_and(|op| op.eq_ignore_ascii_case("write"))
        {
            write = write.saturating_add(e.value.unwrap_or(0));
        }
    }
    (read, write)
}

fn cpu_usage(s: &ContainerStatsResponse) -> Option<CpuUsage> {
    let cpu_stats = s.cpu_stats.as_ref()?;
    let usage = cpu_stats.cpu_usage.as_ref()?;
    let online_cpus = cpu_stats.online_cpus.map_or(1, |n| n as u32);

    // precpu is empty for one-shot reads and on the very first sample.
    let percent = s
        .precpu_stats
        .as_ref()
        .and_then(|pre| {
            let pre_total = pre.cpu_usage.as_ref()?.total_usage.unwrap_or(0);
            let cpu_delta = usage.total_usage.unwrap_or(0) as i64 - pre_total as i64;
            let system_delta = cpu_stats.system_cpu_usage.unwrap_or(0) as i64
                - pre.system_cpu_usage.unwrap_or(0) as i64;
            (system_delta > 0 && online_cpus > 0).then(|| {
                (cpu_delta as f64 / system_delta as f64) * online_cpus as f64 * 100.0
            })
        })
        .unwrap_or(0.0);

    let throttled_periods = cpu_stats
        .throttling_data
        .as_ref()
        .and_then(|t| t.throttled_periods)
        .unwrap_or(0);

    Some(CpuUsage {
        total_usage: usage.total_usage.unwrap_or(0),
        usage_in_kernelmode: usage.usage_in_kernelmode.unwrap_or(0),
        usage_in_usermode: usage.usage_in_usermode.unwrap_or(0),
        percpu_usage: usage.percpu_usage.clone().unwrap_or_default(),
        online_cpus,
        percent,
        throttled_periods,
    })
}
