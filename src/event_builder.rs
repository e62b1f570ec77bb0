// Turns one container snapshot into its fixed batch of events, updating the counter store.

use crate::counter_store::{CounterEntry, SharedCounterStore};
use crate::delta::{blkio_delta, elapsed_ms, network_delta};
use crate::error::BuildError;
use crate::models::{
    BlkioEvent, ContainerIdentity, ContainerInfoEvent, CpuEvent, CumulativeCounters, Event,
    EventBody, MemoryEvent, NetEvent, StatsSnapshot,
};

#[derive(Debug, Clone)]
pub struct EventBuilder {
    store: SharedCounterStore,
}

impl EventBuilder {
    pub fn new(store: SharedCounterStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SharedCounterStore {
        &self.store
    }

    /// Builds the container, cpu, memory, net and blkio events (in that order).
    ///
    /// The snapshot is validated before the store is touched, so a malformed snapshot
    /// leaves no trace. The store update and the read of the previous counters are one
    /// atomic swap.
    pub fn build(
        &self,
        container: &ContainerIdentity,
        snapshot: &StatsSnapshot,
    ) -> Result<Vec<Event>, BuildError> {
        let missing = |what: &'static str| BuildError::MalformedSnapshot {
            container_id: container.id.clone(),
            missing: what,
        };
        let cpu = snapshot.cpu.as_ref().ok_or_else(|| missing("cpu"))?;
        let memory = snapshot.memory.as_ref().ok_or_else(|| missing("memory"))?;
        let network = snapshot.network.ok_or_else(|| missing("network"))?;
        let blkio = snapshot.blkio.ok_or_else(|| missing("blkio"))?;

        let previous = self.store.swap(
            &container.id,
            CounterEntry {
                counters: CumulativeCounters { network, blkio },
                captured_at: snapshot.timestamp,
            },
        );
        let net_delta = network_delta(&network, previous.as_ref().map(|p| &p.counters.network));
        let blk_delta = blkio_delta(&blkio, previous.as_ref().map(|p| &p.counters.blkio));
        let interval_ms = elapsed_ms(snapshot.timestamp, previous.map(|p| p.captured_at));

        let event = |body: EventBody| Event {
            timestamp: snapshot.timestamp,
            container_id: container.id.clone(),
            container_name: container.name.clone(),
            body,
        };

        Ok(vec![
            event(EventBody::Container(ContainerInfoEvent {
                image: container.image.clone(),
                command: container.command.clone(),
                created: container.created,
                labels: container.labels.clone(),
                status: container.status.clone(),
                pids: snapshot.pids,
            })),
            event(EventBody::Cpu(CpuEvent {
                total_usage: cpu.total_usage,
                usage_in_kernelmode: cpu.usage_in_kernelmode,
                usage_in_usermode: cpu.usage_in_usermode,
                percpu_usage: cpu.percpu_usage.clone(),
                online_cpus: cpu.online_cpus,
                percent: cpu.percent,
                throttled_periods: cpu.throttled_periods,
            })),
            event(EventBody::Memory(MemoryEvent {
                usage: memory.usage,
                max_usage: memory.max_usage,
                limit: memory.limit,
                failcnt: memory.failcnt,
                percent: memory.percent(),
            })),
            event(EventBody::Net(NetEvent {
                rx_bytes: net_delta.rx_bytes,
                tx_bytes: net_delta.tx_bytes,
                rx_bytes_total: network.rx_bytes,
                tx_bytes_total: network.tx_bytes,
                interval_ms,
            })),
            event(EventBody::Blkio(BlkioEvent {
                read: blk_delta.read_bytes,
                write: blk_delta.write_bytes,
                total: blk_delta.total(),
                read_total: blkio.read_bytes,
                write_total: blkio.write_bytes,
                interval_ms,
            })),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlkioCounters, CpuUsage, MemoryUsage, NetworkCounters};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn snapshot(at: i64, rx: u64, tx: u64, read: u64, write: u64) -> StatsSnapshot {
        StatsSnapshot::with_counters(
            t(at),
            NetworkCounters {
                rx_bytes: rx,
                tx_bytes: tx,
            },
            BlkioCounters {
                read_bytes: read,
                write_bytes: write,
            },
        )
    }

    fn net_of(events: &[Event]) -> &NetEvent {
        events
            .iter()
            .find_map(|e| match &e.body {
                EventBody::Net(n) => Some(n),
                _ => None,
            })
            .unwrap()
    }

    fn blkio_of(events: &[Event]) -> &BlkioEvent {
        events
            .iter()
            .find_map(|e| match &e.body {
                EventBody::Blkio(b) => Some(b),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn emits_five_events_in_fixed_order() {
        let builder = EventBuilder::new(SharedCounterStore::new());
        let c = ContainerIdentity::new("abc", "web", "nginx:latest");
        let events = builder.build(&c, &snapshot(0, 1, 2, 3, 4)).unwrap();
        let kinds: Vec<_> = events.iter().map(Event::kind).collect();
        assert_eq!(kinds, ["container", "cpu", "memory", "net", "blkio"]);
        assert!(events.iter().all(|e| e.container_id == "abc" && e.container_name == "web"));
        match &events[0].body {
            EventBody::Container(info) => assert_eq!(info.image, "nginx:latest"),
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn network_deltas_follow_first_growth_and_reset() {
        let builder = EventBuilder::new(SharedCounterStore::new());
        let c = ContainerIdentity::new("a", "a", "img");

        let r1 = builder.build(&c, &snapshot(0, 1000, 500, 0, 0)).unwrap();
        let n = net_of(&r1);
        assert_eq!((n.rx_bytes, n.tx_bytes), (0, 0));
        assert_eq!((n.rx_bytes_total, n.tx_bytes_total), (1000, 500));
        assert_eq!(n.interval_ms, None);
        let stored = builder.store().get("a").unwrap();
        assert_eq!(stored.counters.network.rx_bytes, 1000);
        assert_eq!(stored.counters.network.tx_bytes, 500);

        let r2 = builder.build(&c, &snapshot(1, 1500, 500, 0, 0)).unwrap();
        let n = net_of(&r2);
        assert_eq!((n.rx_bytes, n.tx_bytes), (500, 0));
        assert_eq!(n.interval_ms, Some(1000));

        let r3 = builder.build(&c, &snapshot(2, 10, 5, 0, 0)).unwrap();
        let n = net_of(&r3);
        assert_eq!((n.rx_bytes, n.tx_bytes), (0, 0));
    }

    #[test]
    fn blkio_deltas_and_total() {
        let builder = EventBuilder::new(SharedCounterStore::new());
        let c = ContainerIdentity::new("b", "b", "img");
        let first = builder.build(&c, &snapshot(0, 0, 0, 100, 200)).unwrap();
        let b = blkio_of(&first);
        assert_eq!((b.read, b.write, b.total), (0, 0, 0));

        let second = builder.build(&c, &snapshot(1, 0, 0, 150, 260)).unwrap();
        let b = blkio_of(&second);
        assert_eq!((b.read, b.write, b.total), (50, 60, 110));
        assert_eq!((b.read_total, b.write_total), (150, 260));
    }

    #[test]
    fn identical_snapshots_give_zero_deltas() {
        let builder = EventBuilder::new(SharedCounterStore::new());
        let c = ContainerIdentity::new("a", "a", "img");
        let s = snapshot(0, 7, 8, 9, 10);
        builder.build(&c, &s).unwrap();
        let again = builder.build(&c, &s).unwrap();
        assert_eq!((net_of(&again).rx_bytes, net_of(&again).tx_bytes), (0, 0));
        assert_eq!(blkio_of(&again).total, 0);
        assert_eq!(net_of(&again).interval_ms, Some(0));
    }

    #[test]
    fn malformed_snapshot_emits_nothing_and_leaves_store_alone() {
        let builder = EventBuilder::new(SharedCounterStore::new());
        let c = ContainerIdentity::new("a", "a", "img");
        builder.build(&c, &snapshot(0, 100, 100, 0, 0)).unwrap();

        let mut bad = snapshot(1, 999, 999, 0, 0);
        bad.blkio = None;
        let err = builder.build(&c, &bad).unwrap_err();
        assert!(matches!(
            err,
            BuildError::MalformedSnapshot { missing: "blkio", .. }
        ));
        assert_eq!(
            builder.store().get("a").unwrap().counters.network.rx_bytes,
            100
        );

        let mut no_cpu = snapshot(1, 0, 0, 0, 0);
        no_cpu.cpu = None;
        assert!(builder.build(&c, &no_cpu).is_err());
    }

    #[test]
    fn cpu_and_memory_copied_from_snapshot() {
        let builder = EventBuilder::new(SharedCounterStore::new());
        let c = ContainerIdentity::new("a", "a", "img");
        let mut s = snapshot(0, 0, 0, 0, 0);
        s.cpu = Some(CpuUsage {
            total_usage: 10,
            usage_in_kernelmode: 3,
            usage_in_usermode: 7,
            percpu_usage: vec![4, 6],
            online_cpus: 2,
            percent: 12.5,
            throttled_periods: 1,
        });
        s.memory = Some(MemoryUsage {
            usage: 256,
            max_usage: 300,
            limit: 1024,
            failcnt: 0,
        });
        s.timestamp += Duration::milliseconds(5);
        let events = builder.build(&c, &s).unwrap();
        match (&events[1].body, &events[2].body) {
            (EventBody::Cpu(cpu), EventBody::Memory(mem)) => {
                assert_eq!(cpu.percpu_usage, vec![4, 6]);
                assert_eq!(cpu.percent, 12.5);
                assert_eq!(mem.limit, 1024);
                assert!((mem.percent - 25.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected bodies {other:?}"),
        }
    }
}
