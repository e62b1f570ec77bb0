// Domain models

mod container;
mod event;
mod snapshot;

pub use container::ContainerIdentity;
pub use event::{
    BlkioEvent, ContainerInfoEvent, CpuEvent, Event, EventBody, MemoryEvent, NetEvent,
};
pub use snapshot::{
    BlkioCounters, CpuUsage, CumulativeCounters, MemoryUsage, NetworkCounters, StatsSnapshot,
};
