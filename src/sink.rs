// Event sinks. Publishing is fire-and-forget: the collector logs failures and moves on.

use crate::error::PublishError;
use crate::models::Event;
use async_trait::async_trait;
use std::io::Write;
use tokio::sync::mpsc;

#[async_trait]
pub trait EventSink: Send + Sync + 'static {
    /// Accepts one container's batch, in order.
    async fn publish(&self, events: Vec<Event>) -> Result<(), PublishError>;
}

/// Writes one JSON document per event to stdout.
#[derive(Debug, Default)]
pub struct StdoutSink {
    pretty: bool,
}

impl StdoutSink {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

/// Serializes a batch into newline-terminated JSON documents.
pub(crate) fn encode_batch(events: &[Event], pretty: bool) -> Result<Vec<u8>, PublishError> {
    let mut buf = Vec::new();
    for event in events {
        if pretty {
            serde_json::to_writer_pretty(&mut buf, event)?;
        } else {
            serde_json::to_writer(&mut buf, event)?;
        }
        buf.push(b'\n');
    }
    Ok(buf)
}

#[async_trait]
impl EventSink for StdoutSink {
    async fn publish(&self, events: Vec<Event>) -> Result<(), PublishError> {
        let buf = encode_batch(&events, self.pretty)?;
        // One locked write per batch keeps a container's events contiguous.
        let mut out = std::io::stdout().lock();
        out.write_all(&buf)?;
        out.flush()?;
        Ok(())
    }
}

/// Emits every event as an INFO tracing record.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl EventSink for LogSink {
    async fn publish(&self, events: Vec<Event>) -> Result<(), PublishError> {
        for event in &events {
            let body = serde_json::to_string(event)?;
            tracing::info!(
                target: "dockerbeat::events",
                container_id = %event.container_id,
                kind = event.kind(),
                event = %body,
                "event"
            );
        }
        Ok(())
    }
}

/// Forwards each batch over an mpsc channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Vec<Event>>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Vec<Event>>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving end, with room for `capacity` batches.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Vec<Event>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn publish(&self, events: Vec<Event>) -> Result<(), PublishError> {
        self.tx.send(events).await.map_err(|_| PublishError::Closed)
    }
}
