use std::sync::Arc;

use tracing::{info, warn};

use crate::protocol::events::SessionEvent;

/// Receives session events. Must never block the caller.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SessionEvent);
}

/// Writes every event to the log as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: SessionEvent) {
        let json = serde_json::to_string(&event).unwrap_or_default();
        match event {
            SessionEvent::TrackException { .. } => {
                warn!("[{}] {}: {}", event.channel_id(), event.kind(), json)
            }
            _ => info!("[{}] {}: {}", event.channel_id(), event.kind(), json),
        }
    }
}

/// Forwards events to whoever holds the receiving end, e.g. a layer that
/// posts "now playing" messages.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: flume::Sender<SessionEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, flume::Receiver<SessionEvent>) {
        let (sender, receiver) = flume::unbounded();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine.
        let _ = self.sender.send(event);
    }
}

/// Hands each event to several sinks in order.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutSink {
    fn emit(&self, event: SessionEvent) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.emit(event.clone());
            }
            last.emit(event);
        }
    }
}
