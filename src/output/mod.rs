//! Output device boundary.
//!
//! A session owns exactly one [`OutputHandle`] at a time. Every
//! [`OutputHandle::start`] call receives its own [`SignalSender`]; the device
//! reports the end of that stream through it, at most once, from any thread.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;

use crate::common::{errors::OutputError, types::ChannelId};

pub mod simulated;

pub use simulated::SimulatedOutput;

/// Outcome of one start call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSignal {
    Ended,
    Errored(String),
}

/// A [`TrackSignal`] tagged with the start call it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub attempt: u64,
    pub kind: TrackSignal,
}

/// One-shot reporter handed to the device for a single start call.
#[derive(Debug, Clone)]
pub struct SignalSender {
    attempt: u64,
    tx: flume::Sender<Signal>,
    fired: Arc<AtomicBool>,
}

impl SignalSender {
    pub(crate) fn new(attempt: u64, tx: flume::Sender<Signal>) -> Self {
        Self {
            attempt,
            tx,
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn ended(&self) {
        self.emit(TrackSignal::Ended);
    }

    pub fn errored(&self, message: impl Into<String>) {
        self.emit(TrackSignal::Errored(message.into()));
    }

    /// True once either signal has been delivered.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    fn emit(&self, kind: TrackSignal) {
        if self.fired.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = self.tx.send(Signal {
            attempt: self.attempt,
            kind,
        });
    }
}

/// Connects sessions to their channels.
#[async_trait]
pub trait OutputDevice: Send + Sync {
    async fn connect(&self, channel: ChannelId) -> Result<Arc<dyn OutputHandle>, OutputError>;
}

/// A live connection to one channel.
#[async_trait]
pub trait OutputHandle: Send + Sync {
    /// Begin streaming `locator` at `gain` (0.0..=1.0), replacing whatever
    /// was playing. An `Err` means the stream never started and `signals`
    /// will not be used.
    async fn start(
        &self,
        locator: &str,
        gain: f32,
        signals: SignalSender,
    ) -> Result<(), OutputError>;

    /// Stop the active stream. The device must then report `ended`.
    fn stop(&self);

    fn set_gain(&self, gain: f32);

    /// Drop the connection. The handle is not used afterwards.
    async fn release(&self);
}
