use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::{OutputDevice, OutputHandle, SignalSender};
use crate::common::{errors::OutputError, types::ChannelId};

/// Stand-in output that "plays" each locator for a fixed time.
///
/// Useful for running the service without a voice transport attached.
pub struct SimulatedOutput {
    track_length: Duration,
}

impl SimulatedOutput {
    pub fn new(track_length: Duration) -> Self {
        Self { track_length }
    }
}

#[async_trait]
impl OutputDevice for SimulatedOutput {
    async fn connect(&self, channel: ChannelId) -> Result<Arc<dyn OutputHandle>, OutputError> {
        info!("[{}] simulated output connected", channel);
        Ok(Arc::new(SimulatedHandle {
            channel,
            track_length: self.track_length,
            released: AtomicBool::new(false),
            active: Mutex::new(None),
        }))
    }
}

struct ActiveStream {
    signals: SignalSender,
    task: tokio::task::JoinHandle<()>,
}

struct SimulatedHandle {
    channel: ChannelId,
    track_length: Duration,
    released: AtomicBool,
    active: Mutex<Option<ActiveStream>>,
}

impl SimulatedHandle {
    fn halt(&self) {
        if let Some(active) = self.active.lock().take() {
            active.task.abort();
            active.signals.ended();
        }
    }
}

#[async_trait]
impl OutputHandle for SimulatedHandle {
    async fn start(
        &self,
        locator: &str,
        gain: f32,
        signals: SignalSender,
    ) -> Result<(), OutputError> {
        if self.released.load(Ordering::Acquire) {
            return Err(OutputError::Stream("handle already released".into()));
        }

        self.halt();
        info!(
            "[{}] simulated playback of {} at gain {:.2}",
            self.channel, locator, gain
        );

        let length = self.track_length;
        let finished = signals.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(length).await;
            finished.ended();
        });

        *self.active.lock() = Some(ActiveStream { signals, task });
        Ok(())
    }

    fn stop(&self) {
        debug!("[{}] simulated output stopped", self.channel);
        self.halt();
    }

    fn set_gain(&self, gain: f32) {
        if self.active.lock().is_some() {
            debug!("[{}] simulated gain now {:.2}", self.channel, gain);
        }
    }

    async fn release(&self) {
        self.halt();
        self.released.store(true, Ordering::Release);
        info!("[{}] simulated output released", self.channel);
    }
}
