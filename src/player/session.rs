use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info};

use super::{
    context::{PlayerContext, clamp_volume},
    manager::{monitor_loop, start_current},
    state::{Enqueued, PlayerSnapshot, PlayerStatus, RepeatMode},
};
use crate::{
    common::{
        errors::SessionError,
        types::{ChannelId, UserId},
    },
    configs::PlayerConfig,
    monitoring::EventSink,
    output::{OutputDevice, Signal},
    protocol::{
        events::{DisconnectReason, SessionEvent, TrackEndReason},
        tracks::{Requester, Track},
    },
    sources::TrackResolver,
};

/// Collaborators shared by every session of a process.
#[derive(Clone)]
pub struct SessionServices {
    pub resolver: Arc<dyn TrackResolver>,
    pub output: Arc<dyn OutputDevice>,
    pub sink: Arc<dyn EventSink>,
}

pub(crate) struct SessionInner {
    pub(crate) channel: ChannelId,
    pub(crate) config: PlayerConfig,
    pub(crate) services: SessionServices,
    pub(crate) signal_tx: flume::Sender<Signal>,
    pub(crate) state: Mutex<PlayerContext>,
    monitor: parking_lot::Mutex<Option<JoinHandle<()>>>,
    terminated: AtomicBool,
}

impl SessionInner {
    pub(crate) fn emit(&self, event: SessionEvent) {
        self.services.sink.emit(event);
    }

    /// Marks the session terminal and stops listening for signals.
    pub(crate) fn terminate(&self, ctx: &mut PlayerContext) {
        ctx.status = PlayerStatus::Stopped;
        ctx.attempt += 1;
        self.terminated.store(true, Ordering::Release);
        if let Some(task) = self.monitor.lock().take() {
            task.abort();
        }
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        if let Some(task) = self.monitor.get_mut().take() {
            task.abort();
        }
        self.state.get_mut().cancel_idle_timer();
    }
}

/// Playback session bound to one channel.
///
/// Cheap to clone; clones drive the same session.
#[derive(Clone)]
pub struct PlaybackSession {
    pub(crate) inner: Arc<SessionInner>,
}

impl PlaybackSession {
    /// Creates the session and its signal monitor. Must be called from
    /// within a Tokio runtime.
    pub fn new(channel: ChannelId, config: PlayerConfig, services: SessionServices) -> Self {
        let (signal_tx, signal_rx) = flume::unbounded();
        let inner = Arc::new(SessionInner {
            channel,
            state: Mutex::new(PlayerContext::new(channel, config.default_volume)),
            config,
            services,
            signal_tx,
            monitor: parking_lot::Mutex::new(None),
            terminated: AtomicBool::new(false),
        });

        let task = tokio::spawn(monitor_loop(Arc::downgrade(&inner), signal_rx));
        *inner.monitor.lock() = Some(task);

        debug!("[{}] session created", channel);
        Self { inner }
    }

    pub fn channel(&self) -> ChannelId {
        self.inner.channel
    }

    /// True once `stop` or the idle teardown has run.
    pub fn is_terminated(&self) -> bool {
        self.inner.terminated.load(Ordering::Acquire)
    }

    /// Appends a track and returns its 1-based queue position.
    pub async fn enqueue(&self, track: Track) -> Result<usize, SessionError> {
        let mut ctx = self.inner.state.lock().await;
        if ctx.status == PlayerStatus::Stopped {
            return Err(SessionError::Terminated);
        }

        // A non-empty queue is no longer idle.
        ctx.cancel_idle_timer();
        let title = track.info.title.clone();
        let position = ctx.queue.push_back(track);
        info!("[{}] queued '{}' at #{}", self.inner.channel, title, position);
        Ok(position)
    }

    /// Resolves `query` and appends the result. Nothing changes on failure.
    pub async fn resolve_and_enqueue(
        &self,
        query: &str,
        requester: Requester,
    ) -> Result<Enqueued, SessionError> {
        let info = self.inner.services.resolver.resolve(query).await?;
        let track = Track::new(info, requester);
        let position = self.enqueue(track.clone()).await?;
        Ok(Enqueued { track, position })
    }

    /// Starts the queue head if nothing is playing.
    ///
    /// Returns `Ok(true)` when this call started a track. A second call
    /// while the output is still connecting fails with
    /// [`SessionError::AlreadyStarting`].
    pub async fn ensure_playing(&self) -> Result<bool, SessionError> {
        let inner = &self.inner;
        let mut ctx = inner.state.lock().await;
        match ctx.status {
            PlayerStatus::Stopped => return Err(SessionError::Terminated),
            PlayerStatus::Connecting => return Err(SessionError::AlreadyStarting),
            PlayerStatus::Playing => return Ok(false),
            PlayerStatus::Idle => {}
        }

        if !ctx.advance() {
            return Ok(false);
        }

        if ctx.output.is_none() {
            ctx.status = PlayerStatus::Connecting;
            drop(ctx);

            let connected = inner.services.output.connect(inner.channel).await;

            ctx = inner.state.lock().await;
            if ctx.status == PlayerStatus::Stopped {
                if let Ok(handle) = connected {
                    handle.release().await;
                }
                return Err(SessionError::Terminated);
            }

            match connected {
                Ok(handle) => {
                    info!("[{}] output connected", inner.channel);
                    ctx.output = Some(handle);
                }
                Err(e) => {
                    tracing::error!("[{}] {}", inner.channel, e);
                    ctx.status = PlayerStatus::Idle;
                    return Err(e.into());
                }
            }
        }

        ctx.cancel_idle_timer();
        start_current(inner, &mut ctx).await;
        Ok(ctx.is_playing())
    }

    /// Stops the current track; the resulting end signal advances the
    /// queue. `false` when nothing is playing.
    pub async fn skip(&self) -> bool {
        let mut ctx = self.inner.state.lock().await;
        if !ctx.is_playing() {
            return false;
        }
        let Some(handle) = ctx.output.clone() else {
            return false;
        };

        if let Some(track) = ctx.current() {
            info!("[{}] skipping '{}'", self.inner.channel, track.title());
        }
        ctx.skip_requested = true;
        handle.stop();
        true
    }

    /// Clears everything, releases the output and terminates the session.
    ///
    /// Returns whether there was anything to stop.
    pub async fn stop(&self) -> bool {
        let inner = &self.inner;
        let mut ctx = inner.state.lock().await;
        if ctx.status == PlayerStatus::Stopped {
            return false;
        }

        let had_work =
            ctx.current().is_some() || !ctx.queue.is_empty() || ctx.output.is_some();

        ctx.cancel_idle_timer();
        ctx.queue.clear();
        if let Some(track) = ctx.set_current(None) {
            inner.emit(SessionEvent::TrackEnd {
                channel_id: inner.channel,
                track,
                reason: TrackEndReason::Cleanup,
            });
        }
        inner.terminate(&mut ctx);

        if let Some(handle) = ctx.output.take() {
            handle.stop();
            handle.release().await;
            inner.emit(SessionEvent::Disconnected {
                channel_id: inner.channel,
                reason: DisconnectReason::Stopped,
            });
        }

        info!("[{}] session stopped", inner.channel);
        had_work
    }

    /// Clamps to 0-100 and returns the stored volume. Applied live when
    /// something is playing.
    pub async fn set_volume(&self, volume: i32) -> u8 {
        let mut ctx = self.inner.state.lock().await;
        ctx.volume = clamp_volume(volume);

        if ctx.is_playing() {
            if let Some(handle) = &ctx.output {
                handle.set_gain(ctx.gain());
            }
        }

        debug!("[{}] volume set to {}", self.inner.channel, ctx.volume);
        ctx.volume
    }

    pub async fn set_repeat_mode(&self, mode: RepeatMode) {
        let mut ctx = self.inner.state.lock().await;
        ctx.repeat_mode = mode;
        debug!("[{}] repeat mode {:?}", self.inner.channel, mode);
    }

    /// Shuffles the pending queue. `false` with fewer than two tracks.
    pub async fn shuffle(&self) -> bool {
        let mut ctx = self.inner.state.lock().await;
        ctx.queue.shuffle(&mut rand::thread_rng())
    }

    /// Records a skip vote for the current track and returns the tally.
    /// `None` when nothing is current.
    pub async fn register_skip_vote(&self, user: UserId) -> Option<usize> {
        let mut ctx = self.inner.state.lock().await;
        let tally = ctx.add_skip_vote(user);
        if let Some(votes) = tally {
            debug!("[{}] skip vote from {} ({} total)", self.inner.channel, user, votes);
        }
        tally
    }

    pub async fn snapshot(&self) -> PlayerSnapshot {
        self.inner.state.lock().await.snapshot()
    }
}
