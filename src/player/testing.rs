//! Scripted collaborators for session tests.

use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    common::{
        errors::{OutputError, ResolveError},
        types::ChannelId,
    },
    configs::PlayerConfig,
    monitoring::ChannelSink,
    output::{OutputDevice, OutputHandle, SignalSender},
    player::{PlaybackSession, SessionServices},
    protocol::{
        events::SessionEvent,
        tracks::{Requester, Track, TrackInfo},
    },
    sources::TrackResolver,
};

pub(crate) fn info(title: &str) -> TrackInfo {
    TrackInfo {
        title: title.to_string(),
        locator: format!("mock://{}", title),
        duration_secs: Some(200),
        thumbnail: None,
        source_name: "mock".to_string(),
    }
}

pub(crate) fn track(title: &str) -> Track {
    Track::new(info(title), Requester::new(1, "tester#0001"))
}

/// Resolves any query to a track named after it, except `missing`
/// (not found) and `broken` (lookup failure).
pub(crate) struct MockResolver;

#[async_trait]
impl TrackResolver for MockResolver {
    async fn resolve(&self, query: &str) -> Result<TrackInfo, ResolveError> {
        match query {
            "missing" => Err(ResolveError::NotFound(query.to_string())),
            "broken" => Err(ResolveError::resolution(query, "connection reset")),
            _ => Ok(info(query)),
        }
    }
}

/// Output device that records calls and only ends tracks when told to.
#[derive(Default)]
pub(crate) struct MockOutput {
    connects: AtomicUsize,
    releases: AtomicUsize,
    fail_connect: AtomicBool,
    connect_delay: Mutex<Option<Duration>>,
    failing_locators: Mutex<HashSet<String>>,
    started: Mutex<Vec<String>>,
    gain: Mutex<Option<f32>>,
    signals: Mutex<Option<SignalSender>>,
}

impl MockOutput {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn delay_connect(&self, delay: Duration) {
        *self.connect_delay.lock() = Some(delay);
    }

    pub(crate) fn fail_start(&self, title: &str) {
        self.failing_locators.lock().insert(format!("mock://{}", title));
    }

    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub(crate) fn started(&self) -> Vec<String> {
        self.started.lock().clone()
    }

    pub(crate) fn gain(&self) -> Option<f32> {
        *self.gain.lock()
    }

    /// Reports a natural end of the active stream.
    pub(crate) fn finish(&self) {
        if let Some(signals) = self.signals.lock().take() {
            signals.ended();
        }
    }

    /// Reports a mid-stream failure of the active stream.
    pub(crate) fn fail(&self, message: &str) {
        if let Some(signals) = self.signals.lock().take() {
            signals.errored(message);
        }
    }

    pub(crate) fn active_attempt(&self) -> Option<u64> {
        self.signals.lock().as_ref().map(SignalSender::attempt)
    }
}

struct MockHandle {
    device: Arc<MockOutput>,
}

#[async_trait]
impl OutputDevice for Arc<MockOutput> {
    async fn connect(&self, channel: ChannelId) -> Result<Arc<dyn OutputHandle>, OutputError> {
        let delay = *self.connect_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(OutputError::Connection {
                channel,
                reason: "missing permissions".into(),
            });
        }
        Ok(Arc::new(MockHandle {
            device: Arc::clone(self),
        }))
    }
}

#[async_trait]
impl OutputHandle for MockHandle {
    async fn start(
        &self,
        locator: &str,
        gain: f32,
        signals: SignalSender,
    ) -> Result<(), OutputError> {
        if self.device.failing_locators.lock().contains(locator) {
            return Err(OutputError::Stream(format!("cannot open {}", locator)));
        }

        self.device.started.lock().push(locator.to_string());
        *self.device.gain.lock() = Some(gain);
        *self.device.signals.lock() = Some(signals);
        Ok(())
    }

    fn stop(&self) {
        self.device.finish();
    }

    fn set_gain(&self, gain: f32) {
        *self.device.gain.lock() = Some(gain);
    }

    async fn release(&self) {
        self.device.releases.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) struct Harness {
    pub session: PlaybackSession,
    pub output: Arc<MockOutput>,
    pub events: flume::Receiver<SessionEvent>,
}

pub(crate) fn services(output: &Arc<MockOutput>) -> (SessionServices, flume::Receiver<SessionEvent>) {
    let (sink, events) = ChannelSink::new();
    let services = SessionServices {
        resolver: Arc::new(MockResolver),
        output: Arc::new(Arc::clone(output)),
        sink: Arc::new(sink),
    };
    (services, events)
}

pub(crate) fn harness() -> Harness {
    let output = MockOutput::new();
    let (services, events) = services(&output);
    let session = PlaybackSession::new(ChannelId(7), PlayerConfig::default(), services);
    Harness {
        session,
        output,
        events,
    }
}

/// Next event, failing the test if none shows up within `within`.
pub(crate) async fn next_event_within(
    events: &flume::Receiver<SessionEvent>,
    within: Duration,
) -> SessionEvent {
    match tokio::time::timeout(within, events.recv_async()).await {
        Ok(Ok(event)) => event,
        Ok(Err(_)) => panic!("event channel closed"),
        Err(_) => panic!("no event within {:?}", within),
    }
}

pub(crate) async fn next_event(events: &flume::Receiver<SessionEvent>) -> SessionEvent {
    next_event_within(events, Duration::from_secs(5)).await
}

/// Title of the track carried by a start event; panics on anything else.
pub(crate) fn started_title(event: &SessionEvent) -> &str {
    match event {
        SessionEvent::TrackStart { track, .. } => track.title(),
        other => panic!("expected TrackStart, got {:?}", other),
    }
}
