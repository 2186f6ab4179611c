use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use crate::{
    common::{errors::SessionError, types::ChannelId},
    configs::PlayerConfig,
    player::{Enqueued, PlaybackSession, SessionServices},
    protocol::tracks::{Requester, Track},
};

/// Registry of live playback sessions, one per channel.
pub struct SessionManager {
    sessions: DashMap<ChannelId, PlaybackSession>,
    services: SessionServices,
    config: PlayerConfig,
}

impl SessionManager {
    pub fn new(config: PlayerConfig, services: SessionServices) -> Self {
        Self {
            sessions: DashMap::new(),
            services,
            config,
        }
    }

    /// Live session for `channel`, if any.
    pub fn get(&self, channel: ChannelId) -> Option<PlaybackSession> {
        self.sessions
            .get(&channel)
            .map(|s| s.value().clone())
            .filter(|s| !s.is_terminated())
    }

    /// Live session for `channel`, creating one when missing or terminated.
    pub fn get_or_create(&self, channel: ChannelId) -> PlaybackSession {
        let mut entry = self
            .sessions
            .entry(channel)
            .or_insert_with(|| self.spawn(channel));

        if entry.is_terminated() {
            debug!("[{}] replacing terminated session", channel);
            *entry = self.spawn(channel);
        }
        entry.value().clone()
    }

    fn spawn(&self, channel: ChannelId) -> PlaybackSession {
        PlaybackSession::new(channel, self.config.clone(), self.services.clone())
    }

    /// Resolves `query` and appends it to the channel's queue. A session
    /// is only created once the query resolved.
    pub async fn enqueue_query(
        &self,
        channel: ChannelId,
        query: &str,
        requester: Requester,
    ) -> Result<Enqueued, SessionError> {
        let info = self.services.resolver.resolve(query).await?;
        let track = Track::new(info, requester);
        self.enqueue(channel, track).await
    }

    /// Appends an already resolved track.
    pub async fn enqueue(&self, channel: ChannelId, track: Track) -> Result<Enqueued, SessionError> {
        let session = self.get_or_create(channel);
        let position = match session.enqueue(track.clone()).await {
            // Lost a race with a teardown; the next lookup gives a fresh one.
            Err(SessionError::Terminated) => {
                self.get_or_create(channel).enqueue(track.clone()).await?
            }
            other => other?,
        };
        Ok(Enqueued { track, position })
    }

    pub async fn ensure_playing(&self, channel: ChannelId) -> Result<bool, SessionError> {
        match self.get(channel) {
            Some(session) => session.ensure_playing().await,
            None => Ok(false),
        }
    }

    /// Stops and forgets the channel's session.
    pub async fn stop(&self, channel: ChannelId) -> bool {
        match self.sessions.remove(&channel) {
            Some((_, session)) => session.stop().await,
            None => false,
        }
    }

    /// Drops entries whose session already terminated.
    pub fn prune(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_terminated());
        before - self.sessions.len()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions
            .iter()
            .filter(|entry| !entry.value().is_terminated())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stops every session. Used on process shutdown.
    pub async fn shutdown(&self) {
        let channels: Vec<ChannelId> = self.sessions.iter().map(|e| *e.key()).collect();
        info!("Shutting down {} session(s)", channels.len());
        for channel in channels {
            self.stop(channel).await;
        }
    }
}
