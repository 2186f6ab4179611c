use std::{collections::HashSet, sync::Arc};

use super::{
    manager::IdleTimer,
    queue::TrackQueue,
    state::{PlayerSnapshot, PlayerStatus, RepeatMode},
};
use crate::{
    common::types::{ChannelId, UserId},
    output::OutputHandle,
    protocol::tracks::Track,
};

/// Mutable state of one playback session. Always accessed under the
/// session lock.
pub(crate) struct PlayerContext {
    pub(crate) channel: ChannelId,
    pub(crate) queue: TrackQueue,
    current: Option<Track>,
    pub(crate) repeat_mode: RepeatMode,
    pub(crate) volume: u8,
    skip_votes: HashSet<UserId>,
    pub(crate) status: PlayerStatus,
    pub(crate) output: Option<Arc<dyn OutputHandle>>,
    pub(crate) idle_timer: Option<IdleTimer>,
    pub(crate) idle_generation: u64,
    /// Id of the most recent start call. Signals carrying any other id are
    /// stale.
    pub(crate) attempt: u64,
    /// Set by `skip` so the next ended signal is reported as skipped.
    pub(crate) skip_requested: bool,
}

impl PlayerContext {
    pub(crate) fn new(channel: ChannelId, volume: u8) -> Self {
        Self {
            channel,
            queue: TrackQueue::new(),
            current: None,
            repeat_mode: RepeatMode::Off,
            volume: clamp_volume(volume as i32),
            skip_votes: HashSet::new(),
            status: PlayerStatus::Idle,
            output: None,
            idle_timer: None,
            idle_generation: 0,
            attempt: 0,
            skip_requested: false,
        }
    }

    pub(crate) fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    /// Replaces the current track. Votes never outlive the track they were
    /// cast against.
    pub(crate) fn set_current(&mut self, track: Option<Track>) -> Option<Track> {
        self.skip_votes.clear();
        std::mem::replace(&mut self.current, track)
    }

    /// Moves the queue head into the empty current slot.
    pub(crate) fn advance(&mut self) -> bool {
        if self.current.is_none() {
            if let Some(next) = self.queue.pop_front() {
                self.set_current(Some(next));
            }
        }
        self.current.is_some()
    }

    /// Clears the current track and applies the repeat mode to it.
    /// `requeue` is false for tracks that failed.
    pub(crate) fn finish_current(&mut self, requeue: bool) -> Option<Track> {
        let track = self.set_current(None)?;
        if requeue {
            match self.repeat_mode {
                RepeatMode::Track => self.queue.push_front(track.clone()),
                RepeatMode::Queue => {
                    self.queue.push_back(track.clone());
                }
                RepeatMode::Off => {}
            }
        }
        Some(track)
    }

    pub(crate) fn add_skip_vote(&mut self, user: UserId) -> Option<usize> {
        self.current.as_ref()?;
        self.skip_votes.insert(user);
        Some(self.skip_votes.len())
    }

    pub(crate) fn skip_votes(&self) -> usize {
        self.skip_votes.len()
    }

    pub(crate) fn is_playing(&self) -> bool {
        self.status == PlayerStatus::Playing
    }

    /// Connected, silent and with nothing left to play.
    pub(crate) fn is_idle(&self) -> bool {
        self.status == PlayerStatus::Idle
            && self.current.is_none()
            && self.queue.is_empty()
            && self.output.is_some()
    }

    pub(crate) fn gain(&self) -> f32 {
        self.volume as f32 / 100.0
    }

    pub(crate) fn cancel_idle_timer(&mut self) -> bool {
        match self.idle_timer.take() {
            Some(timer) => {
                timer.cancel();
                true
            }
            None => false,
        }
    }

    pub(crate) fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            channel_id: self.channel,
            current: self.current.clone(),
            queue: self.queue.to_vec(),
            repeat_mode: self.repeat_mode,
            volume: self.volume,
            playing: self.is_playing(),
            status: self.status,
            skip_votes: self.skip_votes.len(),
            idle_disconnect_pending: self.idle_timer.is_some(),
        }
    }
}

pub(crate) fn clamp_volume(volume: i32) -> u8 {
    volume.clamp(0, 100) as u8
}
