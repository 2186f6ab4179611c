use serde::{Deserialize, Serialize};

use crate::{common::types::ChannelId, protocol::tracks::Track};

/// What happens to a track once it finishes naturally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RepeatMode {
    #[default]
    Off,
    /// Replay the same track.
    Track,
    /// Send the finished track to the back of the queue.
    Queue,
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerStatus {
    /// Nothing streaming; may or may not hold an output handle.
    #[default]
    Idle,
    /// Waiting on the output device to hand over a connection.
    Connecting,
    Playing,
    /// Terminal. The output handle has been released.
    Stopped,
}

/// Read-only view of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub channel_id: ChannelId,
    pub current: Option<Track>,
    pub queue: Vec<Track>,
    pub repeat_mode: RepeatMode,
    pub volume: u8,
    pub playing: bool,
    pub status: PlayerStatus,
    pub skip_votes: usize,
    pub idle_disconnect_pending: bool,
}

/// A track that made it into a queue, with its 1-based position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Enqueued {
    pub track: Track,
    pub position: usize,
}
