use serde::Serialize;

use crate::{
    common::{Severity, types::ChannelId},
    protocol::tracks::Track,
};

/// Events emitted by a playback session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// A track began streaming ("now playing").
    #[serde(rename = "TrackStartEvent")]
    TrackStart {
        #[serde(rename = "channelId")]
        channel_id: ChannelId,
        track: Track,
        volume: u8,
    },

    #[serde(rename = "TrackEndEvent")]
    TrackEnd {
        #[serde(rename = "channelId")]
        channel_id: ChannelId,
        track: Track,
        reason: TrackEndReason,
    },

    #[serde(rename = "TrackExceptionEvent")]
    TrackException {
        #[serde(rename = "channelId")]
        channel_id: ChannelId,
        track: Track,
        exception: TrackException,
    },

    /// The queue ran dry; an idle disconnect is now pending.
    #[serde(rename = "QueueEndEvent")]
    QueueEnd {
        #[serde(rename = "channelId")]
        channel_id: ChannelId,
    },

    #[serde(rename = "DisconnectedEvent")]
    Disconnected {
        #[serde(rename = "channelId")]
        channel_id: ChannelId,
        reason: DisconnectReason,
    },
}

impl SessionEvent {
    pub fn channel_id(&self) -> ChannelId {
        match self {
            Self::TrackStart { channel_id, .. }
            | Self::TrackEnd { channel_id, .. }
            | Self::TrackException { channel_id, .. }
            | Self::QueueEnd { channel_id }
            | Self::Disconnected { channel_id, .. } => *channel_id,
        }
    }

    /// Short name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TrackStart { .. } => "TrackStart",
            Self::TrackEnd { .. } => "TrackEnd",
            Self::TrackException { .. } => "TrackException",
            Self::QueueEnd { .. } => "QueueEnd",
            Self::Disconnected { .. } => "Disconnected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackEndReason {
    Finished,
    LoadFailed,
    Skipped,
    Cleanup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DisconnectReason {
    Idle,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackException {
    pub message: Option<String>,
    pub severity: Severity,
    pub cause: String,
}
