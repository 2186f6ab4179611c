use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::types::ChannelId;

/// Exception severity levels. Playback failures are always faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Fault,
}

/// Failure to turn a query into track metadata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no results found for `{0}`")]
    NotFound(String),

    #[error("failed to resolve `{query}`: {reason}")]
    Resolution { query: String, reason: String },
}

impl ResolveError {
    pub fn resolution(query: impl Into<String>, reason: impl ToString) -> Self {
        Self::Resolution {
            query: query.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failure reported by the output device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputError {
    #[error("could not connect to channel {channel}: {reason}")]
    Connection { channel: ChannelId, reason: String },

    #[error("stream error: {0}")]
    Stream(String),
}

/// Errors surfaced synchronously to whoever drives a playback session.
///
/// Mid-stream failures are not part of this type: the session recovers from
/// them on its own and only reports them to the event sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no results found for `{0}`")]
    NotFound(String),

    #[error("resolution failed: {0}")]
    Resolution(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("playback is already starting")]
    AlreadyStarting,

    #[error("session has been stopped")]
    Terminated,
}

impl From<ResolveError> for SessionError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound(query) => Self::NotFound(query),
            err @ ResolveError::Resolution { .. } => Self::Resolution(err.to_string()),
        }
    }
}

impl From<OutputError> for SessionError {
    fn from(err: OutputError) -> Self {
        Self::Connection(err.to_string())
    }
}
