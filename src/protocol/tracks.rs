use serde::{Deserialize, Serialize};

use crate::common::types::UserId;

/// Metadata produced by a source for one playable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub title: String,
    /// Opaque resource reference handed to the output device.
    pub locator: String,
    /// Length in seconds; `None` for live or unknown.
    pub duration_secs: Option<u64>,
    pub thumbnail: Option<String>,
    pub source_name: String,
}

/// Who asked for a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requester {
    pub id: UserId,
    /// Display text, e.g. `name#0001`.
    pub tag: String,
}

impl Requester {
    pub fn new(id: impl Into<UserId>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
        }
    }
}

/// A resolved track waiting in a queue or playing.
///
/// Never mutated after creation; it moves between the queue and the
/// current slot of exactly one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub info: TrackInfo,
    pub requester: Requester,
}

impl Track {
    pub fn new(info: TrackInfo, requester: Requester) -> Self {
        Self { info, requester }
    }

    pub fn title(&self) -> &str {
        &self.info.title
    }

    pub fn locator(&self) -> &str {
        &self.info.locator
    }

    /// `h:mm:ss`, `m:ss`, or `Live` when the length is unknown.
    pub fn duration_label(&self) -> String {
        format_duration(self.info.duration_secs)
    }
}

pub fn format_duration(secs: Option<u64>) -> String {
    let Some(secs) = secs.filter(|s| *s > 0) else {
        return "Live".to_string();
    };

    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
