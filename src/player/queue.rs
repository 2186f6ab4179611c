use std::collections::VecDeque;

use rand::{Rng, seq::SliceRandom};

use crate::protocol::tracks::Track;

/// Pending tracks of a session, in play order.
#[derive(Debug, Clone, Default)]
pub struct TrackQueue {
    tracks: VecDeque<Track>,
}

impl TrackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends and returns the 1-based position.
    pub fn push_back(&mut self, track: Track) -> usize {
        self.tracks.push_back(track);
        self.tracks.len()
    }

    pub fn push_front(&mut self, track: Track) {
        self.tracks.push_front(track);
    }

    pub fn pop_front(&mut self) -> Option<Track> {
        self.tracks.pop_front()
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn to_vec(&self) -> Vec<Track> {
        self.tracks.iter().cloned().collect()
    }

    /// Fisher-Yates over the whole queue. Returns false, leaving the queue
    /// untouched, when there is nothing to reorder.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.tracks.len() < 2 {
            return false;
        }
        self.tracks.make_contiguous().shuffle(rng);
        true
    }
}
