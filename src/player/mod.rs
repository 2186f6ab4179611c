//! Per-channel playback sessions: queue, repeat policy, vote skip, volume
//! and idle teardown.
//!
//! Session state is only reachable through [`PlaybackSession`]:
//!
//! ```compile_fail
//! use jukelink::player::context::PlayerContext;
//! ```

pub(crate) mod context;
mod manager;
pub mod queue;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
#[cfg(test)]
mod tests;

pub use queue::TrackQueue;
pub use session::{PlaybackSession, SessionServices};
pub use state::*;
