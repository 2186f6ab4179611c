use std::sync::{Arc, Weak};

use tracing::{debug, warn};

use super::start::{finish_current, report_exception, start_current};
use crate::{
    output::{Signal, TrackSignal},
    player::session::SessionInner,
    protocol::events::TrackEndReason,
};

/// Feeds completion signals into the session until it is dropped or
/// terminated.
pub(crate) async fn monitor_loop(session: Weak<SessionInner>, signals: flume::Receiver<Signal>) {
    while let Ok(signal) = signals.recv_async().await {
        let Some(inner) = session.upgrade() else {
            break;
        };
        handle_signal(&inner, signal).await;
    }
}

async fn handle_signal(inner: &Arc<SessionInner>, signal: Signal) {
    let mut ctx = inner.state.lock().await;

    if !ctx.is_playing() || signal.attempt != ctx.attempt {
        debug!(
            "[{}] ignoring stale {:?} for attempt {} (active {})",
            inner.channel, signal.kind, signal.attempt, ctx.attempt
        );
        return;
    }

    match signal.kind {
        TrackSignal::Ended => {
            let reason = if std::mem::take(&mut ctx.skip_requested) {
                TrackEndReason::Skipped
            } else {
                TrackEndReason::Finished
            };
            finish_current(inner, &mut ctx, reason);
        }
        TrackSignal::Errored(message) => {
            if let Some(track) = ctx.current().cloned() {
                warn!(
                    "[{}] mid-playback error on '{}': {}",
                    inner.channel,
                    track.title(),
                    message
                );
                report_exception(inner, track, message);
            }
            finish_current(inner, &mut ctx, TrackEndReason::LoadFailed);
        }
    }

    start_current(inner, &mut ctx).await;
}
