use std::sync::Arc;

use tracing::{info, warn};

use super::schedule_idle_teardown;
use crate::{
    common::Severity,
    output::SignalSender,
    player::{context::PlayerContext, session::SessionInner, state::PlayerStatus},
    protocol::{
        events::{SessionEvent, TrackEndReason, TrackException},
        tracks::Track,
    },
};

/// Starts the current track, or the queue head when nothing is current,
/// on the existing output handle.
///
/// Tracks whose start call fails are reported and dropped, and the next one
/// is tried. Goes idle once the queue runs out.
pub(crate) async fn start_current(inner: &Arc<SessionInner>, ctx: &mut PlayerContext) {
    loop {
        if !ctx.advance() {
            go_idle(inner, ctx);
            return;
        }

        let Some(handle) = ctx.output.clone() else {
            // Nothing to play on; the next ensure_playing reconnects.
            ctx.status = PlayerStatus::Idle;
            return;
        };
        let Some(track) = ctx.current().cloned() else {
            continue;
        };

        ctx.attempt += 1;
        ctx.skip_requested = false;
        let signals = SignalSender::new(ctx.attempt, inner.signal_tx.clone());

        match handle.start(track.locator(), ctx.gain(), signals).await {
            Ok(()) => {
                ctx.status = PlayerStatus::Playing;
                info!(
                    "[{}] now playing '{}' [{}] requested by {}",
                    inner.channel,
                    track.title(),
                    track.duration_label(),
                    track.requester.tag
                );
                inner.emit(SessionEvent::TrackStart {
                    channel_id: inner.channel,
                    track,
                    volume: ctx.volume,
                });
                return;
            }
            Err(e) => {
                warn!("[{}] failed to start '{}': {}", inner.channel, track.title(), e);
                report_exception(inner, track, e.to_string());
                finish_current(inner, ctx, TrackEndReason::LoadFailed);
            }
        }
    }
}

/// Ends the current track with `reason`. Failed tracks skip the repeat
/// policy.
pub(crate) fn finish_current(
    inner: &SessionInner,
    ctx: &mut PlayerContext,
    reason: TrackEndReason,
) {
    let requeue = reason != TrackEndReason::LoadFailed;
    if let Some(track) = ctx.finish_current(requeue) {
        inner.emit(SessionEvent::TrackEnd {
            channel_id: inner.channel,
            track,
            reason,
        });
    }
}

pub(crate) fn report_exception(inner: &SessionInner, track: Track, message: String) {
    inner.emit(SessionEvent::TrackException {
        channel_id: inner.channel,
        track,
        exception: TrackException {
            message: Some(message.clone()),
            severity: Severity::Fault,
            cause: message,
        },
    });
}

fn go_idle(inner: &Arc<SessionInner>, ctx: &mut PlayerContext) {
    ctx.status = PlayerStatus::Idle;
    info!("[{}] queue finished", inner.channel);
    inner.emit(SessionEvent::QueueEnd {
        channel_id: inner.channel,
    });

    if ctx.output.is_some() {
        schedule_idle_teardown(inner, ctx);
    }
}
