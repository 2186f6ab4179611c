use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{
    player::{context::PlayerContext, session::SessionInner},
    protocol::events::{DisconnectReason, SessionEvent},
};

/// Pending idle teardown. Dropping it leaves the task running; `cancel`
/// aborts it.
pub(crate) struct IdleTimer {
    generation: u64,
    task: JoinHandle<()>,
}

impl IdleTimer {
    pub(crate) fn cancel(self) {
        self.task.abort();
    }
}

/// Replaces any pending teardown with a fresh one.
pub(crate) fn schedule_idle_teardown(inner: &Arc<SessionInner>, ctx: &mut PlayerContext) {
    ctx.cancel_idle_timer();
    ctx.idle_generation += 1;

    let generation = ctx.idle_generation;
    let timeout = inner.config.idle_timeout();
    let session = Arc::downgrade(inner);

    let task = tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        if let Some(inner) = session.upgrade() {
            expire(&inner, generation).await;
        }
    });

    debug!(
        "[{}] idle teardown in {}s",
        inner.channel,
        timeout.as_secs()
    );
    ctx.idle_timer = Some(IdleTimer { generation, task });
}

async fn expire(inner: &Arc<SessionInner>, generation: u64) {
    let mut ctx = inner.state.lock().await;

    if ctx.idle_timer.as_ref().map(|t| t.generation) != Some(generation) {
        debug!("[{}] superseded idle timer fired", inner.channel);
        return;
    }
    // This task is the timer; let it finish instead of aborting it.
    ctx.idle_timer = None;

    if !ctx.is_idle() {
        debug!("[{}] no longer idle, keeping output", inner.channel);
        return;
    }

    info!("[{}] idle timeout reached, disconnecting", inner.channel);
    inner.terminate(&mut ctx);
    if let Some(handle) = ctx.output.take() {
        handle.release().await;
    }
    inner.emit(SessionEvent::Disconnected {
        channel_id: inner.channel,
        reason: DisconnectReason::Idle,
    });
}
