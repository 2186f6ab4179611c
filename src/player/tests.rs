use std::time::Duration;

use super::{
    state::{PlayerStatus, RepeatMode},
    testing::{Harness, harness, next_event, next_event_within, started_title, track},
};
use crate::{
    common::{
        errors::SessionError,
        types::UserId,
    },
    output::{Signal, TrackSignal},
    protocol::{
        events::{DisconnectReason, SessionEvent, TrackEndReason},
        tracks::Requester,
    },
};

const IDLE: Duration = Duration::from_secs(300);

fn titles(tracks: &[crate::protocol::tracks::Track]) -> Vec<&str> {
    tracks.iter().map(|t| t.title()).collect()
}

async fn expect_end(h: &Harness, title: &str, reason: TrackEndReason) {
    match next_event(&h.events).await {
        SessionEvent::TrackEnd {
            track, reason: r, ..
        } => {
            assert_eq!(track.title(), title);
            assert_eq!(r, reason);
        }
        other => panic!("expected TrackEnd for {}, got {:?}", title, other),
    }
}

async fn expect_start(h: &Harness, title: &str) {
    assert_eq!(started_title(&next_event(&h.events).await), title);
}

async fn expect_queue_end(h: &Harness) {
    assert!(matches!(
        next_event(&h.events).await,
        SessionEvent::QueueEnd { .. }
    ));
}

async fn play(h: &Harness, names: &[&str]) {
    for name in names {
        h.session.enqueue(track(name)).await.expect("enqueue");
    }
    assert_eq!(h.session.ensure_playing().await, Ok(true));
    expect_start(h, names[0]).await;
}

#[tokio::test]
async fn plays_queue_in_order_then_goes_idle() {
    let h = harness();
    play(&h, &["a", "b"]).await;

    let snap = h.session.snapshot().await;
    assert_eq!(snap.current.as_ref().map(|t| t.title()), Some("a"));
    assert_eq!(titles(&snap.queue), ["b"]);
    assert!(snap.playing);

    h.output.finish();
    expect_end(&h, "a", TrackEndReason::Finished).await;
    expect_start(&h, "b").await;

    let snap = h.session.snapshot().await;
    assert_eq!(snap.current.as_ref().map(|t| t.title()), Some("b"));
    assert!(snap.queue.is_empty());

    h.output.finish();
    expect_end(&h, "b", TrackEndReason::Finished).await;
    expect_queue_end(&h).await;

    let snap = h.session.snapshot().await;
    assert_eq!(snap.current, None);
    assert!(!snap.playing);
    assert_eq!(snap.status, PlayerStatus::Idle);
    assert!(snap.idle_disconnect_pending);
    assert_eq!(h.output.started(), ["mock://a", "mock://b"]);
    assert_eq!(h.output.connects(), 1);
}

#[tokio::test]
async fn ensure_playing_with_nothing_queued_is_a_noop() {
    let h = harness();
    assert_eq!(h.session.ensure_playing().await, Ok(false));
    assert_eq!(h.output.connects(), 0);
    assert!(h.events.try_recv().is_err());
}

#[tokio::test]
async fn ensure_playing_while_playing_does_not_restart() {
    let h = harness();
    play(&h, &["a"]).await;
    h.session.enqueue(track("b")).await.expect("enqueue");

    assert_eq!(h.session.ensure_playing().await, Ok(false));
    assert_eq!(h.output.started(), ["mock://a"]);
}

#[tokio::test]
async fn track_repeat_replays_the_same_track() {
    let h = harness();
    h.session.set_repeat_mode(RepeatMode::Track).await;
    play(&h, &["a", "b"]).await;

    for _ in 0..3 {
        h.output.finish();
        expect_end(&h, "a", TrackEndReason::Finished).await;
        expect_start(&h, "a").await;

        let snap = h.session.snapshot().await;
        assert_eq!(snap.current.as_ref().map(|t| t.title()), Some("a"));
        assert_eq!(titles(&snap.queue), ["b"]);
    }
}

#[tokio::test]
async fn queue_repeat_cycles_through_everything() {
    let h = harness();
    h.session.set_repeat_mode(RepeatMode::Queue).await;
    play(&h, &["a", "b"]).await;

    h.output.finish();
    expect_end(&h, "a", TrackEndReason::Finished).await;
    expect_start(&h, "b").await;
    assert_eq!(titles(&h.session.snapshot().await.queue), ["a"]);

    h.output.finish();
    expect_end(&h, "b", TrackEndReason::Finished).await;
    expect_start(&h, "a").await;
    assert_eq!(titles(&h.session.snapshot().await.queue), ["b"]);
}

#[tokio::test]
async fn stream_error_is_reported_and_never_requeued() {
    let h = harness();
    h.session.set_repeat_mode(RepeatMode::Track).await;
    play(&h, &["a", "b"]).await;

    h.output.fail("decoder exploded");
    match next_event(&h.events).await {
        SessionEvent::TrackException {
            track, exception, ..
        } => {
            assert_eq!(track.title(), "a");
            assert_eq!(exception.message.as_deref(), Some("decoder exploded"));
        }
        other => panic!("expected TrackException, got {:?}", other),
    }
    expect_end(&h, "a", TrackEndReason::LoadFailed).await;
    expect_start(&h, "b").await;

    let snap = h.session.snapshot().await;
    assert!(snap.queue.is_empty(), "failed track came back");
}

#[tokio::test]
async fn error_on_last_track_goes_idle() {
    let h = harness();
    h.session.set_repeat_mode(RepeatMode::Queue).await;
    play(&h, &["a"]).await;

    h.output.fail("stream reset");
    assert!(matches!(
        next_event(&h.events).await,
        SessionEvent::TrackException { .. }
    ));
    expect_end(&h, "a", TrackEndReason::LoadFailed).await;
    expect_queue_end(&h).await;

    let snap = h.session.snapshot().await;
    assert!(!snap.playing);
    assert!(snap.idle_disconnect_pending);
}

#[tokio::test]
async fn failed_start_moves_on_to_the_next_track() {
    let h = harness();
    h.output.fail_start("bad");
    h.session.enqueue(track("bad")).await.expect("enqueue");
    h.session.enqueue(track("good")).await.expect("enqueue");

    assert_eq!(h.session.ensure_playing().await, Ok(true));
    assert!(matches!(
        next_event(&h.events).await,
        SessionEvent::TrackException { .. }
    ));
    expect_end(&h, "bad", TrackEndReason::LoadFailed).await;
    expect_start(&h, "good").await;
    assert_eq!(h.output.started(), ["mock://good"]);
}

#[tokio::test]
async fn stale_signals_are_ignored() {
    let h = harness();
    play(&h, &["a", "b"]).await;

    let old_attempt = h.output.active_attempt().expect("attempt");
    h.output.finish();
    expect_end(&h, "a", TrackEndReason::Finished).await;
    expect_start(&h, "b").await;

    // A late duplicate from the first stream must not end "b".
    h.session
        .inner
        .signal_tx
        .send(Signal {
            attempt: old_attempt,
            kind: TrackSignal::Ended,
        })
        .expect("send");
    h.output.fail("real failure");

    match next_event(&h.events).await {
        SessionEvent::TrackException { track, .. } => assert_eq!(track.title(), "b"),
        other => panic!("stale signal was honoured: {:?}", other),
    }
}

#[tokio::test]
async fn skip_votes_are_idempotent_and_reset_by_skip() {
    let h = harness();
    play(&h, &["a"]).await;

    assert_eq!(h.session.register_skip_vote(UserId(1)).await, Some(1));
    assert_eq!(h.session.register_skip_vote(UserId(1)).await, Some(1));
    assert_eq!(h.session.snapshot().await.skip_votes, 1);

    assert!(h.session.skip().await);
    expect_end(&h, "a", TrackEndReason::Skipped).await;
    expect_queue_end(&h).await;

    let snap = h.session.snapshot().await;
    assert_eq!(snap.current, None);
    assert_eq!(snap.skip_votes, 0);
    assert_eq!(h.session.register_skip_vote(UserId(2)).await, None);
}

#[tokio::test]
async fn skip_without_playback_fails() {
    let h = harness();
    assert!(!h.session.skip().await);

    h.session.enqueue(track("a")).await.expect("enqueue");
    assert!(!h.session.skip().await);
    assert_eq!(h.session.snapshot().await.queue.len(), 1);
}

#[tokio::test]
async fn skip_under_track_repeat_replays_the_track() {
    let h = harness();
    h.session.set_repeat_mode(RepeatMode::Track).await;
    play(&h, &["a", "b"]).await;

    assert!(h.session.skip().await);
    expect_end(&h, "a", TrackEndReason::Skipped).await;
    expect_start(&h, "a").await;
}

#[tokio::test]
async fn stop_clears_everything_regardless_of_repeat() {
    for mode in [RepeatMode::Off, RepeatMode::Track, RepeatMode::Queue] {
        let h = harness();
        h.session.set_repeat_mode(mode).await;
        play(&h, &["a", "b", "c"]).await;

        assert!(h.session.stop().await);
        expect_end(&h, "a", TrackEndReason::Cleanup).await;
        assert!(matches!(
            next_event(&h.events).await,
            SessionEvent::Disconnected {
                reason: DisconnectReason::Stopped,
                ..
            }
        ));

        let snap = h.session.snapshot().await;
        assert_eq!(snap.current, None, "{:?} kept the current track", mode);
        assert!(snap.queue.is_empty(), "{:?} kept queued tracks", mode);
        assert_eq!(snap.status, PlayerStatus::Stopped);
        assert!(!snap.idle_disconnect_pending);
        assert_eq!(h.output.releases(), 1);
        assert!(h.session.is_terminated());

        assert!(!h.session.stop().await);
        assert_eq!(h.session.ensure_playing().await, Err(SessionError::Terminated));
        assert_eq!(
            h.session.enqueue(track("d")).await,
            Err(SessionError::Terminated)
        );
    }
}

#[tokio::test]
async fn stop_on_a_fresh_session_reports_nothing_stopped() {
    let h = harness();
    assert!(!h.session.stop().await);
    assert!(h.session.is_terminated());
    assert!(h.events.try_recv().is_err());
}

#[tokio::test]
async fn volume_is_clamped_and_applied_live() {
    let h = harness();
    assert_eq!(h.session.set_volume(150).await, 100);
    assert_eq!(h.session.set_volume(-3).await, 0);
    assert_eq!(h.session.set_volume(40).await, 40);

    play(&h, &["a"]).await;
    assert_eq!(h.output.gain(), Some(0.4));

    assert_eq!(h.session.set_volume(80).await, 80);
    assert_eq!(h.output.gain(), Some(0.8));
    assert_eq!(h.output.started().len(), 1);
    assert_eq!(h.session.snapshot().await.volume, 80);
}

#[tokio::test]
async fn shuffle_needs_at_least_two_pending_tracks() {
    let h = harness();
    assert!(!h.session.shuffle().await);

    h.session.enqueue(track("a")).await.expect("enqueue");
    assert!(!h.session.shuffle().await);

    for name in ["b", "c", "d"] {
        h.session.enqueue(track(name)).await.expect("enqueue");
    }
    assert!(h.session.shuffle().await);

    let mut queued = titles(&h.session.snapshot().await.queue)
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    queued.sort();
    assert_eq!(queued, ["a", "b", "c", "d"]);
}

#[tokio::test]
async fn resolve_and_enqueue_reports_positions_and_failures() {
    let h = harness();
    let requester = Requester::new(42, "dj#4242");

    let first = h
        .session
        .resolve_and_enqueue("first song", requester.clone())
        .await
        .expect("resolve");
    assert_eq!(first.position, 1);
    assert_eq!(first.track.requester, requester);

    let second = h
        .session
        .resolve_and_enqueue("first song", requester.clone())
        .await
        .expect("duplicates allowed");
    assert_eq!(second.position, 2);

    assert_eq!(
        h.session.resolve_and_enqueue("missing", requester.clone()).await,
        Err(SessionError::NotFound("missing".into()))
    );
    assert!(matches!(
        h.session.resolve_and_enqueue("broken", requester).await,
        Err(SessionError::Resolution(_))
    ));
    assert_eq!(h.session.snapshot().await.queue.len(), 2);
}

#[tokio::test]
async fn connection_failure_leaves_session_without_a_handle() {
    let h = harness();
    h.output.fail_connect(true);
    h.session.enqueue(track("a")).await.expect("enqueue");

    assert!(matches!(
        h.session.ensure_playing().await,
        Err(SessionError::Connection(_))
    ));
    let snap = h.session.snapshot().await;
    assert_eq!(snap.status, PlayerStatus::Idle);
    assert!(!snap.idle_disconnect_pending);

    h.output.fail_connect(false);
    assert_eq!(h.session.ensure_playing().await, Ok(true));
    expect_start(&h, "a").await;
    assert_eq!(h.output.connects(), 2);
}

#[tokio::test(start_paused = true)]
async fn concurrent_ensure_playing_is_rejected() {
    let h = harness();
    h.output.delay_connect(Duration::from_secs(1));
    h.session.enqueue(track("a")).await.expect("enqueue");

    let session = h.session.clone();
    let first = tokio::spawn(async move { session.ensure_playing().await });
    while h.session.snapshot().await.status != PlayerStatus::Connecting {
        tokio::task::yield_now().await;
    }

    assert_eq!(
        h.session.ensure_playing().await,
        Err(SessionError::AlreadyStarting)
    );
    assert_eq!(first.await.expect("join"), Ok(true));
    assert_eq!(h.output.connects(), 1);
    assert_eq!(h.output.started(), ["mock://a"]);
}

#[tokio::test(start_paused = true)]
async fn stop_while_connecting_releases_the_new_handle() {
    let h = harness();
    h.output.delay_connect(Duration::from_secs(1));
    h.session.enqueue(track("a")).await.expect("enqueue");

    let session = h.session.clone();
    let first = tokio::spawn(async move { session.ensure_playing().await });
    while h.session.snapshot().await.status != PlayerStatus::Connecting {
        tokio::task::yield_now().await;
    }

    assert!(h.session.stop().await);
    assert_eq!(first.await.expect("join"), Err(SessionError::Terminated));
    assert_eq!(h.output.releases(), 1);
    assert!(h.output.started().is_empty());
}

#[tokio::test(start_paused = true)]
async fn idle_teardown_releases_the_handle() {
    let h = harness();
    play(&h, &["a"]).await;
    h.output.finish();
    expect_end(&h, "a", TrackEndReason::Finished).await;
    expect_queue_end(&h).await;

    match next_event_within(&h.events, IDLE * 2).await {
        SessionEvent::Disconnected { reason, .. } => assert_eq!(reason, DisconnectReason::Idle),
        other => panic!("expected Disconnected, got {:?}", other),
    }
    assert_eq!(h.output.releases(), 1);
    assert!(h.session.is_terminated());

    let snap = h.session.snapshot().await;
    assert_eq!(snap.status, PlayerStatus::Stopped);
    assert!(!snap.idle_disconnect_pending);
}

#[tokio::test(start_paused = true)]
async fn resuming_within_the_window_cancels_teardown() {
    let h = harness();
    play(&h, &["a"]).await;
    h.output.finish();
    expect_end(&h, "a", TrackEndReason::Finished).await;
    expect_queue_end(&h).await;

    tokio::time::sleep(IDLE - Duration::from_secs(1)).await;
    h.session.enqueue(track("b")).await.expect("enqueue");
    assert!(!h.session.snapshot().await.idle_disconnect_pending);
    assert_eq!(h.session.ensure_playing().await, Ok(true));
    expect_start(&h, "b").await;

    tokio::time::sleep(IDLE * 3).await;
    assert_eq!(h.output.releases(), 0);
    assert_eq!(h.output.connects(), 1);
    assert!(h.session.snapshot().await.playing);
    assert!(!h.session.is_terminated());
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_pending_teardown() {
    let h = harness();
    play(&h, &["a"]).await;
    h.output.finish();
    expect_end(&h, "a", TrackEndReason::Finished).await;
    expect_queue_end(&h).await;

    assert!(h.session.stop().await);
    tokio::time::sleep(IDLE * 2).await;

    assert_eq!(h.output.releases(), 1);
    let disconnects = h
        .events
        .try_iter()
        .filter(|e| matches!(e, SessionEvent::Disconnected { .. }))
        .count();
    assert_eq!(disconnects, 1);
}
