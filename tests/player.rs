//! Controller-level tests: queue semantics, repeat-mode policy, stale
//! result suppression, and transport interaction, driven through a fake
//! audio transport.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serenity::model::id::{ChannelId, GuildId};

use vinyl::player::{
    AudioTransport, PlaybackOutcome, PlaybackStatus, PlayerController, PlayerError, RepeatMode,
    Track,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum TransportCall {
    Connect(GuildId, ChannelId),
    Disconnect(GuildId),
    Start {
        guild_id: GuildId,
        title: String,
        play_id: u64,
    },
    Pause(GuildId),
    Resume(GuildId),
    Stop(GuildId),
}

/// Records every call and can be told to refuse specific tracks or the
/// pause/resume controls.
#[derive(Default)]
struct FakeTransport {
    calls: Mutex<Vec<TransportCall>>,
    refuse: Mutex<HashSet<String>>,
    refuse_pause: AtomicBool,
    refuse_resume: AtomicBool,
}

impl FakeTransport {
    fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    fn refuse(&self, title: &str) {
        self.refuse.lock().unwrap().insert(title.to_string());
    }

    fn last_start(&self) -> Option<(String, u64)> {
        self.calls()
            .into_iter()
            .rev()
            .find_map(|call| match call {
                TransportCall::Start { title, play_id, .. } => Some((title, play_id)),
                _ => None,
            })
    }

    fn start_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, TransportCall::Start { .. }))
            .count()
    }
}

#[async_trait]
impl AudioTransport for FakeTransport {
    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), PlayerError> {
        self.calls
            .lock()
            .unwrap()
            .push(TransportCall::Connect(guild_id, channel_id));
        Ok(())
    }

    async fn disconnect(&self, guild_id: GuildId) -> Result<(), PlayerError> {
        self.calls
            .lock()
            .unwrap()
            .push(TransportCall::Disconnect(guild_id));
        Ok(())
    }

    async fn start(
        &self,
        guild_id: GuildId,
        track: &Track,
        play_id: u64,
    ) -> Result<(), PlayerError> {
        self.calls.lock().unwrap().push(TransportCall::Start {
            guild_id,
            title: track.title.clone(),
            play_id,
        });
        if self.refuse.lock().unwrap().contains(&track.title) {
            return Err(PlayerError::TransportError(format!(
                "refusing {}",
                track.title
            )));
        }
        Ok(())
    }

    async fn pause(&self, guild_id: GuildId) -> Result<(), PlayerError> {
        self.calls
            .lock()
            .unwrap()
            .push(TransportCall::Pause(guild_id));
        if self.refuse_pause.load(Ordering::SeqCst) {
            return Err(PlayerError::TransportError("refusing pause".into()));
        }
        Ok(())
    }

    async fn resume(&self, guild_id: GuildId) -> Result<(), PlayerError> {
        self.calls
            .lock()
            .unwrap()
            .push(TransportCall::Resume(guild_id));
        if self.refuse_resume.load(Ordering::SeqCst) {
            return Err(PlayerError::TransportError("refusing resume".into()));
        }
        Ok(())
    }

    async fn stop(&self, guild_id: GuildId) -> Result<(), PlayerError> {
        self.calls
            .lock()
            .unwrap()
            .push(TransportCall::Stop(guild_id));
        Ok(())
    }
}

fn setup() -> (Arc<FakeTransport>, PlayerController) {
    let transport = Arc::new(FakeTransport::default());
    let controller = PlayerController::new(transport.clone());
    (transport, controller)
}

fn guild() -> GuildId {
    GuildId::new(101)
}

fn track(title: &str) -> Track {
    Track::new(title, format!("https://example.com/{title}"), "tester")
}

async fn enqueue(controller: &PlayerController, guild_id: GuildId, title: &str) {
    let epoch = controller.playback_epoch(guild_id);
    controller
        .enqueue_resolved(guild_id, epoch, track(title))
        .await
        .expect("enqueue")
        .expect("not suppressed");
}

#[tokio::test]
async fn first_enqueue_starts_playback() {
    let (transport, controller) = setup();
    let epoch = controller.playback_epoch(guild());

    let enqueued = controller
        .enqueue_resolved(guild(), epoch, track("a"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!((enqueued.position, enqueued.started), (1, true));
    assert_eq!(transport.last_start().unwrap().0, "a");
}

#[tokio::test]
async fn later_enqueues_append_without_restarting() {
    let (transport, controller) = setup();
    enqueue(&controller, guild(), "a").await;

    let epoch = controller.playback_epoch(guild());
    let enqueued = controller
        .enqueue_resolved(guild(), epoch, track("b"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!((enqueued.position, enqueued.started), (2, false));
    assert_eq!(transport.start_count(), 1);

    let snapshot = controller.queue(guild()).await.unwrap();
    let titles: Vec<_> = snapshot.tracks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["a", "b"]);
    assert_eq!(snapshot.current, Some(0));
}

#[tokio::test]
async fn stop_releases_the_session() {
    let (transport, controller) = setup();
    enqueue(&controller, guild(), "a").await;

    controller.stop(guild()).await.unwrap();

    assert_matches!(controller.queue(guild()).await, Err(PlayerError::NoQueue));
    assert!(transport.calls().contains(&TransportCall::Stop(guild())));
    assert!(transport
        .calls()
        .contains(&TransportCall::Disconnect(guild())));
}

#[tokio::test]
async fn stop_is_idempotent() {
    let (transport, controller) = setup();

    controller.stop(guild()).await.unwrap();
    controller.stop(guild()).await.unwrap();

    // No session existed, so the transport was never touched.
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn stop_suppresses_in_flight_resolutions() {
    let (transport, controller) = setup();

    // Epoch captured before the "resolution", stop lands while it runs.
    let epoch = controller.playback_epoch(guild());
    controller.stop(guild()).await.unwrap();

    let outcome = controller
        .enqueue_resolved(guild(), epoch, track("late"))
        .await
        .unwrap();

    assert_eq!(outcome, None);
    assert_matches!(controller.queue(guild()).await, Err(PlayerError::NoQueue));
    assert_eq!(transport.start_count(), 0);
}

#[tokio::test]
async fn skip_walks_the_queue_then_releases() {
    let (_, controller) = setup();
    enqueue(&controller, guild(), "a").await;
    enqueue(&controller, guild(), "b").await;
    enqueue(&controller, guild(), "c").await;

    assert_eq!(controller.skip(guild()).await.unwrap().unwrap().title, "b");
    assert_eq!(controller.skip(guild()).await.unwrap().unwrap().title, "c");
    assert_eq!(controller.skip(guild()).await.unwrap(), None);

    assert_matches!(controller.queue(guild()).await, Err(PlayerError::NoQueue));
    assert_matches!(
        controller.skip(guild()).await,
        Err(PlayerError::NoActiveTrack)
    );
}

#[tokio::test]
async fn pause_and_resume_reach_the_transport() {
    let (transport, controller) = setup();
    enqueue(&controller, guild(), "a").await;

    controller.pause(guild()).await.unwrap();
    controller.resume(guild()).await.unwrap();

    let calls = transport.calls();
    assert!(calls.contains(&TransportCall::Pause(guild())));
    assert!(calls.contains(&TransportCall::Resume(guild())));

    let snapshot = controller.queue(guild()).await.unwrap();
    assert_eq!(snapshot.current, Some(0));
}

#[tokio::test]
async fn pause_without_a_session_is_invalid_state() {
    let (transport, controller) = setup();

    assert_matches!(
        controller.pause(guild()).await,
        Err(PlayerError::InvalidState { .. })
    );
    assert_matches!(
        controller.resume(guild()).await,
        Err(PlayerError::InvalidState { .. })
    );
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn double_pause_fails_without_touching_the_transport_twice() {
    let (transport, controller) = setup();
    enqueue(&controller, guild(), "a").await;

    controller.pause(guild()).await.unwrap();
    assert_matches!(
        controller.pause(guild()).await,
        Err(PlayerError::InvalidState { .. })
    );

    let pauses = transport
        .calls()
        .iter()
        .filter(|call| matches!(call, TransportCall::Pause(_)))
        .count();
    assert_eq!(pauses, 1);
}

#[tokio::test]
async fn song_repeat_replays_on_completion() {
    let (transport, controller) = setup();
    enqueue(&controller, guild(), "a").await;
    controller
        .set_repeat(guild(), RepeatMode::Song)
        .await
        .unwrap();

    let (_, play_id) = transport.last_start().unwrap();
    controller
        .notify_playback_end(guild(), play_id, PlaybackOutcome::Completed)
        .await;

    let (title, second_play_id) = transport.last_start().unwrap();
    assert_eq!(title, "a");
    assert!(second_play_id > play_id);

    controller
        .notify_playback_end(guild(), second_play_id, PlaybackOutcome::Completed)
        .await;
    assert_eq!(transport.last_start().unwrap().0, "a");

    let snapshot = controller.queue(guild()).await.unwrap();
    assert_eq!(snapshot.current, Some(0));
}

#[tokio::test]
async fn queue_repeat_wraps_at_the_end() {
    let (_, controller) = setup();
    enqueue(&controller, guild(), "a").await;
    enqueue(&controller, guild(), "b").await;
    controller
        .set_repeat(guild(), RepeatMode::Queue)
        .await
        .unwrap();

    assert_eq!(controller.skip(guild()).await.unwrap().unwrap().title, "b");
    // Last index wraps back to the first track instead of going idle.
    assert_eq!(controller.skip(guild()).await.unwrap().unwrap().title, "a");

    let snapshot = controller.queue(guild()).await.unwrap();
    assert_eq!(snapshot.current, Some(0));
    assert_eq!(snapshot.tracks.len(), 2);
}

#[tokio::test]
async fn off_mode_completion_advances_then_releases() {
    let (transport, controller) = setup();
    enqueue(&controller, guild(), "a").await;
    enqueue(&controller, guild(), "b").await;

    let (_, play_id) = transport.last_start().unwrap();
    controller
        .notify_playback_end(guild(), play_id, PlaybackOutcome::Completed)
        .await;
    assert_eq!(transport.last_start().unwrap().0, "b");

    let (_, play_id) = transport.last_start().unwrap();
    controller
        .notify_playback_end(guild(), play_id, PlaybackOutcome::Completed)
        .await;

    assert_matches!(controller.queue(guild()).await, Err(PlayerError::NoQueue));
}

#[tokio::test]
async fn stale_playback_end_reports_are_ignored() {
    let (transport, controller) = setup();
    enqueue(&controller, guild(), "a").await;
    enqueue(&controller, guild(), "b").await;

    let (_, old_play_id) = transport.last_start().unwrap();
    controller.skip(guild()).await.unwrap();

    // The skip stopped track "a"; its end event still arrives.
    controller
        .notify_playback_end(guild(), old_play_id, PlaybackOutcome::Completed)
        .await;

    let snapshot = controller.queue(guild()).await.unwrap();
    assert_eq!(snapshot.current, Some(1));
    assert_eq!(transport.last_start().unwrap().0, "b");
}

#[tokio::test]
async fn nonfatal_transport_failure_counts_as_completion() {
    let (transport, controller) = setup();
    enqueue(&controller, guild(), "a").await;
    enqueue(&controller, guild(), "b").await;

    let (_, play_id) = transport.last_start().unwrap();
    controller
        .notify_playback_end(guild(), play_id, PlaybackOutcome::Failed { fatal: false })
        .await;

    assert_eq!(transport.last_start().unwrap().0, "b");
}

#[tokio::test]
async fn fatal_transport_failure_releases_the_session() {
    let (transport, controller) = setup();
    enqueue(&controller, guild(), "a").await;
    enqueue(&controller, guild(), "b").await;

    let (_, play_id) = transport.last_start().unwrap();
    controller
        .notify_playback_end(guild(), play_id, PlaybackOutcome::Failed { fatal: true })
        .await;

    assert_matches!(controller.queue(guild()).await, Err(PlayerError::NoQueue));
    assert!(transport.calls().contains(&TransportCall::Stop(guild())));
}

#[tokio::test]
async fn unplayable_tracks_are_skipped_over() {
    let (transport, controller) = setup();
    transport.refuse("b");
    enqueue(&controller, guild(), "a").await;
    enqueue(&controller, guild(), "b").await;
    enqueue(&controller, guild(), "c").await;

    let now_playing = controller.skip(guild()).await.unwrap().unwrap();

    assert_eq!(now_playing.title, "c");
    let titles: Vec<_> = transport
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            TransportCall::Start { title, .. } => Some(title),
            _ => None,
        })
        .collect();
    assert_eq!(titles, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn guilds_are_isolated() {
    let (_, controller) = setup();
    let other = GuildId::new(202);

    enqueue(&controller, guild(), "a").await;
    enqueue(&controller, other, "x").await;

    controller.stop(guild()).await.unwrap();

    assert_matches!(controller.queue(guild()).await, Err(PlayerError::NoQueue));
    let snapshot = controller.queue(other).await.unwrap();
    assert_eq!(snapshot.tracks[0].title, "x");
}

#[tokio::test]
async fn failed_pause_leaves_the_session_playing() {
    let (transport, controller) = setup();
    enqueue(&controller, guild(), "a").await;
    transport.refuse_pause.store(true, Ordering::SeqCst);

    assert_matches!(
        controller.pause(guild()).await,
        Err(PlayerError::TransportError(_))
    );

    // Session state still matches what the transport is doing.
    let snapshot = controller.queue(guild()).await.unwrap();
    assert_eq!(snapshot.status, PlaybackStatus::Playing);
    assert_matches!(
        controller.resume(guild()).await,
        Err(PlayerError::InvalidState {
            status: PlaybackStatus::Playing
        })
    );
}

#[tokio::test]
async fn failed_resume_leaves_the_session_paused() {
    let (transport, controller) = setup();
    enqueue(&controller, guild(), "a").await;
    controller.pause(guild()).await.unwrap();
    transport.refuse_resume.store(true, Ordering::SeqCst);

    assert_matches!(
        controller.resume(guild()).await,
        Err(PlayerError::TransportError(_))
    );

    let snapshot = controller.queue(guild()).await.unwrap();
    assert_eq!(snapshot.status, PlaybackStatus::Paused);

    // Still resumable once the transport recovers.
    transport.refuse_resume.store(false, Ordering::SeqCst);
    controller.resume(guild()).await.unwrap();
    let snapshot = controller.queue(guild()).await.unwrap();
    assert_eq!(snapshot.status, PlaybackStatus::Playing);
}

#[tokio::test]
async fn stale_suppression_never_orphans_a_concurrent_enqueue() {
    let (transport, controller) = setup();
    let controller = Arc::new(controller);

    let stale_epoch = controller.playback_epoch(guild());
    controller.stop(guild()).await.unwrap();
    let epoch = controller.playback_epoch(guild());

    // A late resolution and a fresh play race on the same guild.
    let stale = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            controller
                .enqueue_resolved(guild(), stale_epoch, track("late"))
                .await
        })
    };
    let fresh = {
        let controller = Arc::clone(&controller);
        tokio::spawn(
            async move { controller.enqueue_resolved(guild(), epoch, track("a")).await },
        )
    };

    assert_eq!(stale.await.unwrap().unwrap(), None);
    let enqueued = fresh.await.unwrap().unwrap().unwrap();
    assert!(enqueued.started);

    // Whatever the interleaving, the fresh session must be the one the
    // registry serves.
    let snapshot = controller.queue(guild()).await.unwrap();
    let titles: Vec<_> = snapshot.tracks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["a"]);
    assert_eq!(snapshot.current, Some(0));
    assert_eq!(transport.last_start().unwrap().0, "a");
}

#[tokio::test]
async fn set_repeat_without_a_session_fails() {
    let (_, controller) = setup();

    assert_matches!(
        controller.set_repeat(guild(), RepeatMode::Queue).await,
        Err(PlayerError::NoQueue)
    );
}
