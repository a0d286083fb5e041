use std::sync::Arc;

use dashmap::DashMap;
use serenity::model::id::{ChannelId, GuildId};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use super::error::{PlayerError, PlayerResult};
use super::session::{Advance, AdvanceReason, GuildSession, QueueSnapshot};
use super::track::{PlaybackStatus, RepeatMode, Track};
use super::transport::{AudioTransport, PlaybackOutcome};

/// Result of an enqueue operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enqueued {
    /// 1-based position of the track in the queue.
    pub position: usize,
    /// Whether playback started with this track.
    pub started: bool,
}

/// Owns all guild sessions and drives the audio transport from them.
///
/// Sessions live behind per-guild async mutexes, so two commands for the
/// same guild never interleave their queue mutations while different
/// guilds proceed independently. The transport is an injected collaborator
/// so the whole thing runs against a fake in tests.
pub struct PlayerController {
    transport: Arc<dyn AudioTransport>,
    sessions: DashMap<GuildId, Arc<Mutex<GuildSession>>>,
    // Playback epochs outlive sessions: a `stop` bumps the epoch, which
    // invalidates any `play` resolution that was in flight when it ran.
    epochs: DashMap<GuildId, u64>,
}

impl PlayerController {
    pub fn new(transport: Arc<dyn AudioTransport>) -> Self {
        Self {
            transport,
            sessions: DashMap::new(),
            epochs: DashMap::new(),
        }
    }

    /// Current playback epoch for a guild. `play` captures this before it
    /// hands the query to the resolver and passes it back to
    /// [`enqueue_resolved`](Self::enqueue_resolved).
    pub fn playback_epoch(&self, guild_id: GuildId) -> u64 {
        *self.epochs.entry(guild_id).or_insert(0)
    }

    /// Join (or move to) a voice channel for this guild.
    pub async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> PlayerResult<()> {
        self.transport.connect(guild_id, channel_id).await
    }

    /// Enqueue a resolved track, unless a `stop` superseded the resolution
    /// that produced it. Returns `None` when the result was suppressed.
    pub async fn enqueue_resolved(
        &self,
        guild_id: GuildId,
        epoch: u64,
        track: Track,
    ) -> PlayerResult<Option<Enqueued>> {
        let (session, mut guard) = self.lock_session_entry(guild_id).await;

        // Re-check under the session lock: a concurrent stop bumps the
        // epoch before it tears the session down.
        if self.playback_epoch(guild_id) != epoch {
            debug!(%guild_id, "dropping stale resolution result");
            if guard.is_empty() {
                // Clean up the entry this call created, and only that
                // one; a concurrent enqueue may have replaced it.
                self.sessions
                    .remove_if(&guild_id, |_, existing| Arc::ptr_eq(existing, &session));
            }
            return Ok(None);
        }

        let (position, started) = guard.enqueue(track.clone());
        info!(%guild_id, title = %track.title, position, "track enqueued");

        if started {
            self.start_current(guild_id, &mut guard).await?;
        }

        Ok(Some(Enqueued { position, started }))
    }

    /// Skip the current track. Returns the track now playing, or `None`
    /// when the skip exhausted the queue.
    pub async fn skip(&self, guild_id: GuildId) -> PlayerResult<Option<Track>> {
        let session = self
            .sessions
            .get(&guild_id)
            .map(|entry| Arc::clone(&entry))
            .ok_or(PlayerError::NoActiveTrack)?;
        let mut session = session.lock().await;

        match session.advance(AdvanceReason::Skip)? {
            Advance::Next(_) => {
                self.start_current(guild_id, &mut session).await?;
                Ok(session.current_track().cloned())
            }
            Advance::Finished => {
                self.teardown(guild_id).await;
                Ok(None)
            }
        }
    }

    /// Stop playback, clear the queue, and release the session.
    ///
    /// Idempotent: stopping an idle guild is a no-op. Always bumps the
    /// playback epoch so in-flight resolutions cannot re-enqueue.
    pub async fn stop(&self, guild_id: GuildId) -> PlayerResult<()> {
        *self.epochs.entry(guild_id).or_insert(0) += 1;

        let Some((_, session)) = self.sessions.remove(&guild_id) else {
            return Ok(());
        };
        // Wait out any in-flight mutation before silencing the transport.
        let _session = session.lock().await;

        info!(%guild_id, "stopping playback and releasing session");
        if let Err(err) = self.transport.stop(guild_id).await {
            warn!(%guild_id, %err, "failed to stop transport");
        }
        if let Err(err) = self.transport.disconnect(guild_id).await {
            warn!(%guild_id, %err, "failed to leave voice channel");
        }

        Ok(())
    }

    pub async fn pause(&self, guild_id: GuildId) -> PlayerResult<()> {
        let session = self.sessions.get(&guild_id).map(|entry| Arc::clone(&entry));
        let Some(session) = session else {
            return Err(PlayerError::InvalidState {
                status: PlaybackStatus::Idle,
            });
        };
        let mut session = session.lock().await;

        session.pause()?;
        if let Err(err) = self.transport.pause(guild_id).await {
            // Keep session state in step with what is actually audible.
            session
                .resume()
                .expect("paused a moment ago under the same lock");
            return Err(err);
        }
        Ok(())
    }

    pub async fn resume(&self, guild_id: GuildId) -> PlayerResult<()> {
        let session = self.sessions.get(&guild_id).map(|entry| Arc::clone(&entry));
        let Some(session) = session else {
            return Err(PlayerError::InvalidState {
                status: PlaybackStatus::Idle,
            });
        };
        let mut session = session.lock().await;

        session.resume()?;
        if let Err(err) = self.transport.resume(guild_id).await {
            session
                .pause()
                .expect("resumed a moment ago under the same lock");
            return Err(err);
        }
        Ok(())
    }

    /// Set the repeat mode; takes effect on the next completion or skip.
    pub async fn set_repeat(&self, guild_id: GuildId, mode: RepeatMode) -> PlayerResult<()> {
        let session = self
            .sessions
            .get(&guild_id)
            .map(|entry| Arc::clone(&entry))
            .ok_or(PlayerError::NoQueue)?;
        let mut session = session.lock().await;

        session.set_repeat(mode);
        info!(%guild_id, %mode, "repeat mode set");
        Ok(())
    }

    /// Read-only snapshot of the guild's queue.
    pub async fn queue(&self, guild_id: GuildId) -> PlayerResult<QueueSnapshot> {
        let session = self
            .sessions
            .get(&guild_id)
            .map(|entry| Arc::clone(&entry))
            .ok_or(PlayerError::NoQueue)?;
        let session = session.lock().await;

        Ok(session.snapshot())
    }

    /// Called by the audio transport when a track finishes or fails.
    ///
    /// A non-fatal failure counts as a natural completion for repeat-mode
    /// purposes; a fatal one tears the session down. Reports whose
    /// `play_id` no longer matches the session are stale (the track was
    /// stopped by a skip or stop we issued ourselves) and are dropped.
    pub async fn notify_playback_end(
        &self,
        guild_id: GuildId,
        play_id: u64,
        outcome: PlaybackOutcome,
    ) {
        let Some(session) = self.sessions.get(&guild_id).map(|entry| Arc::clone(&entry)) else {
            debug!(%guild_id, play_id, "playback end for released session");
            return;
        };
        let mut session = session.lock().await;

        if session.play_id() != play_id {
            debug!(
                %guild_id,
                play_id,
                current = session.play_id(),
                "ignoring stale playback end"
            );
            return;
        }

        if let PlaybackOutcome::Failed { fatal: true } = outcome {
            warn!(%guild_id, "fatal transport failure, releasing session");
            self.teardown(guild_id).await;
            return;
        }
        if let PlaybackOutcome::Failed { fatal: false } = outcome {
            warn!(%guild_id, "transport failure, treating as track completion");
        }

        match session.advance(AdvanceReason::Completion) {
            Ok(Advance::Next(_)) => {
                if let Err(err) = self.start_current(guild_id, &mut session).await {
                    warn!(%guild_id, %err, "failed to continue playback");
                    self.teardown(guild_id).await;
                }
            }
            Ok(Advance::Finished) => {
                info!(%guild_id, "queue exhausted, releasing session");
                self.teardown(guild_id).await;
            }
            Err(err) => debug!(%guild_id, %err, "nothing to advance"),
        }
    }

    /// Start the transport on the session's current track, skipping over
    /// tracks the transport refuses to start. Gives up once every queued
    /// track has been tried, so a wrapping repeat mode cannot spin.
    async fn start_current(
        &self,
        guild_id: GuildId,
        session: &mut GuildSession,
    ) -> PlayerResult<()> {
        let mut attempts = session.len();

        loop {
            let track = session
                .current_track()
                .cloned()
                .ok_or(PlayerError::NoActiveTrack)?;
            let play_id = session.play_id();

            match self.transport.start(guild_id, &track, play_id).await {
                Ok(()) => {
                    info!(%guild_id, title = %track.title, play_id, "playback started");
                    return Ok(());
                }
                Err(err) if attempts > 1 => {
                    warn!(%guild_id, title = %track.title, %err, "track failed to start, skipping");
                    attempts -= 1;
                    match session.advance(AdvanceReason::Skip)? {
                        Advance::Next(_) => continue,
                        Advance::Finished => {
                            self.teardown(guild_id).await;
                            return Err(err);
                        }
                    }
                }
                Err(err) => {
                    self.teardown(guild_id).await;
                    return Err(err);
                }
            }
        }
    }

    /// Drop the session registry entry and silence the transport. Stays
    /// connected to the voice channel; only an explicit stop disconnects.
    async fn teardown(&self, guild_id: GuildId) {
        self.sessions.remove(&guild_id);
        if let Err(err) = self.transport.stop(guild_id).await {
            warn!(%guild_id, %err, "failed to stop transport");
        }
    }

    /// Get or create the session entry and lock it, retrying if the
    /// entry we locked was removed from the registry while we waited.
    /// Without the re-check, a waiter could mutate a session that a
    /// stale-resolution cleanup had already orphaned.
    async fn lock_session_entry(
        &self,
        guild_id: GuildId,
    ) -> (Arc<Mutex<GuildSession>>, OwnedMutexGuard<GuildSession>) {
        loop {
            let session = self.session_entry(guild_id);
            let guard = Arc::clone(&session).lock_owned().await;

            let still_registered = self
                .sessions
                .get(&guild_id)
                .map(|entry| Arc::ptr_eq(&entry, &session))
                .unwrap_or(false);
            if still_registered {
                return (session, guard);
            }
        }
    }

    fn session_entry(&self, guild_id: GuildId) -> Arc<Mutex<GuildSession>> {
        Arc::clone(
            &self
                .sessions
                .entry(guild_id)
                .or_insert_with(|| Arc::new(Mutex::new(GuildSession::new()))),
        )
    }
}
