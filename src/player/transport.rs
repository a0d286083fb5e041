use std::sync::{Arc, OnceLock, Weak};

use dashmap::DashMap;
use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use songbird::input::YoutubeDl;
use songbird::{Event, EventContext, EventHandler, Songbird, TrackEvent};
use tracing::{debug, warn};

use super::controller::PlayerController;
use super::error::{PlayerError, PlayerResult};
use super::track::Track;

/// How a started playback ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// The track played to its end.
    Completed,
    /// The transport gave up on the track. Non-fatal failures are treated
    /// like completions by the controller; fatal ones release the session.
    Failed { fatal: bool },
}

/// The audio side of playback: voice connection plus one active track per
/// guild. Production implementation is [`SongbirdTransport`]; tests drive
/// the controller with a fake.
#[async_trait]
pub trait AudioTransport: Send + Sync {
    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> PlayerResult<()>;

    async fn disconnect(&self, guild_id: GuildId) -> PlayerResult<()>;

    /// Begin streaming `track`. The transport must later report the end of
    /// this exact playback to the controller, tagged with `play_id`.
    async fn start(&self, guild_id: GuildId, track: &Track, play_id: u64) -> PlayerResult<()>;

    async fn pause(&self, guild_id: GuildId) -> PlayerResult<()>;

    async fn resume(&self, guild_id: GuildId) -> PlayerResult<()>;

    async fn stop(&self, guild_id: GuildId) -> PlayerResult<()>;
}

/// Voice playback through songbird, streaming with `yt-dlp` lazy inputs.
pub struct SongbirdTransport {
    songbird: Arc<Songbird>,
    http_client: reqwest::Client,
    handles: DashMap<GuildId, songbird::tracks::TrackHandle>,
    // Completion reports flow back into the controller; a weak reference
    // breaks the controller -> transport -> controller cycle.
    controller: OnceLock<Weak<PlayerController>>,
}

impl SongbirdTransport {
    pub fn new(songbird: Arc<Songbird>, http_client: reqwest::Client) -> Self {
        Self {
            songbird,
            http_client,
            handles: DashMap::new(),
            controller: OnceLock::new(),
        }
    }

    /// Wire up the controller that receives completion reports. Called
    /// once during startup, after the controller has been constructed.
    pub fn bind(&self, controller: &Arc<PlayerController>) {
        let _ = self.controller.set(Arc::downgrade(controller));
    }

    fn controller_ref(&self) -> Weak<PlayerController> {
        self.controller.get().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl AudioTransport for SongbirdTransport {
    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> PlayerResult<()> {
        self.songbird
            .join(guild_id, channel_id)
            .await
            .map(|_| ())
            .map_err(|err| PlayerError::JoinError(err.to_string()))
    }

    async fn disconnect(&self, guild_id: GuildId) -> PlayerResult<()> {
        if self.songbird.get(guild_id).is_none() {
            return Ok(());
        }
        self.songbird
            .remove(guild_id)
            .await
            .map_err(|err| PlayerError::JoinError(err.to_string()))
    }

    async fn start(&self, guild_id: GuildId, track: &Track, play_id: u64) -> PlayerResult<()> {
        let call = self
            .songbird
            .get(guild_id)
            .ok_or(PlayerError::NotConnected)?;

        let input = YoutubeDl::new(self.http_client.clone(), track.source_url.clone());

        let mut call = call.lock().await;
        // Replaces whatever was playing; the old track's end event carries
        // a stale play id and gets dropped by the controller.
        let handle = call.play_only_input(input.into());

        for (event, outcome) in [
            (TrackEvent::End, PlaybackOutcome::Completed),
            (TrackEvent::Error, PlaybackOutcome::Failed { fatal: false }),
        ] {
            handle
                .add_event(
                    Event::Track(event),
                    TrackEndNotifier {
                        controller: self.controller_ref(),
                        guild_id,
                        play_id,
                        outcome,
                    },
                )
                .map_err(|err| PlayerError::TransportError(err.to_string()))?;
        }

        self.handles.insert(guild_id, handle);
        Ok(())
    }

    async fn pause(&self, guild_id: GuildId) -> PlayerResult<()> {
        let handle = self.handles.get(&guild_id).ok_or(PlayerError::NotConnected)?;
        handle
            .pause()
            .map_err(|err| PlayerError::TransportError(err.to_string()))
    }

    async fn resume(&self, guild_id: GuildId) -> PlayerResult<()> {
        let handle = self.handles.get(&guild_id).ok_or(PlayerError::NotConnected)?;
        handle
            .play()
            .map_err(|err| PlayerError::TransportError(err.to_string()))
    }

    async fn stop(&self, guild_id: GuildId) -> PlayerResult<()> {
        if let Some((_, handle)) = self.handles.remove(&guild_id) {
            if let Err(err) = handle.stop() {
                debug!(%guild_id, %err, "track handle already finished");
            }
        }
        Ok(())
    }
}

/// Songbird track event handler that reports the end of one playback back
/// to the controller.
struct TrackEndNotifier {
    controller: Weak<PlayerController>,
    guild_id: GuildId,
    play_id: u64,
    outcome: PlaybackOutcome,
}

#[async_trait]
impl EventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(_) = ctx {
            match self.controller.upgrade() {
                Some(controller) => {
                    controller
                        .notify_playback_end(self.guild_id, self.play_id, self.outcome)
                        .await;
                }
                None => warn!(guild_id = %self.guild_id, "controller gone, dropping track event"),
            }
        }
        None
    }
}
