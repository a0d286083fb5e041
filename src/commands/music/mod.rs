//! The command surface: one slash command per file, each translating an
//! interaction into exactly one player-controller operation. Every
//! `PlayerError` is converted to a user-facing reply here; nothing
//! propagates past this boundary as a process failure.

pub mod pause;
pub mod play;
pub mod queue;
pub mod repeat;
pub mod resume;
pub mod skip;
pub mod stop;

mod messages;

use poise::serenity_prelude as serenity;
use serenity::model::id::{ChannelId, GuildId, UserId};

use crate::player::PlayerError;
use crate::{Context, Error};

/// Guild id of the interaction, or [`PlayerError::NotInGuild`].
fn require_guild(ctx: &Context<'_>) -> Result<GuildId, Error> {
    ctx.guild_id()
        .ok_or_else(|| Box::new(PlayerError::NotInGuild) as Error)
}

/// Voice channel the given user is currently in.
fn user_voice_channel(
    ctx: &serenity::Context,
    guild_id: GuildId,
    user_id: UserId,
) -> Result<ChannelId, PlayerError> {
    let guild = ctx.cache.guild(guild_id).ok_or(PlayerError::NotInGuild)?;

    guild
        .voice_states
        .get(&user_id)
        .and_then(|state| state.channel_id)
        .ok_or(PlayerError::UserNotInVoiceChannel)
}
