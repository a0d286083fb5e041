use tracing::info;

use super::{messages, require_guild, user_voice_channel};
use crate::{CommandResult, Context};

/// Play a song from YouTube or a direct URL
#[poise::command(slash_command, category = "Music")]
pub async fn play(
    ctx: Context<'_>,
    #[description = "URL or search query"] query: String,
) -> CommandResult {
    info!("Received play command with query: {}", query);
    let guild_id = require_guild(&ctx)?;

    if query.trim().is_empty() {
        ctx.send(messages::error("Please provide a song name or URL."))
            .await?;
        return Ok(());
    }

    let channel_id = match user_voice_channel(ctx.serenity_context(), guild_id, ctx.author().id) {
        Ok(channel_id) => channel_id,
        Err(err) => {
            ctx.send(messages::error(err.to_string())).await?;
            return Ok(());
        }
    };

    // Resolution can take a while; keep the interaction alive.
    ctx.defer().await?;

    let player = &ctx.data().player;
    if let Err(err) = player.connect(guild_id, channel_id).await {
        ctx.send(messages::error(err.to_string())).await?;
        return Ok(());
    }

    // Capture the epoch before resolving so a /stop issued while yt-dlp
    // is running suppresses this result.
    let epoch = player.playback_epoch(guild_id);

    let track = match ctx
        .data()
        .resolver
        .resolve(&query, &ctx.author().name)
        .await
    {
        Ok(track) => track,
        Err(err) => {
            ctx.send(messages::error(err.to_string())).await?;
            return Ok(());
        }
    };

    match player.enqueue_resolved(guild_id, epoch, track.clone()).await {
        Ok(Some(enqueued)) if enqueued.started => {
            ctx.send(messages::now_playing(&track)).await?;
        }
        Ok(Some(enqueued)) => {
            ctx.send(messages::added_to_queue(&track, enqueued.position))
                .await?;
        }
        Ok(None) => {
            ctx.send(messages::confirmation(
                "Playback was stopped before this track resolved; it was not queued.",
            ))
            .await?;
        }
        Err(err) => {
            ctx.send(messages::error(err.to_string())).await?;
        }
    }

    Ok(())
}
