use super::{messages, require_guild};
use crate::{CommandResult, Context};

/// Stop the music, clear the queue, and leave the voice channel
#[poise::command(slash_command, category = "Music")]
pub async fn stop(ctx: Context<'_>) -> CommandResult {
    let guild_id = require_guild(&ctx)?;

    match ctx.data().player.stop(guild_id).await {
        Ok(()) => {
            ctx.send(messages::confirmation(
                "🛑 Stopped playback and cleared the queue.",
            ))
            .await?;
        }
        Err(err) => {
            ctx.send(messages::error(err.to_string())).await?;
        }
    }

    Ok(())
}
