use super::{messages, require_guild};
use crate::{CommandResult, Context};

/// Pause the current track
#[poise::command(slash_command, category = "Music")]
pub async fn pause(ctx: Context<'_>) -> CommandResult {
    let guild_id = require_guild(&ctx)?;

    match ctx.data().player.pause(guild_id).await {
        Ok(()) => {
            ctx.send(messages::confirmation("⏸️ Paused the music."))
                .await?;
        }
        Err(err) => {
            ctx.send(messages::error(err.to_string())).await?;
        }
    }

    Ok(())
}
