use super::{messages, require_guild};
use crate::{CommandResult, Context};

/// Resume the paused track
#[poise::command(slash_command, category = "Music")]
pub async fn resume(ctx: Context<'_>) -> CommandResult {
    let guild_id = require_guild(&ctx)?;

    match ctx.data().player.resume(guild_id).await {
        Ok(()) => {
            ctx.send(messages::confirmation("▶️ Resumed the music."))
                .await?;
        }
        Err(err) => {
            ctx.send(messages::error(err.to_string())).await?;
        }
    }

    Ok(())
}
