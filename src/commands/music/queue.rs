use super::{messages, require_guild};
use crate::player::PlayerError;
use crate::{CommandResult, Context};

/// View the current music queue
#[poise::command(slash_command, category = "Music")]
pub async fn queue(ctx: Context<'_>) -> CommandResult {
    let guild_id = require_guild(&ctx)?;

    match ctx.data().player.queue(guild_id).await {
        Ok(snapshot) => {
            ctx.send(messages::queue_listing(&snapshot)).await?;
        }
        Err(PlayerError::NoQueue) => {
            ctx.send(messages::confirmation("There is no queue.")).await?;
        }
        Err(err) => {
            ctx.send(messages::error(err.to_string())).await?;
        }
    }

    Ok(())
}
