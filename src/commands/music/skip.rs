use super::{messages, require_guild};
use crate::{CommandResult, Context};

/// Skip the currently playing song
#[poise::command(slash_command, category = "Music")]
pub async fn skip(ctx: Context<'_>) -> CommandResult {
    let guild_id = require_guild(&ctx)?;

    match ctx.data().player.skip(guild_id).await {
        Ok(Some(track)) => {
            ctx.send(messages::confirmation(format!(
                "⏭️ Skipped. Now playing **{}**.",
                track.title
            )))
            .await?;
        }
        Ok(None) => {
            ctx.send(messages::confirmation(
                "⏭️ Skipped the last track; the queue is finished.",
            ))
            .await?;
        }
        Err(err) => {
            ctx.send(messages::error(err.to_string())).await?;
        }
    }

    Ok(())
}
