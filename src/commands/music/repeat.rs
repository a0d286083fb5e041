use super::{messages, require_guild};
use crate::player::RepeatMode;
use crate::{CommandResult, Context};

/// Set the loop mode
#[poise::command(slash_command, rename = "loop", category = "Music")]
pub async fn repeat(
    ctx: Context<'_>,
    #[description = "0 = Off, 1 = Song, 2 = Queue"]
    #[min = 0]
    #[max = 2]
    mode: i64,
) -> CommandResult {
    let guild_id = require_guild(&ctx)?;

    let mode = match RepeatMode::from_command_value(mode) {
        Ok(mode) => mode,
        Err(err) => {
            ctx.send(messages::error(err.to_string())).await?;
            return Ok(());
        }
    };

    match ctx.data().player.set_repeat(guild_id, mode).await {
        Ok(()) => {
            ctx.send(messages::confirmation(format!(
                "🔁 Set loop mode to {}.",
                mode
            )))
            .await?;
        }
        Err(err) => {
            ctx.send(messages::error(err.to_string())).await?;
        }
    }

    Ok(())
}
