use std::sync::Arc;

pub mod commands;
pub mod player;

use player::{controller::PlayerController, resolver::SourceResolver};

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// User data available to every command invocation.
///
/// Built once in `main` and handed to poise; commands reach the player
/// controller and the source resolver through here instead of through
/// process-wide statics.
pub struct Data {
    pub player: Arc<PlayerController>,
    pub resolver: Arc<dyn SourceResolver>,
}
