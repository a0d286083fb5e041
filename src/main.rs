use std::env;
use std::sync::Arc;

use ::serenity::all::ClientBuilder;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use songbird::SerenityInit;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use vinyl::commands::music::{
    pause::*, play::*, queue::*, repeat::*, resume::*, skip::*, stop::*,
};
use vinyl::player::controller::PlayerController;
use vinyl::player::resolver::YtDlpResolver;
use vinyl::player::transport::SongbirdTransport;
use vinyl::{CommandResult, Context, Data, Error};

#[poise::command(slash_command, category = "General")]
async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration::default(),
    )
    .await
    .map_err(|e| e.into())
}

#[poise::command(prefix_command, hide_in_help)]
async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx)
        .await
        .map_err(|e| e.into())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vinyl=debug,warn")),
        )
        .with_target(true)
        .init();

    dotenv().ok();

    let token = env::var("DISCORD_TOKEN").expect("Missing DISCORD_TOKEN");

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let commands = vec![
        register(),
        help(),
        play(),
        stop(),
        skip(),
        pause(),
        resume(),
        queue(),
        repeat(),
    ];

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Connected as {}", ready.user.name);

                let songbird = songbird::get(ctx)
                    .await
                    .expect("Songbird registered at client init");

                // Explicit wiring: the transport streams audio, the
                // controller owns queue state, and the transport reports
                // track completion back into the controller.
                let transport = Arc::new(SongbirdTransport::new(songbird, reqwest::Client::new()));
                let player = Arc::new(PlayerController::new(transport.clone()));
                transport.bind(&player);

                Ok(Data {
                    player,
                    resolver: Arc::new(YtDlpResolver::new()),
                })
            })
        });

    let mut client = ClientBuilder::new(token, intents)
        .framework(framework.build())
        .register_songbird()
        .await?;

    client.start().await.map_err(Into::into)
}
