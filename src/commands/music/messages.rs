use poise::{serenity_prelude as serenity, CreateReply};
use serenity::all::CreateEmbed;

use crate::player::{QueueSnapshot, RepeatMode, Track};

/// Create an ephemeral error reply from a user-facing message.
pub fn error(description: impl Into<String>) -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("❌ Error")
                .description(description.into())
                .color(0xff0000),
        )
        .ephemeral(true)
}

/// Plain confirmation line.
pub fn confirmation(content: impl Into<String>) -> CreateReply {
    CreateReply::default().content(content.into())
}

/// Create an embed for when a track starts playing immediately.
pub fn now_playing(track: &Track) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("🎵 Now Playing")
            .description(format!("[{}]({})", track.title, track.source_url))
            .field("Requested by", track.requested_by.clone(), true)
            .color(0x00ff00),
    )
}

/// Create an embed for when a track is appended behind others.
pub fn added_to_queue(track: &Track, position: usize) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("🎵 Added to Queue")
            .description(format!("[{}]({})", track.title, track.source_url))
            .field("Position", format!("`#{}`", position), true)
            .field("Requested by", track.requested_by.clone(), true)
            .color(0x00ff00),
    )
}

/// Create the positional queue listing embed.
pub fn queue_listing(snapshot: &QueueSnapshot) -> CreateReply {
    let listing = snapshot
        .tracks
        .iter()
        .enumerate()
        .map(|(index, track)| {
            let marker = if snapshot.current == Some(index) {
                " ▶"
            } else {
                ""
            };
            format!("{}. {}{}", index + 1, track.title, marker)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut embed = CreateEmbed::new()
        .title("🎵 Current Queue")
        .description(listing)
        .color(0x0099ff);

    if snapshot.repeat != RepeatMode::Off {
        embed = embed.field("Loop", snapshot.repeat.to_string(), true);
    }

    CreateReply::default().embed(embed)
}
