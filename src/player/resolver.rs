use serde::Deserialize;
use serenity::async_trait;
use tokio::process::Command;
use tracing::info;
use url::Url;

use super::error::{PlayerError, PlayerResult};
use super::track::Track;

/// Turns a user query or URL into a playable [`Track`].
///
/// This is the external source-resolution collaborator: failures here are
/// reported to the user and leave queue state untouched.
#[async_trait]
pub trait SourceResolver: Send + Sync {
    async fn resolve(&self, query: &str, requested_by: &str) -> PlayerResult<Track>;
}

/// Resolves queries through the `yt-dlp` command-line tool. Plain text is
/// searched on YouTube; URLs are taken as-is.
#[derive(Default)]
pub struct YtDlpResolver;

impl YtDlpResolver {
    pub fn new() -> Self {
        Self
    }

    fn is_url(query: &str) -> bool {
        Url::parse(query)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false)
    }
}

/// The subset of yt-dlp's `-j` output we care about.
#[derive(Debug, Deserialize)]
struct YtDlpEntry {
    title: String,
    webpage_url: Option<String>,
}

#[async_trait]
impl SourceResolver for YtDlpResolver {
    async fn resolve(&self, query: &str, requested_by: &str) -> PlayerResult<Track> {
        let target = if Self::is_url(query) {
            query.to_string()
        } else {
            format!("ytsearch:{}", query)
        };
        info!(%target, "resolving source with yt-dlp");

        let output = Command::new("yt-dlp")
            .args(["-j", "--no-playlist", &target])
            .output()
            .await
            .map_err(|err| {
                PlayerError::ResolutionFailure(format!("failed to run yt-dlp: {}", err))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PlayerError::ResolutionFailure(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let entry: YtDlpEntry = serde_json::from_slice(&output.stdout).map_err(|err| {
            PlayerError::ResolutionFailure(format!("unexpected yt-dlp output: {}", err))
        })?;

        let source_url = entry
            .webpage_url
            .unwrap_or_else(|| query.to_string());

        Ok(Track::new(entry.title, source_url, requested_by))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_recognized() {
        assert!(YtDlpResolver::is_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(YtDlpResolver::is_url(
            "http://www.youtube.com/watch?v=dQw4w9WgXcQ"
        ));
    }

    #[test]
    fn plain_queries_are_not_urls() {
        assert!(!YtDlpResolver::is_url("never gonna give you up"));
        assert!(!YtDlpResolver::is_url("ftp://example.com/song.mp3"));
    }
}
