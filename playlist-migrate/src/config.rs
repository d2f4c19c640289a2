//! Compiled-in settings for a migration run.
//!
//! There are no runtime flags. Change the values in [`MigrationConfig::default`] and rebuild.

use std::path::PathBuf;
use std::time::Duration;

/// Playlist whose videos get republished.
pub const PLAYLIST_ID: &str = "PLbpC3u41peksrSXFqMpTexRIQcS_syzsL";

/// Science & Technology.
pub const CATEGORY_ID: &str = "28";

pub const DOWNLOAD_DIR: &str = "download_dir";
pub const LEDGER_PATH: &str = "uploaded_videos.txt";
pub const CLIENT_SECRETS_FILE: &str = "credentials.json";

/// One caption file to attach to every republished video.
///
/// The three fields are independent. Nothing checks that `language` matches the contents of
/// `path` or the wording of `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleSpec {
    pub path: PathBuf,
    /// BCP-47 language code, e.g. `en`.
    pub language: String,
    /// Track name shown to viewers.
    pub name: String,
}

impl SubtitleSpec {
    pub fn new(
        path: impl Into<PathBuf>,
        language: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            language: language.into(),
            name: name.into(),
        }
    }
}

/// How hard to try to get a video onto local disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Constant pause between attempts.
    pub delay: Duration,
    /// Upper bound on a single attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(10),
            attempt_timeout: Duration::from_secs(30 * 60),
        }
    }
}

/// Where one authorized API handle gets its OAuth client and caches its token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountConfig {
    /// Google client-secret JSON downloaded from the Cloud console.
    pub client_secrets: PathBuf,
    /// Token cache, rewritten after every run.
    pub token_cache: PathBuf,
}

#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub playlist_id: String,
    pub download_dir: PathBuf,
    pub ledger_path: PathBuf,
    pub category_id: String,
    pub subtitles: Vec<SubtitleSpec>,
    /// Reads the source playlist.
    pub source: AccountConfig,
    /// Receives the uploads.
    pub target: AccountConfig,
    pub retry: RetryPolicy,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            playlist_id: PLAYLIST_ID.to_string(),
            download_dir: PathBuf::from(DOWNLOAD_DIR),
            ledger_path: PathBuf::from(LEDGER_PATH),
            category_id: CATEGORY_ID.to_string(),
            subtitles: vec![
                SubtitleSpec::new("path_to_english_subtitle.srt", "en", "English Subtitles"),
                SubtitleSpec::new("path_to_japanese_subtitle.srt", "ja", "Japanese Subtitles"),
            ],
            source: AccountConfig {
                client_secrets: PathBuf::from(CLIENT_SECRETS_FILE),
                token_cache: PathBuf::from("source-token.json"),
            },
            target: AccountConfig {
                client_secrets: PathBuf::from(CLIENT_SECRETS_FILE),
                token_cache: PathBuf::from("target-token.json"),
            },
            retry: RetryPolicy::default(),
        }
    }
}

impl MigrationConfig {
    /// Local file a given source video is downloaded to.
    pub fn video_path(&self, video_id: &str) -> PathBuf {
        self.download_dir.join(format!("{video_id}.mp4"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn video_path_is_id_dot_mp4_in_download_dir() {
        let config = MigrationConfig {
            download_dir: PathBuf::from("/tmp/videos"),
            ..Default::default()
        };
        assert_eq!(
            config.video_path("xyz"),
            PathBuf::from("/tmp/videos/xyz.mp4")
        );
    }

    #[test]
    fn default_retry_policy() {
        let retry = RetryPolicy::default();
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.delay, Duration::from_secs(10));
    }
}
