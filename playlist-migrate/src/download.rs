//! Getting source videos onto local disk.
//!
//! [`MediaDownloader`] performs exactly one attempt. [`download_with_retry`] wraps it in a
//! bounded loop with a constant delay that only retries [transient](MediaError::is_transient)
//! failures.

use crate::config::RetryPolicy;
use crate::error::MediaError;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

/// Materializes a video file from its URL, once.
pub trait MediaDownloader {
    fn download(
        &self,
        video_url: &str,
        output_path: &Path,
    ) -> impl Future<Output = Result<(), MediaError>>;
}

/// One video to fetch, and how persistently to try.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub video_url: String,
    pub output_path: PathBuf,
    pub max_attempts: u32,
    pub delay: Duration,
}

impl DownloadTask {
    pub fn new(
        video_url: impl Into<String>,
        output_path: impl Into<PathBuf>,
        retry: &RetryPolicy,
    ) -> Self {
        Self {
            video_url: video_url.into(),
            output_path: output_path.into(),
            max_attempts: retry.max_attempts,
            delay: retry.delay,
        }
    }
}

/// Runs `downloader` until it succeeds, fails permanently, or runs out of attempts.
///
/// After a transient failure the loop sleeps for `task.delay` before the next attempt; there is
/// no sleep after the last one. When every attempt fails transiently, the error from the final
/// attempt is returned. A `max_attempts` of zero still makes one attempt.
#[tracing::instrument(
    skip(downloader, task),
    fields(url = %task.video_url, path = %task.output_path.display())
)]
pub async fn download_with_retry<D>(downloader: &D, task: &DownloadTask) -> Result<(), MediaError>
where
    D: MediaDownloader,
{
    let max_attempts = task.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let error = match downloader
            .download(&task.video_url, &task.output_path)
            .await
        {
            Ok(()) => {
                tracing::info!(attempt, "downloaded video");
                return Ok(());
            }
            Err(e) if !e.is_transient() => {
                tracing::error!(attempt, error = %e, "download failed permanently");
                return Err(e);
            }
            Err(e) => e,
        };

        if attempt >= max_attempts {
            tracing::error!(attempts = attempt, error = %error, "giving up on download");
            return Err(error);
        }

        tracing::warn!(
            attempt,
            max_attempts,
            error = %error,
            delay = ?task.delay,
            "download attempt failed, retrying"
        );
        tokio::time::sleep(task.delay).await;
    }
}

/// Downloads through the `yt-dlp` executable.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
    format: String,
    attempt_timeout: Duration,
}

impl YtDlp {
    /// Uses `yt-dlp` from `$PATH`, preferring a single progressive MP4 stream.
    pub fn new(attempt_timeout: Duration) -> Self {
        Self {
            program: PathBuf::from("yt-dlp"),
            format: "best[ext=mp4]/best".to_string(),
            attempt_timeout,
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }
}

impl MediaDownloader for YtDlp {
    #[tracing::instrument(skip(self), fields(program = %self.program.display()))]
    async fn download(&self, video_url: &str, output_path: &Path) -> Result<(), MediaError> {
        let child = tokio::process::Command::new(&self.program)
            .arg("--no-playlist")
            .arg("--no-progress")
            .arg("-f")
            .arg(&self.format)
            .arg("-o")
            .arg(output_path)
            .arg(video_url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| MediaError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        // dropping the child on timeout kills it
        let finished = tokio::time::timeout(self.attempt_timeout, child.wait_with_output()).await;
        let output = match finished {
            Ok(output) => output.map_err(|source| MediaError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?,
            Err(_) => {
                return Err(MediaError::Timeout {
                    url: video_url.to_string(),
                    after: self.attempt_timeout,
                });
            }
        };

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!(status = %output.status, %stderr, "yt-dlp exited unsuccessfully");
        Err(classify_failure(video_url, &stderr))
    }
}

/// Maps yt-dlp's error output onto [`MediaError`].
///
/// Only the last `ERROR:` line decides the kind, since yt-dlp also reports recovered problems
/// as warnings. Without an `ERROR:` line the whole output is used.
fn classify_failure(video_url: &str, stderr: &str) -> MediaError {
    let error_line = stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| line.starts_with("ERROR:"));
    let reason = error_line
        .or_else(|| stderr.lines().rev().map(str::trim).find(|line| !line.is_empty()))
        .unwrap_or("yt-dlp exited without output")
        .to_string();

    let lower = error_line.unwrap_or(stderr).to_lowercase();
    if lower.contains("timed out") {
        MediaError::Timeout {
            url: video_url.to_string(),
            after: Duration::ZERO,
        }
    } else if lower.contains("video unavailable")
        || lower.contains("this video is unavailable")
        || lower.contains("temporarily unavailable")
        || lower.contains("http error 503")
    {
        MediaError::Unavailable {
            url: video_url.to_string(),
            reason,
        }
    } else {
        MediaError::Failed {
            url: video_url.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const URL: &str = "https://www.youtube.com/watch?v=xyz";

    /// Replays a fixed sequence of outcomes, then succeeds forever.
    struct Scripted {
        outcomes: Mutex<VecDeque<Result<(), MediaError>>>,
        calls: Mutex<u32>,
    }

    impl Scripted {
        fn new(outcomes: impl IntoIterator<Item = Result<(), MediaError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into_iter().collect()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    impl MediaDownloader for Scripted {
        async fn download(&self, _: &str, _: &Path) -> Result<(), MediaError> {
            *self.calls.lock().unwrap() += 1;
            self.outcomes.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }
    }

    /// Fails transiently on every call.
    struct AlwaysUnavailable {
        calls: Mutex<u32>,
    }

    impl MediaDownloader for AlwaysUnavailable {
        async fn download(&self, video_url: &str, _: &Path) -> Result<(), MediaError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            Err(MediaError::Unavailable {
                url: video_url.to_string(),
                reason: format!("attempt {calls}"),
            })
        }
    }

    fn unavailable() -> Result<(), MediaError> {
        Err(MediaError::Unavailable {
            url: URL.to_string(),
            reason: "try later".into(),
        })
    }

    fn timeout() -> Result<(), MediaError> {
        Err(MediaError::Timeout {
            url: URL.to_string(),
            after: Duration::from_secs(1),
        })
    }

    fn task(max_attempts: u32) -> DownloadTask {
        DownloadTask {
            video_url: URL.to_string(),
            output_path: PathBuf::from("download_dir/xyz.mp4"),
            max_attempts,
            delay: Duration::from_secs(10),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let downloader = Scripted::new([unavailable(), timeout()]);
        let start = tokio::time::Instant::now();

        download_with_retry(&downloader, &task(5)).await.unwrap();

        assert_eq!(downloader.calls(), 3);
        // two sleeps of the configured delay
        assert_eq!(start.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn first_attempt_success_does_not_sleep() {
        let downloader = Scripted::new([Ok(())]);
        let start = tokio::time::Instant::now();

        download_with_retry(&downloader, &task(5)).await.unwrap();

        assert_eq!(downloader.calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let downloader = AlwaysUnavailable {
            calls: Mutex::new(0),
        };
        let start = tokio::time::Instant::now();

        let err = download_with_retry(&downloader, &task(5)).await.unwrap_err();

        assert_eq!(*downloader.calls.lock().unwrap(), 5);
        // no sleep after the last attempt
        assert_eq!(start.elapsed(), Duration::from_secs(40));
        // the final failure is the one surfaced
        match err {
            MediaError::Unavailable { reason, .. } => assert_eq!(reason, "attempt 5"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failure_is_not_retried() {
        let downloader = Scripted::new([
            unavailable(),
            Err(MediaError::Failed {
                url: URL.to_string(),
                reason: "Requested format is not available".into(),
            }),
        ]);
        let start = tokio::time::Instant::now();

        let err = download_with_retry(&downloader, &task(5)).await.unwrap_err();

        assert!(matches!(err, MediaError::Failed { .. }), "{err:?}");
        assert_eq!(downloader.calls(), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_tries_once() {
        let downloader = AlwaysUnavailable {
            calls: Mutex::new(0),
        };

        download_with_retry(&downloader, &task(0)).await.unwrap_err();

        assert_eq!(*downloader.calls.lock().unwrap(), 1);
    }

    #[test]
    fn classifies_yt_dlp_errors() {
        let unavailable = classify_failure(
            URL,
            "[youtube] xyz: Downloading webpage\nERROR: [youtube] xyz: Video unavailable\n",
        );
        match unavailable {
            MediaError::Unavailable { reason, .. } => {
                assert_eq!(reason, "ERROR: [youtube] xyz: Video unavailable")
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let timeout = classify_failure(
            URL,
            "ERROR: Unable to download webpage: The read operation timed out\n",
        );
        assert!(matches!(timeout, MediaError::Timeout { .. }), "{timeout:?}");

        let failed = classify_failure(URL, "ERROR: Unsupported URL: https://example.com\n");
        assert!(matches!(failed, MediaError::Failed { .. }), "{failed:?}");

        // a recovered read timeout does not make the final error transient
        let private = classify_failure(
            URL,
            "WARNING: [youtube] xyz: Read timed out. Retrying (1/3)...\n\
             ERROR: [youtube] xyz: Private video. Sign in if you've been granted access\n",
        );
        match &private {
            MediaError::Failed { reason, .. } => assert_eq!(
                reason,
                "ERROR: [youtube] xyz: Private video. Sign in if you've been granted access"
            ),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!private.is_transient());

        let warned_unavailable = classify_failure(
            URL,
            "WARNING: video unavailable in your region, trying another client\n\
             ERROR: [youtube] xyz: Requested format is not available\n",
        );
        assert!(
            matches!(warned_unavailable, MediaError::Failed { .. }),
            "{warned_unavailable:?}"
        );

        let no_error_line = classify_failure(URL, "Read timed out\n");
        assert!(matches!(no_error_line, MediaError::Timeout { .. }), "{no_error_line:?}");

        let silent = classify_failure(URL, "");
        match silent {
            MediaError::Failed { reason, .. } => assert_eq!(reason, "yt-dlp exited without output"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    /// Writes an executable stand-in for yt-dlp that runs `body`.
    #[cfg(unix)]
    fn fake_yt_dlp(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-yt-dlp");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_download_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = YtDlp::new(Duration::from_millis(300))
            .with_program(fake_yt_dlp(dir.path(), "exec sleep 30"));
        let start = std::time::Instant::now();

        let err = downloader
            .download(URL, &dir.path().join("xyz.mp4"))
            .await
            .unwrap_err();

        match &err {
            MediaError::Timeout { after, .. } => assert_eq!(*after, Duration::from_millis(300)),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_transient());
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_run_is_classified_from_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = YtDlp::new(Duration::from_secs(30)).with_program(fake_yt_dlp(
            dir.path(),
            "echo 'ERROR: [youtube] xyz: Video unavailable' >&2\nexit 1",
        ));

        let err = downloader
            .download(URL, &dir.path().join("xyz.mp4"))
            .await
            .unwrap_err();

        match err {
            MediaError::Unavailable { reason, .. } => {
                assert_eq!(reason, "ERROR: [youtube] xyz: Video unavailable")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_run_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let downloader =
            YtDlp::new(Duration::from_secs(30)).with_program(fake_yt_dlp(dir.path(), "exit 0"));

        downloader
            .download(URL, &dir.path().join("xyz.mp4"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_executable_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = YtDlp::new(Duration::from_secs(5))
            .with_program(dir.path().join("no-such-yt-dlp"));

        let err = downloader
            .download(URL, &dir.path().join("xyz.mp4"))
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::Spawn { .. }), "{err:?}");
        assert!(!err.is_transient());
    }
}
