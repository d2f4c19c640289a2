//! Republishing one playlist, video by video.
//!
//! For each playlist entry, in order:
//!
//! 1. scrape the watch page for title, description and tags;
//! 2. download to `{download_dir}/{video_id}.mp4` unless that file already exists;
//! 3. stop here if the ledger already lists the video;
//! 4. upload it publicly to the target channel;
//! 5. record it in the ledger;
//! 6. attach every configured subtitle file that exists on disk.
//!
//! Any failure aborts the whole run. Videos already handled stay in the ledger, so rerunning
//! picks up where the failed run stopped.

use crate::config::MigrationConfig;
use crate::download::{DownloadTask, MediaDownloader, download_with_retry};
use crate::ledger::Ledger;
use crate::metadata::MetadataSource;
use crate::playlist::{PlaylistEntry, PlaylistSource};
use crate::publish::{Publisher, VideoUpload};
use crate::youtube_api::PrivacyStatus;
use eyre::Context;

/// A source video that made it to the target channel during this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedVideo {
    pub source_id: String,
    pub remote_id: String,
}

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub published: Vec<PublishedVideo>,
    /// Source ids that were already in the ledger.
    pub skipped: Vec<String>,
    /// Videos fetched from the source in this run.
    pub downloaded: usize,
    /// Caption tracks attached.
    pub subtitles: usize,
    /// Configured subtitle files that did not exist when needed.
    pub missing_subtitles: usize,
}

/// One pass over a playlist.
pub struct Migration<'a, S, M, D, P> {
    config: &'a MigrationConfig,
    source: &'a S,
    metadata: &'a M,
    downloader: &'a D,
    publisher: &'a P,
}

impl<'a, S, M, D, P> Migration<'a, S, M, D, P>
where
    S: PlaylistSource,
    M: MetadataSource,
    D: MediaDownloader,
    P: Publisher,
{
    pub fn new(
        config: &'a MigrationConfig,
        source: &'a S,
        metadata: &'a M,
        downloader: &'a D,
        publisher: &'a P,
    ) -> Self {
        Self {
            config,
            source,
            metadata,
            downloader,
            publisher,
        }
    }

    /// Migrates every video in the configured playlist that `ledger` does not list yet.
    #[tracing::instrument(skip_all, fields(playlist_id = %self.config.playlist_id))]
    pub async fn run(&self, ledger: &mut Ledger) -> eyre::Result<MigrationReport> {
        tokio::fs::create_dir_all(&self.config.download_dir)
            .await
            .with_context(|| {
                format!(
                    "create download directory {}",
                    self.config.download_dir.display()
                )
            })?;

        let entries = self
            .source
            .list_playlist(&self.config.playlist_id)
            .await
            .context("list source playlist")?;
        tracing::info!(videos = entries.len(), "listed source playlist");

        let mut report = MigrationReport::default();
        for entry in &entries {
            self.migrate_one(entry, ledger, &mut report)
                .await
                .with_context(|| format!("migrate video {}", entry.video_id))?;
        }

        Ok(report)
    }

    #[tracing::instrument(skip_all, fields(video_id = %entry.video_id))]
    async fn migrate_one(
        &self,
        entry: &PlaylistEntry,
        ledger: &mut Ledger,
        report: &mut MigrationReport,
    ) -> eyre::Result<()> {
        let metadata = self
            .metadata
            .fetch(&entry.video_url)
            .await
            .context("fetch video metadata")?;

        let output_path = self.config.video_path(&entry.video_id);
        if tokio::fs::try_exists(&output_path)
            .await
            .with_context(|| format!("check for {}", output_path.display()))?
        {
            tracing::info!(path = %output_path.display(), "already downloaded, skipping download");
        } else {
            tracing::info!(path = %output_path.display(), "downloading video");
            let task = DownloadTask::new(&entry.video_url, &output_path, &self.config.retry);
            download_with_retry(self.downloader, &task)
                .await
                .context("download video")?;
            report.downloaded += 1;
        }

        if ledger.contains(&entry.video_id) {
            tracing::info!("already uploaded, skipping upload");
            report.skipped.push(entry.video_id.clone());
            return Ok(());
        }

        let upload = VideoUpload {
            title: metadata.title,
            description: metadata.description,
            category_id: self.config.category_id.clone(),
            tags: metadata.tags,
            privacy: PrivacyStatus::Public,
        };
        let remote_id = self
            .publisher
            .publish_video(&output_path, &upload)
            .await
            .context("upload video")?;
        tracing::info!(remote_id, "video uploaded");

        ledger
            .record(&entry.video_id)
            .await
            .context("record upload in ledger")?;

        for subtitle in &self.config.subtitles {
            let exists = tokio::fs::try_exists(&subtitle.path)
                .await
                .with_context(|| format!("check for {}", subtitle.path.display()))?;
            if !exists {
                tracing::warn!(
                    path = %subtitle.path.display(),
                    name = subtitle.name,
                    "subtitle file not found, skipping"
                );
                report.missing_subtitles += 1;
                continue;
            }

            let caption_id = self
                .publisher
                .publish_subtitle(&remote_id, subtitle)
                .await
                .with_context(|| format!("upload subtitle {}", subtitle.path.display()))?;
            tracing::info!(caption_id, language = subtitle.language, "subtitles uploaded");
            report.subtitles += 1;
        }

        report.published.push(PublishedVideo {
            source_id: entry.video_id.clone(),
            remote_id,
        });
        Ok(())
    }
}
