//! Putting videos and their caption tracks on the target channel.

use crate::config::SubtitleSpec;
use crate::youtube_api::{
    CaptionInsertRequest, CaptionInsertSnippet, PrivacyStatus, VideoInsertRequest, VideoSnippet,
    VideoStatus, YouTubeClient,
};
use std::future::Future;
use std::path::Path;

/// What a republished video is called and who can see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoUpload {
    pub title: String,
    pub description: String,
    pub category_id: String,
    pub tags: Vec<String>,
    pub privacy: PrivacyStatus,
}

/// Destination channel for republished videos.
///
/// Neither operation retries. A rejection from the remote end is returned as-is.
pub trait Publisher {
    /// Uploads `file` and returns the new video's id.
    fn publish_video(
        &self,
        file: &Path,
        upload: &VideoUpload,
    ) -> impl Future<Output = eyre::Result<String>>;

    /// Attaches `subtitle` to `video_id` as a published (non-draft) track and returns the
    /// caption id.
    fn publish_subtitle(
        &self,
        video_id: &str,
        subtitle: &SubtitleSpec,
    ) -> impl Future<Output = eyre::Result<String>>;
}

impl Publisher for YouTubeClient {
    async fn publish_video(&self, file: &Path, upload: &VideoUpload) -> eyre::Result<String> {
        let request = VideoInsertRequest {
            snippet: VideoSnippet {
                title: upload.title.clone(),
                description: upload.description.clone(),
                tags: upload.tags.clone(),
                category_id: upload.category_id.clone(),
            },
            status: VideoStatus {
                privacy_status: upload.privacy,
            },
        };
        let video = self.insert_video(file, &request).await?;
        Ok(video.id)
    }

    async fn publish_subtitle(
        &self,
        video_id: &str,
        subtitle: &SubtitleSpec,
    ) -> eyre::Result<String> {
        let request = CaptionInsertRequest {
            snippet: CaptionInsertSnippet {
                video_id: video_id.to_string(),
                language: subtitle.language.clone(),
                name: subtitle.name.clone(),
                is_draft: false,
            },
        };
        let track = self.insert_caption(&subtitle.path, &request).await?;
        Ok(track.id)
    }
}
