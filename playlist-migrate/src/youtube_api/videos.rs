//! YouTube Videos API types.

use serde::{Deserialize, Serialize};

/// Request body for `videos.insert`.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos/insert>
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoInsertRequest {
    pub snippet: VideoSnippet,
    pub status: VideoStatus,
}

/// Basic details about a video.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#snippet>
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoSnippet {
    /// At most 100 characters, no `<` or `>`.
    pub title: String,
    /// At most 5000 bytes, no `<` or `>`.
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// See `videoCategories.list` for the valid ids in a region.
    #[serde(rename = "categoryId")]
    pub category_id: String,
}

/// See: <https://developers.google.com/youtube/v3/docs/videos#status>
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoStatus {
    #[serde(rename = "privacyStatus")]
    pub privacy_status: PrivacyStatus,
}

/// Who can see a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrivacyStatus {
    /// Anyone can find and watch it.
    Public,
    /// Only people with the link.
    Unlisted,
    /// Only the owner and explicitly authorized viewers.
    Private,
}

/// The `video` resource returned once an upload is accepted.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    /// The ID that YouTube uses to uniquely identify the video.
    pub id: String,
    #[serde(default)]
    pub snippet: Option<VideoSnippet>,
    #[serde(default)]
    pub status: Option<VideoStatus>,
}
