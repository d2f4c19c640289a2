//! YouTube Captions API types.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Request body for `captions.insert`.
///
/// See: <https://developers.google.com/youtube/v3/docs/captions/insert>
#[derive(Debug, Clone, Serialize)]
pub struct CaptionInsertRequest {
    pub snippet: CaptionInsertSnippet,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaptionInsertSnippet {
    /// The video the track is attached to.
    #[serde(rename = "videoId")]
    pub video_id: String,
    /// BCP-47 language code.
    pub language: String,
    /// Track name shown to viewers.
    pub name: String,
    /// Draft tracks are not shown to viewers.
    #[serde(rename = "isDraft")]
    pub is_draft: bool,
}

/// A `caption` resource represents one caption track of a video.
///
/// See: <https://developers.google.com/youtube/v3/docs/captions#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionTrack {
    /// The ID that YouTube uses to uniquely identify the caption track.
    pub id: String,
    pub snippet: CaptionSnippet,
}

/// See: <https://developers.google.com/youtube/v3/docs/captions#snippet>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionSnippet {
    #[serde(rename = "videoId")]
    pub video_id: String,
    pub language: String,
    #[serde(default)]
    pub name: String,
    /// `standard`, `ASR` (automatic speech recognition) or `forced`.
    #[serde(rename = "trackKind", default)]
    pub track_kind: Option<String>,
    #[serde(rename = "isDraft", default)]
    pub is_draft: bool,
    #[serde(rename = "lastUpdated", default)]
    pub last_updated: Option<Timestamp>,
}
