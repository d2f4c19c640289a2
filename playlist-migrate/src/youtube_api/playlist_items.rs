//! YouTube PlaylistItems API types.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A `playlistItem` resource identifies a resource, such as a video, that is included in a
/// playlist.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlistItems#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItem {
    /// The ID that YouTube uses to uniquely identify the playlist item (not the video).
    pub id: String,
    pub snippet: PlaylistItemSnippet,
}

/// Basic details about the playlist item.
///
/// Only the fields this tool reads are modelled.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlistItems#snippet>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItemSnippet {
    /// The item's title. Deleted and private videos keep their entry with a placeholder title.
    pub title: String,
    /// Zero-based position of the item in the playlist.
    #[serde(default)]
    pub position: Option<u32>,
    /// When the item was added to the playlist.
    #[serde(rename = "publishedAt", default)]
    pub published_at: Option<Timestamp>,
    /// The resource the playlist item points at.
    #[serde(rename = "resourceId")]
    pub resource_id: ResourceId,
}

/// Identifies the resource a playlist item refers to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceId {
    /// The kind of referenced resource, normally `youtube#video`.
    pub kind: String,
    /// Present when `kind` is `youtube#video`.
    #[serde(rename = "videoId", default)]
    pub video_id: Option<String>,
}
