//! The videos a migration walks over.

use crate::youtube_api::{PlaylistItem, YouTubeClient};
use std::future::Future;

/// One video in the source playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub video_id: String,
    pub video_url: String,
}

impl PlaylistEntry {
    pub fn new(video_id: impl Into<String>) -> Self {
        let video_id = video_id.into();
        Self {
            video_url: format!("https://www.youtube.com/watch?v={video_id}"),
            video_id,
        }
    }
}

/// Anything that can enumerate a playlist.
pub trait PlaylistSource {
    /// Every entry in `playlist_id`, in playlist order.
    fn list_playlist(
        &self,
        playlist_id: &str,
    ) -> impl Future<Output = eyre::Result<Vec<PlaylistEntry>>>;
}

impl PlaylistSource for YouTubeClient {
    async fn list_playlist(&self, playlist_id: &str) -> eyre::Result<Vec<PlaylistEntry>> {
        let items = self.list_playlist_items(playlist_id).await?;
        Ok(entries_from_items(items))
    }
}

/// Keeps only items that point at a video.
fn entries_from_items(items: impl IntoIterator<Item = PlaylistItem>) -> Vec<PlaylistEntry> {
    items
        .into_iter()
        .filter_map(|item| match item.snippet.resource_id.video_id {
            Some(video_id) => Some(PlaylistEntry::new(video_id)),
            None => {
                tracing::warn!(
                    item_id = item.id,
                    kind = item.snippet.resource_id.kind,
                    "playlist item is not a video, skipping"
                );
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn entry_url_is_watch_url() {
        assert_eq!(
            PlaylistEntry::new("dQw4w9WgXcQ"),
            PlaylistEntry {
                video_id: "dQw4w9WgXcQ".into(),
                video_url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".into(),
            }
        );
    }

    #[test]
    fn non_video_items_are_dropped() {
        let items: Vec<PlaylistItem> = serde_json::from_value(json!([
            {
                "id": "item1",
                "snippet": {
                    "title": "first",
                    "resourceId": { "kind": "youtube#video", "videoId": "abc" }
                }
            },
            {
                "id": "item2",
                "snippet": {
                    "title": "odd one",
                    "resourceId": { "kind": "youtube#channel" }
                }
            },
            {
                "id": "item3",
                "snippet": {
                    "title": "last",
                    "resourceId": { "kind": "youtube#video", "videoId": "xyz" }
                }
            }
        ]))
        .unwrap();

        let ids: Vec<_> = entries_from_items(items)
            .into_iter()
            .map(|entry| entry.video_id)
            .collect();
        assert_eq!(ids, vec!["abc", "xyz"]);
    }
}
