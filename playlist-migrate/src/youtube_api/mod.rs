//! YouTube Data API v3 client.
//!
//! Covers just what republishing a playlist touches: listing playlist items and the caller's
//! channels, uploading videos, and uploading, listing and downloading caption tracks. Every
//! resource type models only the fields this crate reads or writes.
//!
//! Uploads use the resumable upload protocol but send the whole file in one request; see
//! [`YouTubeClient::insert_video`].

pub mod captions;
pub mod channels;
pub mod client;
pub mod playlist_items;
pub mod types;
pub mod videos;

pub use client::{TimeBoundAccessToken, YouTubeClient};
pub use types::{ListResponse, PageInfo};

pub use captions::{CaptionInsertRequest, CaptionInsertSnippet, CaptionSnippet, CaptionTrack};
pub use channels::{Channel, ChannelSnippet};
pub use playlist_items::{PlaylistItem, PlaylistItemSnippet, ResourceId};
pub use videos::{PrivacyStatus, Video, VideoInsertRequest, VideoSnippet, VideoStatus};
