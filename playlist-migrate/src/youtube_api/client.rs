//! Core YouTube API client functionality and authentication management.

use crate::error::ApiError;
use crate::oauth::OAuthManager;
use crate::youtube_api::{
    captions::{CaptionInsertRequest, CaptionTrack},
    channels::Channel,
    playlist_items::PlaylistItem,
    types::{ListResponse, MAX_PAGE_SIZE, collect_pages},
    videos::{Video, VideoInsertRequest},
};
use eyre::Context;
use http::Method;
use oauth2::TokenResponse;
use oauth2::basic::BasicTokenResponse;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tracing::instrument;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const UPLOAD_BASE: &str = "https://www.googleapis.com/upload/youtube/v3";

#[derive(Debug, Clone)]
pub struct TimeBoundAccessToken {
    token: BasicTokenResponse,
    /// When the current access token expires (with safety buffer)
    expires_at: SystemTime,
}

impl TimeBoundAccessToken {
    /// Creates a token that is already expired, forcing a refresh before first use.
    ///
    /// Tokens loaded from the on-disk cache start out this way since we do not know how long ago
    /// they were issued.
    pub fn expired(token: BasicTokenResponse) -> Self {
        Self {
            expires_at: SystemTime::UNIX_EPOCH,
            token,
        }
    }

    /// Wraps a freshly issued token, expiring five minutes before Google says it does.
    pub fn new(token: BasicTokenResponse) -> Self {
        Self {
            expires_at: Self::calculate_token_expiry(&token),
            token,
        }
    }

    pub fn raw_token(&self) -> &BasicTokenResponse {
        &self.token
    }

    /// Refreshes this token using the provided OAuth manager, preserving the refresh token.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Token was successfully refreshed
    /// * `Ok(false)` - Refresh was refused (invalid grant, no refresh token)
    /// * `Err(_)` - Network or other error occurred
    pub async fn refresh(&mut self, oauth_manager: &OAuthManager) -> eyre::Result<bool> {
        tracing::trace!("refreshing token");
        match oauth_manager
            .refresh_token(self.token.clone())
            .await
            .context("refresh OAuth token")?
        {
            Some(new_token) => {
                let old_token = std::mem::replace(&mut self.token, new_token);

                // Google usually omits the refresh token from refresh responses
                if self.token.refresh_token().is_none() {
                    tracing::trace!("new token lacks refresh token, preserving original");
                    self.token
                        .set_refresh_token(old_token.refresh_token().cloned());
                }

                self.expires_at = Self::calculate_token_expiry(&self.token);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// `now + expires_in - 5min`, or 55 minutes if the token does not say.
    fn calculate_token_expiry(token: &BasicTokenResponse) -> SystemTime {
        let now = SystemTime::now();
        if let Some(expires_in) = token.expires_in() {
            now + expires_in.saturating_sub(Duration::from_secs(300))
        } else {
            now + Duration::from_secs(3300)
        }
    }
}

/// Client for the parts of the YouTube Data API v3 a playlist migration needs.
///
/// Expired access tokens are refreshed transparently before each call using the stored refresh
/// token. Clones share the token, so a refresh through one clone is seen by all of them.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    token: Arc<Mutex<TimeBoundAccessToken>>,
    oauth_manager: Arc<OAuthManager>,
    client: reqwest::Client,
}

impl YouTubeClient {
    pub fn new(
        token: TimeBoundAccessToken,
        oauth_manager: Arc<OAuthManager>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            token: Arc::new(Mutex::new(token)),
            oauth_manager,
            client,
        }
    }

    /// The current OAuth2 token, for writing back to the token cache.
    pub async fn token(&self) -> BasicTokenResponse {
        self.token.lock().await.raw_token().clone()
    }

    /// Gets a guaranteed-fresh access token, refreshing if necessary.
    #[instrument(skip(self), level = tracing::Level::TRACE)]
    async fn fresh_access_token(&self) -> eyre::Result<String> {
        let mut token = self.token.lock().await;

        if SystemTime::now() >= token.expires_at {
            tracing::debug!("access token expired, attempting refresh");
            if token.refresh(&self.oauth_manager).await? {
                tracing::debug!("access token successfully refreshed");
            } else {
                tracing::error!("access token refresh failed, client is unusable");
                return Err(eyre::eyre!("Unable to refresh expired access token"));
            }
        }

        Ok(token.token.access_token().secret().to_string())
    }

    /// Starts a request with a fresh bearer token attached.
    async fn authorized(&self, method: Method, url: &str) -> eyre::Result<reqwest::RequestBuilder> {
        let access_token = self.fresh_access_token().await?;
        Ok(self
            .client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", access_token)))
    }

    /// Sends `request` and turns any non-2xx status into an [`ApiError`].
    async fn send_checked(
        method: &Method,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> eyre::Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .with_context(|| format!("send {} request to YouTube API: {}", method, url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ApiError {
                method: method.clone(),
                url: url.to_string(),
                status,
                body,
            }
            .into());
        }

        Ok(response)
    }

    /// Makes an authenticated JSON API request.
    ///
    /// Handles token freshness, the authorization header, query parameters, an optional JSON
    /// body, and status validation. Returns the raw [`reqwest::Response`] for endpoint-specific
    /// parsing.
    #[instrument(skip(self, json_body), level = tracing::Level::TRACE)]
    pub(crate) async fn make_authenticated_request(
        &self,
        method: Method,
        url: &str,
        query_params: Option<&[(&str, &str)]>,
        json_body: Option<&impl Serialize>,
    ) -> eyre::Result<reqwest::Response> {
        let mut request = self.authorized(method.clone(), url).await?;

        if let Some(params) = query_params {
            request = request.query(params);
        }

        if let Some(body) = json_body {
            request = request
                .header("Content-Type", "application/json")
                .json(body);
        }

        Self::send_checked(&method, url, request).await
    }

    /// Uploads `file` alongside `metadata` in one go and parses the created resource.
    ///
    /// Uses the resumable upload protocol as a single-shot submission: a POST carrying the JSON
    /// metadata opens an upload session, then one PUT streams the entire file to the session URI.
    /// A failed upload is not resumed.
    ///
    /// See: <https://developers.google.com/youtube/v3/guides/using_resumable_upload_protocol>
    #[instrument(skip(self, metadata, file), fields(file = %file.display()))]
    async fn upload_media<T: DeserializeOwned>(
        &self,
        url: &str,
        part: &str,
        metadata: &impl Serialize,
        file: &Path,
        content_type: &str,
    ) -> eyre::Result<T> {
        let body = tokio::fs::File::open(file)
            .await
            .with_context(|| format!("open {} for upload", file.display()))?;
        let length = body
            .metadata()
            .await
            .with_context(|| format!("stat {}", file.display()))?
            .len();

        let length_header = length.to_string();
        let session = self
            .authorized(Method::POST, url)
            .await?
            .query(&[("uploadType", "resumable"), ("part", part)])
            .header("Content-Type", "application/json; charset=UTF-8")
            .header("X-Upload-Content-Type", content_type)
            .header("X-Upload-Content-Length", &length_header)
            .json(metadata);
        let session = Self::send_checked(&Method::POST, url, session).await?;
        let session_uri = session
            .headers()
            .get(reqwest::header::LOCATION)
            .ok_or_else(|| eyre::eyre!("upload session from {url} has no Location header"))?
            .to_str()
            .context("upload session URI is not valid UTF-8")?
            .to_string();
        tracing::debug!(bytes = length, "opened upload session");

        let upload = self
            .authorized(Method::PUT, &session_uri)
            .await?
            .header("Content-Type", content_type)
            .header("Content-Length", &length_header)
            .body(reqwest::Body::from(body));
        let response = Self::send_checked(&Method::PUT, url, upload).await?;

        response
            .json()
            .await
            .with_context(|| format!("parse upload response from {url} as JSON"))
    }

    /// Every video in a playlist, in playlist order.
    ///
    /// Uses `playlistItems.list` and follows `nextPageToken` past the 50-item page limit.
    ///
    /// # Required Scopes
    ///
    /// * `https://www.googleapis.com/auth/youtube.readonly`
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlistItems/list>
    #[instrument(skip(self))]
    pub async fn list_playlist_items(&self, playlist_id: &str) -> eyre::Result<Vec<PlaylistItem>> {
        collect_pages(move |page_token| self.list_playlist_items_page(playlist_id, page_token))
            .await
    }

    async fn list_playlist_items_page(
        &self,
        playlist_id: &str,
        page_token: Option<String>,
    ) -> eyre::Result<ListResponse<PlaylistItem>> {
        let url = format!("{API_BASE}/playlistItems");
        let max_results = MAX_PAGE_SIZE.to_string();
        let mut query_params = vec![
            ("part", "snippet"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(ref token) = page_token {
            query_params.push(("pageToken", token.as_str()));
        }

        let response = self
            .make_authenticated_request(Method::GET, &url, Some(&query_params), None::<&()>)
            .await?;

        let items: ListResponse<PlaylistItem> = response
            .json()
            .await
            .context("parse YouTube playlistItems API response as JSON")?;

        tracing::debug!(
            total_results = items.page_info.map(|p| p.total_results),
            returned_items = items.items.len(),
            "fetched playlist items"
        );

        Ok(items)
    }

    /// Channels owned by the authenticated user.
    ///
    /// Usually exactly one. Used to confirm which account a client ended up authorized as.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/channels/list>
    #[instrument(skip(self))]
    pub async fn list_my_channels(&self) -> eyre::Result<Vec<Channel>> {
        collect_pages(move |page_token| async move {
            let url = format!("{API_BASE}/channels");
            let max_results = MAX_PAGE_SIZE.to_string();
            let mut query_params = vec![
                ("part", "id,snippet"),
                ("mine", "true"),
                ("maxResults", max_results.as_str()),
            ];
            if let Some(ref token) = page_token {
                query_params.push(("pageToken", token.as_str()));
            }

            let response = self
                .make_authenticated_request(Method::GET, &url, Some(&query_params), None::<&()>)
                .await?;

            response
                .json::<ListResponse<Channel>>()
                .await
                .context("parse YouTube channels API response as JSON")
        })
        .await
    }

    /// Uploads a video file with the given metadata and returns the created resource.
    ///
    /// # Required Scopes
    ///
    /// * `https://www.googleapis.com/auth/youtube.upload`
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/videos/insert>
    #[instrument(
        skip(self, file, request),
        fields(file = %file.display(), title = %request.snippet.title)
    )]
    pub async fn insert_video(
        &self,
        file: &Path,
        request: &VideoInsertRequest,
    ) -> eyre::Result<Video> {
        let url = format!("{UPLOAD_BASE}/videos");
        let video: Video = self
            .upload_media(&url, "snippet,status", request, file, "video/*")
            .await?;

        tracing::debug!(video_id = video.id, "video upload accepted");
        Ok(video)
    }

    /// Attaches a caption file to a video and returns the created track.
    ///
    /// # Required Scopes
    ///
    /// * `https://www.googleapis.com/auth/youtube.force-ssl`
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/captions/insert>
    #[instrument(
        skip(self, file, request),
        fields(
            file = %file.display(),
            video_id = %request.snippet.video_id,
            language = %request.snippet.language,
        )
    )]
    pub async fn insert_caption(
        &self,
        file: &Path,
        request: &CaptionInsertRequest,
    ) -> eyre::Result<CaptionTrack> {
        let url = format!("{UPLOAD_BASE}/captions");
        let track: CaptionTrack = self
            .upload_media(&url, "snippet", request, file, "application/octet-stream")
            .await?;

        tracing::debug!(caption_id = track.id, "caption upload accepted");
        Ok(track)
    }

    /// The caption tracks attached to a video.
    ///
    /// # Required Scopes
    ///
    /// * `https://www.googleapis.com/auth/youtube.force-ssl`
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/captions/list>
    #[instrument(skip(self))]
    pub async fn list_caption_tracks(&self, video_id: &str) -> eyre::Result<Vec<CaptionTrack>> {
        let url = format!("{API_BASE}/captions");
        let query_params = [("part", "snippet"), ("videoId", video_id)];

        let response = self
            .make_authenticated_request(Method::GET, &url, Some(&query_params), None::<&()>)
            .await?;

        let tracks: ListResponse<CaptionTrack> = response
            .json()
            .await
            .context("parse YouTube captions API response as JSON")?;

        tracing::debug!(returned_items = tracks.items.len(), "fetched caption tracks");
        Ok(tracks.items)
    }

    /// Downloads one caption track as SubRip into `dest`, replacing any existing file.
    ///
    /// Only works for tracks on videos the authenticated user may edit.
    ///
    /// # Required Scopes
    ///
    /// * `https://www.googleapis.com/auth/youtube.force-ssl`
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/captions/download>
    #[instrument(skip(self, dest), fields(dest = %dest.display()))]
    pub async fn download_caption_track(&self, caption_id: &str, dest: &Path) -> eyre::Result<()> {
        let url = format!("{API_BASE}/captions/{caption_id}");
        let query_params = [("tfmt", "srt")];

        let response = self
            .make_authenticated_request(Method::GET, &url, Some(&query_params), None::<&()>)
            .await?;
        let body = response
            .bytes()
            .await
            .context("read caption track body")?;

        tokio::fs::write(dest, &body)
            .await
            .with_context(|| format!("write caption track to {}", dest.display()))?;

        tracing::debug!(bytes = body.len(), "downloaded caption track");
        Ok(())
    }
}
