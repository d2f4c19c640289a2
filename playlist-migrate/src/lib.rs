//! Republishes a YouTube playlist from one channel onto another.
//!
//! Each video is downloaded with `yt-dlp`, described from its public watch page, uploaded to the
//! target channel with the YouTube Data API, and given the configured subtitle tracks. Uploaded
//! source ids go into an append-only ledger so reruns never upload a video twice.

use crate::config::AccountConfig;
use crate::credentials::ClientSecrets;
use crate::oauth::OAuthManager;
use crate::youtube_api::{TimeBoundAccessToken, YouTubeClient};
use eyre::Context;
use std::sync::Arc;

pub mod config;
pub mod credentials;
pub mod download;
pub mod error;
pub mod ledger;
pub mod metadata;
pub mod migrate;
pub mod oauth;
pub mod playlist;
pub mod publish;
pub mod youtube_api;

/// Produces an API handle authorized for one account.
///
/// A cached token is refreshed up front. Without a cache, or when Google refuses the refresh,
/// the user goes through the browser consent flow. The handle is then checked by listing the
/// channels it manages; `label` only shows up in logs and errors.
#[tracing::instrument(skip(account), fields(token_cache = %account.token_cache.display()))]
pub async fn authorize(label: &str, account: &AccountConfig) -> eyre::Result<YouTubeClient> {
    let secrets = ClientSecrets::load(&account.client_secrets).await?;
    let oauth_manager = OAuthManager::new(secrets);

    let token = match credentials::load_token(&account.token_cache).await? {
        Some(cached) => {
            tracing::info!("refreshing cached token");
            let mut token = TimeBoundAccessToken::expired(cached);
            if token
                .refresh(&oauth_manager)
                .await
                .context("refresh cached token")?
            {
                token
            } else {
                tracing::warn!("cached token refused, getting new token via full OAuth");
                let raw_token = oauth_manager
                    .authenticate()
                    .await
                    .with_context(|| format!("authorize {label} account"))?;
                TimeBoundAccessToken::new(raw_token)
            }
        }
        None => {
            tracing::info!("no cached token, starting OAuth flow");
            let raw_token = oauth_manager
                .authenticate()
                .await
                .with_context(|| format!("authorize {label} account"))?;
            TimeBoundAccessToken::new(raw_token)
        }
    };

    let client = YouTubeClient::new(token, Arc::new(oauth_manager), reqwest::Client::new());

    let channels = client
        .list_my_channels()
        .await
        .with_context(|| format!("list channels of {label} account"))?;
    if channels.is_empty() {
        eyre::bail!("{label} account has no YouTube channel");
    }
    for channel in &channels {
        tracing::info!(channel_id = channel.id, title = channel.snippet.title, "authorized");
    }

    // cache right away so an aborted run does not cost another consent round
    persist_token(&client, account).await?;
    Ok(client)
}

/// Writes the client's current token to the account's token cache.
pub async fn persist_token(client: &YouTubeClient, account: &AccountConfig) -> eyre::Result<()> {
    credentials::store_token(&account.token_cache, &client.token().await).await
}
