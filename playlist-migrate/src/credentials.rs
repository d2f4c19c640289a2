//! On-disk OAuth material: the client-secret file and the per-account token cache.

use eyre::Context;
use oauth2::basic::BasicTokenResponse;
use serde::Deserialize;
use std::path::Path;

/// The OAuth client a Google Cloud project issued for this tool.
///
/// For installed applications the "secret" is embedded in the client and is not considered
/// confidential.
#[derive(Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecrets")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Layout of the JSON file the Cloud console offers for download.
#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parses a client-secret file for either an "installed" or a "web" client.
    pub fn from_json(json: &str) -> eyre::Result<Self> {
        let file: ClientSecretsFile =
            serde_json::from_str(json).context("parse client secrets JSON")?;
        let missing = "client secrets file has neither an \"installed\" nor a \"web\" client";
        file.installed
            .or(file.web)
            .ok_or_else(|| eyre::eyre!(missing))
    }

    pub async fn load(path: &Path) -> eyre::Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read client secrets from {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("load client secrets {}", path.display()))
    }
}

/// Reads a previously cached token, if there is one.
pub async fn load_token(path: &Path) -> eyre::Result<Option<BasicTokenResponse>> {
    let json = match tokio::fs::read_to_string(path).await {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("read cached token {}", path.display()));
        }
    };
    let token = serde_json::from_str(&json)
        .with_context(|| format!("parse cached token {}", path.display()))?;
    Ok(Some(token))
}

/// Replaces the cached token at `path`.
pub async fn store_token(path: &Path, token: &BasicTokenResponse) -> eyre::Result<()> {
    let json = serde_json::to_string(token).context("serialize OAuth token")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("write cached token {}", path.display()))
}
