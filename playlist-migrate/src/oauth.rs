//! OAuth 2.0 for installed applications.
//!
//! The user authorizes in their own browser; Google redirects back to a one-shot HTTP listener on
//! a random loopback port, which hands us the authorization code. Access tokens are later renewed
//! with the refresh token, without user interaction.

use crate::credentials::ClientSecrets;
use eyre::Context;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::service::service_fn;
use hyper::{Request, Response, body};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge, RedirectUrl,
    RevocationUrl, Scope, TokenResponse, TokenUrl, reqwest,
};
use std::future::Future;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const REVOCATION_URL: &str = "https://oauth2.googleapis.com/revoke";

/// Listing the source playlist, uploading videos, and managing captions.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/youtube.readonly",
    "https://www.googleapis.com/auth/youtube.upload",
    "https://www.googleapis.com/auth/youtube.force-ssl",
];

const OAUTH_DONE_HTML: &str = "<!DOCTYPE html>\
<html><head><title>playlist-migrate</title></head>\
<body><p>Authorization complete. You can close this tab and return to the terminal.</p></body>\
</html>";

/// Runs OAuth flows for one Google Cloud client.
#[derive(Debug, Clone)]
pub struct OAuthManager {
    secrets: ClientSecrets,
}

impl OAuthManager {
    pub fn new(secrets: ClientSecrets) -> Self {
        Self { secrets }
    }

    fn http_client() -> eyre::Result<reqwest::Client> {
        reqwest::ClientBuilder::new()
            // SSRF no thank you.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("build OAuth HTTP client")
    }

    /// Performs a complete authorization flow and returns a fresh token.
    ///
    /// Opens the user's browser at Google's consent page, waits for the redirect to arrive at a
    /// local listener, then exchanges the code (with PKCE) for tokens.
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded Google endpoint URLs are malformed.
    pub async fn authenticate(&self) -> eyre::Result<BasicTokenResponse> {
        let csrf = CsrfToken::new_random();
        let (redirect_url, eventually_authorization_code) = self
            .setup_redirect(csrf.clone())
            .await
            .context("set up redirect endpoint")?;

        let auth_url =
            AuthUrl::new(AUTH_URL.to_string()).expect("Invalid authorization endpoint URL");
        let token_url = TokenUrl::new(TOKEN_URL.to_string()).expect("Invalid token endpoint URL");
        let revocation_url = RevocationUrl::new(REVOCATION_URL.to_string())
            .expect("Invalid revocation endpoint URL");
        let client = BasicClient::new(ClientId::new(self.secrets.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.secrets.client_secret.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url)
            .set_revocation_url(revocation_url);

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (auth_url, _csrf_token) = client
            // We never re-use the CSRF since we only go through the flow exactly once.
            .authorize_url(move || csrf.clone())
            .add_scopes(SCOPES.iter().map(|scope| Scope::new(scope.to_string())))
            // ask for a refresh token even if the user granted access before
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .set_pkce_challenge(pkce_challenge)
            .url();

        tracing::info!(url = %auth_url, "asking user to follow OAuth flow");
        if let Err(e) = webbrowser::open(auth_url.as_ref()) {
            tracing::warn!(error = %e, "could not open a browser, open the URL above manually");
        }
        let authorization_code = eventually_authorization_code
            .await
            .context("await user authorization code")?;

        let token = client
            .exchange_code(authorization_code)
            .set_pkce_verifier(pkce_verifier)
            .request_async(&Self::http_client()?)
            .await
            .context("exchange authorization code with access token")?;

        Ok(token)
    }

    /// Attempts to renew `token` using its refresh token.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(new_token))` - Refresh succeeded
    /// * `Ok(None)` - There is no refresh token, or Google rejected it as an invalid grant; the
    ///   user has to go through [`Self::authenticate`] again
    /// * `Err(_)` - Network or other error occurred during the refresh attempt
    pub async fn refresh_token(
        &self,
        token: BasicTokenResponse,
    ) -> eyre::Result<Option<BasicTokenResponse>> {
        let Some(refresh_token) = token.refresh_token() else {
            tracing::warn!("no refresh token available, cannot refresh");
            return Ok(None);
        };

        tracing::debug!("attempting to refresh OAuth token");

        let token_url = TokenUrl::new(TOKEN_URL.to_string()).expect("Invalid token endpoint URL");
        let client = BasicClient::new(ClientId::new(self.secrets.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.secrets.client_secret.clone()))
            .set_token_uri(token_url);

        match client
            .exchange_refresh_token(refresh_token)
            .request_async(&Self::http_client()?)
            .await
        {
            Ok(new_token) => {
                tracing::debug!("successfully refreshed OAuth token");
                Ok(Some(new_token))
            }
            Err(ref e @ oauth2::RequestTokenError::ServerResponse(ref sr))
                if matches!(
                    sr.error(),
                    oauth2::basic::BasicErrorResponseType::InvalidGrant
                ) =>
            {
                tracing::warn!("OAuth refresh token considered invalid grant: {}", e);
                Ok(None)
            }
            Err(e) => Err(e).context("exchange refresh token"),
        }
    }

    /// Binds a loopback listener for the OAuth redirect.
    ///
    /// Returns the redirect URL to register with the flow and a future that resolves to the
    /// authorization code once Google redirects the browser back with a matching `state`.
    async fn setup_redirect(
        &self,
        csrf: CsrfToken,
    ) -> eyre::Result<(
        RedirectUrl,
        impl Future<Output = eyre::Result<AuthorizationCode>>,
    )> {
        let socket = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind to localhost")?;
        let addr = socket.local_addr().context("get local address")?;
        let url = RedirectUrl::new(format!("http://{}:{}", addr.ip(), addr.port()))
            .context("construct redirect url")?;
        let (tx, rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            let r = async move {
                let (conn, _) = socket.accept().await.context("accept")?;
                let conn = hyper_util::rt::TokioIo::new(conn);
                let (got, mut gotten) = tokio::sync::mpsc::channel(1);
                let service = service_fn(move |req: Request<body::Incoming>| {
                    let csrf = csrf.clone();
                    let got = got.clone();
                    async move {
                        let (state, code) = parse_redirect_query(req.uri().query().unwrap_or(""));
                        if state.as_deref() != Some(csrf.secret().as_str()) {
                            return Err("invalid csrf token");
                        }
                        let Some(code) = code else {
                            return Err("no authorization code found");
                        };
                        if got.send(AuthorizationCode::new(code)).await.is_err() {
                            return Err("authorization code already received");
                        }
                        Ok(Response::new(Full::<Bytes>::from(OAUTH_DONE_HTML)))
                    }
                });
                let mut serve = std::pin::pin!(
                    hyper::server::conn::http1::Builder::new().serve_connection(conn, service)
                );

                tokio::select! {
                    exit = &mut serve => {
                        if let Err(e) = exit {
                            Err(e).context("redirect server got bad request")
                        } else {
                            eyre::bail!("redirect server exit prematurely");
                        }
                    }
                    code = gotten.recv() => {
                        serve.as_mut().graceful_shutdown();
                        code.ok_or_else(|| eyre::eyre!("redirect server stopped without a code"))
                    }
                }
            };
            let _ = tx.send(r.await);
        });
        Ok((url, async move {
            rx.await.context("redirect future dropped prematurely")?
        }))
    }
}

/// Pulls `state` and `code` out of the redirect's query string.
fn parse_redirect_query(query: &str) -> (Option<String>, Option<String>) {
    let mut state = None;
    let mut code = None;
    for (k, v) in form_urlencoded::parse(query.as_bytes()) {
        match &*k {
            "state" => state = Some(v.into_owned()),
            "code" => code = Some(v.into_owned()),
            _ => {}
        }
    }
    (state, code)
}
