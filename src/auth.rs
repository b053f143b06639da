//! Implicit-grant authentication
//!
//! The authorize URL sends the browser back to a loopback address with the
//! token in the URL fragment. Fragments never reach a server, so the page we
//! serve on the redirect path forwards `location.hash` to a second route
//! that parses it.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use url::{Host, Url};

use crate::config::Config;
use crate::error::DrawerError;

const AUTHORIZE_ENDPOINT: &str = "https://accounts.spotify.com/authorize";
pub const SCOPES: &str =
    "streaming user-read-private user-read-email user-modify-playback-state user-read-playback-state";

const TOKEN_RELAY_PATH: &str = "/relay-token";

const CALLBACK_PAGE: &str = r#"<!doctype html>
<html>
<head><title>Music Drawer</title></head>
<body>
<h1 id="status">Finishing login...</h1>
<script>
  const fragment = window.location.hash.substring(1);
  fetch('/relay-token?' + fragment)
    .then((r) => r.text())
    .then((t) => { document.getElementById('status').textContent = t; });
</script>
</body>
</html>
"#;

/// Bearer token captured from the redirect fragment.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub value: String,
    pub token_type: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl AccessToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| exp <= Utc::now())
    }

    /// Convert into the token shape rspotify expects. There is no refresh token.
    pub fn to_rspotify_token(&self) -> rspotify::Token {
        let expires_in = self
            .expires_at
            .map(|exp| exp - Utc::now())
            .unwrap_or_else(|| Duration::seconds(3600));

        rspotify::Token {
            access_token: self.value.clone(),
            expires_in,
            expires_at: self.expires_at,
            scopes: SCOPES
                .split_whitespace()
                .map(|s| s.to_string())
                .collect::<HashSet<String>>(),
            refresh_token: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub client_id: String,
    pub redirect_uri: Url,
    pub scopes: String,
}

impl AuthConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scopes: SCOPES.to_string(),
        }
    }
}

/// URL that starts the implicit grant.
pub fn authorize_url(config: &AuthConfig) -> Url {
    let mut url = Url::parse(AUTHORIZE_ENDPOINT).expect("authorize endpoint is a valid URL");
    url.query_pairs_mut()
        .append_pair("client_id", &config.client_id)
        .append_pair("response_type", "token")
        .append_pair("redirect_uri", config.redirect_uri.as_str())
        .append_pair("scope", &config.scopes);
    url
}

/// Extract the access token from a redirect.
///
/// Accepts a full redirect URL, a `#fragment`, or the bare `key=value` list.
pub fn parse_redirect_fragment(input: &str) -> Result<AccessToken, DrawerError> {
    let input = input.trim();
    let params = match (input.find('#'), input.find('?')) {
        (Some(idx), _) => &input[idx + 1..],
        (None, Some(idx)) => &input[idx + 1..],
        (None, None) => input,
    };

    let mut access_token = None;
    let mut token_type = None;
    let mut expires_in = None;

    for (key, value) in url::form_urlencoded::parse(params.as_bytes()) {
        match key.as_ref() {
            "access_token" if !value.is_empty() => access_token = Some(value.into_owned()),
            "token_type" => token_type = Some(value.into_owned()),
            "expires_in" => expires_in = value.parse::<i64>().ok(),
            "error" => return Err(DrawerError::AuthDenied(value.into_owned())),
            _ => {}
        }
    }

    let value = access_token.ok_or(DrawerError::MissingToken)?;

    Ok(AccessToken {
        value,
        token_type: token_type.unwrap_or_else(|| "Bearer".to_string()),
        expires_at: expires_in.and_then(expiry_from_now),
    })
}

/// `None` when `secs` does not fit in a timestamp, same as an unparseable value.
fn expiry_from_now(secs: i64) -> Option<DateTime<Utc>> {
    Duration::try_seconds(secs).and_then(|delta| Utc::now().checked_add_signed(delta))
}

/// The single persisted token record.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the stored token. A missing or expired record is `Ok(None)`.
    pub fn load(&self) -> Result<Option<AccessToken>, DrawerError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        let token: AccessToken = serde_json::from_str(&content)?;

        if token.is_expired() {
            tracing::debug!(path = %self.path.display(), "Stored token has expired");
            return Ok(None);
        }

        Ok(Some(token))
    }

    pub fn save(&self, token: &AccessToken) -> Result<(), DrawerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string(token)?)?;
        tracing::debug!(path = %self.path.display(), "Saved access token");
        Ok(())
    }

    pub fn clear(&self) -> Result<(), DrawerError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

type TokenSender = oneshot::Sender<Result<AccessToken, DrawerError>>;

#[derive(Clone)]
struct RelayState {
    sender: Arc<Mutex<Option<TokenSender>>>,
}

/// Loopback listener that receives the redirect.
pub struct CallbackListener {
    listener: TcpListener,
    redirect_path: String,
}

impl CallbackListener {
    pub async fn bind(redirect_uri: &Url) -> Result<Self> {
        let port = redirect_uri
            .port()
            .ok_or_else(|| anyhow!("redirect uri has no port: {}", redirect_uri))?;
        let host = match redirect_uri.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            None => return Err(anyhow!("redirect uri has no host: {}", redirect_uri)),
        };

        let listener = TcpListener::bind((host.as_str(), port)).await?;
        tracing::debug!(host = %host, port, "Callback listener bound");

        Ok(Self {
            listener,
            redirect_path: redirect_uri.path().to_string(),
        })
    }

    /// Serve until a token (or a denial) arrives.
    pub async fn wait_for_token(self) -> Result<AccessToken> {
        let (token_tx, token_rx) = oneshot::channel();
        let state = RelayState {
            sender: Arc::new(Mutex::new(Some(token_tx))),
        };

        let app = Router::new()
            .route(&self.redirect_path, get(callback_page))
            .route(TOKEN_RELAY_PATH, get(relay_token))
            .with_state(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let listener = self.listener;
        tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = served {
                tracing::warn!(error = %e, "Callback listener stopped with an error");
            }
        });

        let outcome = token_rx
            .await
            .map_err(|_| anyhow!("callback listener closed before a token arrived"));
        let _ = shutdown_tx.send(());

        let token = outcome??;
        Ok(token)
    }
}

async fn callback_page() -> Html<&'static str> {
    Html(CALLBACK_PAGE)
}

async fn relay_token(
    State(state): State<RelayState>,
    RawQuery(query): RawQuery,
) -> (StatusCode, Html<&'static str>) {
    let parsed = parse_redirect_fragment(query.as_deref().unwrap_or_default());

    let (status, body) = match &parsed {
        Ok(_) => (StatusCode::OK, "Login complete. You can close this window."),
        Err(DrawerError::AuthDenied(_)) => (StatusCode::OK, "Login was cancelled."),
        Err(_) => {
            tracing::warn!("Redirect reached the callback without an access token");
            return (StatusCode::BAD_REQUEST, Html("No access token in the redirect."));
        }
    };

    let sender = state.sender.lock().ok().and_then(|mut guard| guard.take());
    if let Some(sender) = sender {
        let _ = sender.send(parsed);
    }

    (status, Html(body))
}

/// Run the whole login: bind the callback, open the browser, wait.
pub async fn login(config: &AuthConfig) -> Result<AccessToken> {
    let listener = CallbackListener::bind(&config.redirect_uri).await?;
    let url = authorize_url(config);

    tracing::info!(url = %url, "Starting implicit grant login");
    if let Err(e) = webbrowser::open(url.as_str()) {
        tracing::warn!(error = %e, "Could not open a browser; open the logged URL manually");
    }

    let token = listener.wait_for_token().await?;
    tracing::info!("Access token received");
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn auth_config() -> AuthConfig {
        AuthConfig {
            client_id: "abc123".to_string(),
            redirect_uri: Url::parse("http://127.0.0.1:8898/callback").unwrap(),
            scopes: SCOPES.to_string(),
        }
    }

    #[test]
    fn authorize_url_requests_implicit_grant() {
        let url = authorize_url(&auth_config());
        assert_eq!(url.host_str(), Some("accounts.spotify.com"));
        assert_eq!(url.path(), "/authorize");

        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["client_id"], "abc123");
        assert_eq!(pairs["response_type"], "token");
        assert_eq!(pairs["redirect_uri"], "http://127.0.0.1:8898/callback");
        assert_eq!(pairs["scope"], SCOPES);
        // Spaces in the scope list must not appear raw in the URL
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn token_is_extracted_from_full_redirect() {
        let token = parse_redirect_fragment(
            "http://127.0.0.1:8898/callback#access_token=BQD%2Fxyz&token_type=Bearer&expires_in=3600",
        )
        .unwrap();
        assert_eq!(token.value, "BQD/xyz");
        assert_eq!(token.token_type, "Bearer");
        let remaining = token.expires_at.unwrap() - Utc::now();
        assert!(remaining.num_seconds() > 3500);
        assert!(!token.is_expired());
    }

    #[test]
    fn token_is_extracted_from_bare_fragment() {
        let token = parse_redirect_fragment("#access_token=tok").unwrap();
        assert_eq!(token.value, "tok");
        assert_eq!(token.token_type, "Bearer");
        assert!(token.expires_at.is_none());

        let token = parse_redirect_fragment("access_token=tok2&expires_in=soon").unwrap();
        assert_eq!(token.value, "tok2");
        assert!(token.expires_at.is_none());
    }

    #[test]
    fn missing_or_empty_token_is_rejected() {
        assert!(matches!(
            parse_redirect_fragment("http://127.0.0.1:8898/callback"),
            Err(DrawerError::MissingToken)
        ));
        assert!(matches!(
            parse_redirect_fragment("#access_token=&expires_in=3600"),
            Err(DrawerError::MissingToken)
        ));
        assert!(matches!(parse_redirect_fragment(""), Err(DrawerError::MissingToken)));
    }

    #[test]
    fn denial_is_reported() {
        let err = parse_redirect_fragment("#error=access_denied&state=x").unwrap_err();
        assert!(matches!(err, DrawerError::AuthDenied(reason) if reason == "access_denied"));
    }

    #[test]
    fn debug_output_hides_the_token() {
        let token = parse_redirect_fragment("#access_token=supersecret").unwrap();
        assert!(!format!("{:?}", token).contains("supersecret"));
    }

    #[test]
    fn token_store_round_trips_and_skips_expired() {
        let dir = tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested").join("token.json"));
        assert!(store.load().unwrap().is_none());

        let token = parse_redirect_fragment("#access_token=abc&expires_in=3600").unwrap();
        store.save(&token).unwrap();
        assert_eq!(store.load().unwrap(), Some(token));

        let expired = AccessToken {
            value: "old".to_string(),
            token_type: "Bearer".to_string(),
            expires_at: Some(Utc::now() - Duration::seconds(5)),
        };
        store.save(&expired).unwrap();
        assert!(store.load().unwrap().is_none());

        store.clear().unwrap();
        assert!(!dir.path().join("nested").join("token.json").exists());
    }

    #[test]
    fn corrupt_token_record_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(TokenStore::new(path).load(), Err(DrawerError::Json(_))));
    }

    #[test]
    fn rspotify_token_carries_the_value() {
        let token = parse_redirect_fragment("#access_token=abc&expires_in=60").unwrap();
        let converted = token.to_rspotify_token();
        assert_eq!(converted.access_token, "abc");
        assert!(converted.refresh_token.is_none());
        assert!(converted.scopes.contains("streaming"));
    }

    #[test]
    fn oversized_expiry_is_treated_as_unknown() {
        let token = parse_redirect_fragment("#access_token=a&expires_in=9223372036854775807").unwrap();
        assert_eq!(token.value, "a");
        assert!(token.expires_at.is_none());

        let token = parse_redirect_fragment("#access_token=b&expires_in=9000000000000").unwrap();
        assert!(token.expires_at.is_none());
    }

    async fn start_listener() -> (u16, tokio::task::JoinHandle<Result<AccessToken>>) {
        let free = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = free.local_addr().unwrap().port();
        drop(free);

        let redirect = Url::parse(&format!("http://127.0.0.1:{}/callback", port)).unwrap();
        let listener = CallbackListener::bind(&redirect).await.unwrap();
        (port, tokio::spawn(listener.wait_for_token()))
    }

    async fn http_get(port: u16, path: &str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let request = format!(
            "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
            path
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn callback_listener_delivers_relayed_token() {
        let (port, waiter) = start_listener().await;

        let response = http_get(port, "/relay-token?access_token=relayed&expires_in=3600").await;
        assert!(response.starts_with("HTTP/1.1 200"));

        let token = waiter.await.unwrap().unwrap();
        assert_eq!(token.value, "relayed");
    }

    #[tokio::test]
    async fn callback_without_token_answers_400_and_keeps_waiting() {
        let (port, waiter) = start_listener().await;

        let response = http_get(port, "/relay-token?state=x").await;
        assert!(response.starts_with("HTTP/1.1 400"));
        assert!(!waiter.is_finished());

        let response = http_get(port, "/relay-token?access_token=second").await;
        assert!(response.starts_with("HTTP/1.1 200"));
        assert_eq!(waiter.await.unwrap().unwrap().value, "second");
    }

    #[tokio::test]
    async fn callback_denial_ends_the_login() {
        let (port, waiter) = start_listener().await;

        let response = http_get(port, "/relay-token?error=access_denied").await;
        assert!(response.starts_with("HTTP/1.1 200"));

        let err = waiter.await.unwrap().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DrawerError>(),
            Some(DrawerError::AuthDenied(reason)) if reason == "access_denied"
        ));
    }
}
