//! Controller module - Application logic and event handling
//!
//! - `session`: login, Web API client setup, one-time device creation
//! - `device_events`: mirrors device notifications into the model
//! - `navigation`: catalog search
//! - `playback`: selection, play/pause, favorite
//! - `input`: key event handling

mod session;
mod device_events;
mod navigation;
mod playback;
mod input;

use std::sync::Arc;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::audio::{AudioBackend, DeviceEvents, PlaybackDevice};
use crate::auth::{self, AccessToken, AuthConfig, TokenStore};
use crate::config::Config;
use crate::model::{AppModel, FavoriteStore, SpotifyClient, WebApi};

/// Creates the playback device for a session.
#[async_trait]
pub trait DeviceConnector: Send + Sync {
    async fn connect(
        &self,
        token: &AccessToken,
        api: Arc<dyn WebApi>,
    ) -> Result<(Arc<dyn PlaybackDevice>, DeviceEvents)>;
}

/// Obtains an access token from the user and the Web API client that uses it.
#[async_trait]
pub trait LoginFlow: Send + Sync {
    async fn login(&self) -> Result<AccessToken>;

    async fn web_api(&self, token: &AccessToken) -> Result<Arc<dyn WebApi>>;
}

/// Implicit grant through the system browser and the loopback callback
pub struct BrowserLogin {
    config: AuthConfig,
}

impl BrowserLogin {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LoginFlow for BrowserLogin {
    async fn login(&self) -> Result<AccessToken> {
        auth::login(&self.config).await
    }

    async fn web_api(&self, token: &AccessToken) -> Result<Arc<dyn WebApi>> {
        let client: Arc<dyn WebApi> = Arc::new(SpotifyClient::with_token(token).await?);
        Ok(client)
    }
}

/// Connects the librespot device
pub struct LibrespotConnector {
    config: Config,
}

impl LibrespotConnector {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DeviceConnector for LibrespotConnector {
    async fn connect(
        &self,
        token: &AccessToken,
        api: Arc<dyn WebApi>,
    ) -> Result<(Arc<dyn PlaybackDevice>, DeviceEvents)> {
        let (backend, events) = AudioBackend::connect(token, &self.config, api).await?;
        Ok((Arc::new(backend), events))
    }
}

#[derive(Clone)]
pub struct AppController {
    pub(crate) model: Arc<AppModel>,
    pub(crate) api: Arc<RwLock<Option<Arc<dyn WebApi>>>>,
    pub(crate) device: Arc<Mutex<Option<Arc<dyn PlaybackDevice>>>>,
    player_initialized: Arc<Mutex<bool>>,
    connector: Arc<dyn DeviceConnector>,
    login: Arc<dyn LoginFlow>,
    favorites: FavoriteStore,
    tokens: TokenStore,
    search_limit: u32,
}

impl AppController {
    pub fn new(
        model: Arc<AppModel>,
        config: &Config,
        connector: Arc<dyn DeviceConnector>,
        login: Arc<dyn LoginFlow>,
    ) -> Self {
        Self {
            model,
            api: Arc::new(RwLock::new(None)),
            device: Arc::new(Mutex::new(None)),
            player_initialized: Arc::new(Mutex::new(false)),
            connector,
            login,
            favorites: FavoriteStore::new(config.favorite_path()),
            tokens: TokenStore::new(config.token_path()),
            search_limit: config.search_limit,
        }
    }

    pub(crate) async fn web_api(&self) -> Option<Arc<dyn WebApi>> {
        self.api.read().await.clone()
    }

    pub(crate) async fn playback_device(&self) -> Option<Arc<dyn PlaybackDevice>> {
        self.device.lock().await.clone()
    }

    /// Shut the device down, if one was created.
    pub async fn shutdown(&self) {
        if let Some(device) = self.device.lock().await.take() {
            device.shutdown();
        }
    }

    pub(crate) fn format_error(error: &anyhow::Error) -> String {
        let error_str = error.to_string();

        if is_unauthorized(error) {
            "Session expired. Press Enter in the drawer to log in again.".to_string()
        } else if error_str.contains("403") {
            "Action forbidden. Playback requires Spotify Premium.".to_string()
        } else if error_str.contains("404") {
            "Playback device not found.".to_string()
        } else if error_str.contains("429") {
            "Rate limited. Please wait a moment.".to_string()
        } else {
            format!("Error: {}", error_str)
        }
    }

    /// Report a failed Web API call. A rejected token ends the session.
    pub(crate) async fn report_api_error(&self, error: &anyhow::Error) {
        if is_unauthorized(error) {
            self.end_session().await;
        }
        self.model.set_status(Self::format_error(error)).await;
    }
}

fn is_unauthorized(error: &anyhow::Error) -> bool {
    error.to_string().contains("401")
}
