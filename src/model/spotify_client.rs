//! Spotify Web API access

use std::sync::Arc;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rspotify::{
    model::{PlayableId, SearchResult, SearchType, TrackId},
    prelude::*,
    AuthCodeSpotify, Config,
};

use crate::auth::AccessToken;
use crate::{log_api_request, log_api_result};
use super::types::{DeviceInfo, Track};

/// The REST calls the drawer makes. All of them are bearer-token authenticated.
#[async_trait]
pub trait WebApi: Send + Sync {
    async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<Track>>;

    /// Make `device_id` the active device, optionally starting playback there.
    async fn transfer_playback(&self, device_id: &str, play: bool) -> Result<()>;

    async fn start_playback(&self, track_uri: &str, device_id: Option<&str>) -> Result<()>;

    async fn available_devices(&self) -> Result<Vec<DeviceInfo>>;

    /// Display name (or id) of the token's owner.
    async fn current_user(&self) -> Result<String>;
}

/// rspotify client running on an implicit-grant token
#[derive(Clone)]
pub struct SpotifyClient {
    client: Arc<AuthCodeSpotify>,
}

impl SpotifyClient {
    pub async fn with_token(token: &AccessToken) -> Result<Self> {
        // The token comes from the implicit grant: nothing to cache, nothing to refresh.
        let spotify = AuthCodeSpotify::with_config(
            Default::default(),
            Default::default(),
            Config {
                token_cached: false,
                token_refreshing: false,
                ..Default::default()
            },
        );

        *spotify
            .token
            .lock()
            .await
            .map_err(|_| anyhow!("rspotify token lock is poisoned"))? = Some(token.to_rspotify_token());
        tracing::debug!("rspotify client initialized with implicit grant token");

        Ok(Self {
            client: Arc::new(spotify),
        })
    }
}

#[async_trait]
impl WebApi for SpotifyClient {
    async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<Track>> {
        log_api_request!("search", query, limit);
        let result = self
            .client
            .search(query, SearchType::Track, None, None, Some(limit), None)
            .await;
        log_api_result!("search", result);

        match result? {
            SearchResult::Tracks(page) => Ok(page.items.into_iter().filter_map(Track::from_full).collect()),
            _ => Err(anyhow!("search returned a non-track result page")),
        }
    }

    async fn transfer_playback(&self, device_id: &str, play: bool) -> Result<()> {
        log_api_request!("transfer_playback", device_id, play);
        let result = self.client.transfer_playback(device_id, Some(play)).await;
        log_api_result!("transfer_playback", result);
        Ok(result?)
    }

    async fn start_playback(&self, track_uri: &str, device_id: Option<&str>) -> Result<()> {
        log_api_request!("start_playback", track_uri, device_id = ?device_id);

        // Extract track ID from URI (format: spotify:track:ID)
        let track_id = track_uri.rsplit(':').next().unwrap_or(track_uri);
        let id = TrackId::from_id(track_id)?;

        let result = self
            .client
            .start_uris_playback([PlayableId::Track(id)], device_id, None, None)
            .await;
        log_api_result!("start_playback", result);
        Ok(result?)
    }

    async fn available_devices(&self) -> Result<Vec<DeviceInfo>> {
        let devices = self.client.device().await?;
        let devices: Vec<DeviceInfo> = devices
            .into_iter()
            .map(|d| DeviceInfo {
                id: d.id.unwrap_or_default(),
                name: d.name,
            })
            .collect();
        tracing::trace!(count = devices.len(), "Listed devices");
        Ok(devices)
    }

    async fn current_user(&self) -> Result<String> {
        let user = self.client.me().await?;
        Ok(user.display_name.unwrap_or_else(|| user.id.id().to_string()))
    }
}
