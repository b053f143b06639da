//! Local playback device
//!
//! A librespot session registers a Spotify Connect device under the
//! configured name. Player events are reduced to the two notifications the
//! drawer cares about: the device became addressable, and its paused flag
//! changed.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use librespot::connect::{ConnectConfig, Spirc};
use librespot::core::authentication::Credentials;
use librespot::core::cache::Cache;
use librespot::core::config::SessionConfig;
use librespot::core::session::Session;
use librespot::playback::config::{AudioFormat, Bitrate, PlayerConfig};
use librespot::playback::mixer::{MixerConfig, NoOpVolume};
use librespot::playback::player::{Player, PlayerEvent};
use librespot::playback::{audio_backend, mixer};
use tokio::sync::mpsc;

use crate::auth::AccessToken;
use crate::config::Config;
use crate::error::DrawerError;
use crate::model::WebApi;

const READY_POLL_ATTEMPTS: usize = 20;
const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceState {
    pub paused: bool,
}

/// Push notifications from the playback device
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The device is visible to the Web API under this id.
    Ready { device_id: String },
    /// `None` when the device reports no playback state at all.
    StateChanged(Option<DeviceState>),
}

pub type DeviceEvents = mpsc::UnboundedReceiver<DeviceEvent>;

/// Controls issued directly through the device rather than the Web API.
#[async_trait]
pub trait PlaybackDevice: Send + Sync {
    async fn pause(&self) -> Result<()>;
    fn shutdown(&self);
}

pub struct AudioBackend {
    session: Session,
    spirc: Spirc,
    _player: Arc<Player>,
}

impl AudioBackend {
    pub async fn connect(
        token: &AccessToken,
        config: &Config,
        api: Arc<dyn WebApi>,
    ) -> Result<(Self, DeviceEvents)> {
        tracing::info!(device_name = %config.device_name, "Connecting librespot device");

        let session_config = SessionConfig {
            device_id: Self::device_id(&config.device_name),
            ..Default::default()
        };
        let player_config = PlayerConfig {
            bitrate: Bitrate::Bitrate320,
            ..Default::default()
        };
        let connect_config = ConnectConfig {
            name: config.device_name.clone(),
            initial_volume: (config.volume * u16::MAX as f32) as u16,
            ..Default::default()
        };
        let audio_format = AudioFormat::default();

        let sink_builder = audio_backend::find(None)
            .ok_or_else(|| DrawerError::DeviceUnavailable("no audio sink available".to_string()))?;
        let mixer_builder = mixer::find(None)
            .ok_or_else(|| DrawerError::DeviceUnavailable("no mixer available".to_string()))?;

        let cache = Cache::new(None, None, Some(config.librespot_cache_dir()), None)?;
        let session = Session::new(session_config, Some(cache));
        let mixer = mixer_builder(MixerConfig::default())?;

        let player = Player::new(
            player_config,
            session.clone(),
            Box::new(NoOpVolume),
            move || sink_builder(None, audio_format),
        );

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self::forward_player_events(&player, events_tx.clone());

        let credentials = Credentials::with_access_token(token.value.clone());
        let (spirc, spirc_task) = Spirc::new(
            connect_config,
            session.clone(),
            credentials,
            player.clone(),
            mixer,
        )
        .await?;

        spirc.activate()?;

        tokio::spawn(async move {
            let _ = spirc_task.await;
            tracing::debug!("Spirc task finished");
        });

        Self::announce_when_ready(config.device_name.clone(), api, events_tx);

        Ok((
            Self {
                session,
                spirc,
                _player: player,
            },
            events_rx,
        ))
    }

    fn device_id(device_name: &str) -> String {
        // Stable per machine so the Web API keeps seeing the same device
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        format!("{}-{}", device_name.replace(' ', "-"), hostname)
    }

    fn forward_player_events(player: &Arc<Player>, events_tx: mpsc::UnboundedSender<DeviceEvent>) {
        let mut channel = player.get_player_event_channel();
        tokio::spawn(async move {
            while let Some(event) = channel.recv().await {
                if let Some(mapped) = map_player_event(&event) {
                    if events_tx.send(mapped).is_err() {
                        tracing::debug!("Device event receiver dropped, stopping forwarder");
                        break;
                    }
                }
            }
        });
    }

    /// Emit `Ready` once the Web API lists a device with our name.
    fn announce_when_ready(
        device_name: String,
        api: Arc<dyn WebApi>,
        events_tx: mpsc::UnboundedSender<DeviceEvent>,
    ) {
        tokio::spawn(async move {
            match wait_for_device(api.as_ref(), &device_name, READY_POLL_ATTEMPTS, READY_POLL_INTERVAL).await {
                Some(device_id) => {
                    tracing::info!(device_name = %device_name, device_id = %device_id, "Playback device is ready");
                    let _ = events_tx.send(DeviceEvent::Ready { device_id });
                }
                None => tracing::warn!(device_name = %device_name, "Playback device never appeared in the device list"),
            }
        });
    }
}

#[async_trait]
impl PlaybackDevice for AudioBackend {
    async fn pause(&self) -> Result<()> {
        tracing::debug!("Device: pause");
        self.spirc
            .pause()
            .map_err(|e| anyhow!(DrawerError::DeviceUnavailable(e.to_string())))
    }

    fn shutdown(&self) {
        if let Err(e) = self.spirc.shutdown() {
            tracing::warn!(error = %e, "Spirc shutdown failed");
        }
        self.session.shutdown();
    }
}

fn map_player_event(event: &PlayerEvent) -> Option<DeviceEvent> {
    match event {
        PlayerEvent::Playing { .. } => Some(DeviceEvent::StateChanged(Some(DeviceState { paused: false }))),
        PlayerEvent::Paused { .. } | PlayerEvent::EndOfTrack { .. } => {
            Some(DeviceEvent::StateChanged(Some(DeviceState { paused: true })))
        }
        PlayerEvent::Stopped { .. } => Some(DeviceEvent::StateChanged(None)),
        _ => None,
    }
}

/// Poll the device list until `device_name` shows up with an id.
pub async fn wait_for_device(
    api: &dyn WebApi,
    device_name: &str,
    attempts: usize,
    interval: Duration,
) -> Option<String> {
    for attempt in 0..attempts {
        match api.available_devices().await {
            Ok(devices) => {
                if let Some(device) = devices.into_iter().find(|d| d.name == device_name && !d.id.is_empty()) {
                    return Some(device.id);
                }
            }
            Err(e) => tracing::debug!(attempt, error = %e, "Device list unavailable"),
        }
        tokio::time::sleep(interval).await;
    }
    None
}
