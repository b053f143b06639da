//! Playback control and the favorite

use crate::model::{DrawerFocus, Track};
use super::AppController;

impl AppController {
    /// Show `track` in the detail panel and start it.
    pub async fn select_song(&self, track: Track) {
        tracing::debug!(track_id = %track.id, name = %track.name, "Selecting song");
        self.model.select_song(track.clone()).await;
        self.model.set_focus(DrawerFocus::Detail).await;
        self.play_song(&track).await;
    }

    pub async fn play_song(&self, track: &Track) {
        if !track.is_playable() {
            tracing::warn!(name = %track.name, "Track has no catalog id, play ignored");
            self.model.set_status(format!("\"{}\" cannot be played", track.name)).await;
            return;
        }
        if self.playback_device().await.is_none() {
            tracing::debug!("No playback device yet, play ignored");
            return;
        }
        let Some(api) = self.web_api().await else {
            return;
        };

        let device_id = self.model.device_id().await;
        match api.start_playback(&track.uri, device_id.as_deref()).await {
            Ok(()) => {
                tracing::info!(uri = %track.uri, "Playback started");
                self.model.set_playing(true).await;
            }
            Err(e) => {
                tracing::error!(uri = %track.uri, error = %e, "Error playing song");
                self.report_api_error(&e).await;
            }
        }
    }

    pub async fn pause_song(&self) {
        let Some(device) = self.playback_device().await else {
            return;
        };

        match device.pause().await {
            Ok(()) => self.model.set_playing(false).await,
            Err(e) => {
                tracing::error!(error = %e, "Error pausing song");
                self.model.set_status(Self::format_error(&e)).await;
            }
        }
    }

    pub async fn toggle_play_pause(&self) {
        if self.model.is_playing().await {
            self.pause_song().await;
        } else if let Some(track) = self.model.selected_song().await {
            self.play_song(&track).await;
        }
    }

    /// Leave the detail panel: drop the selection and pause.
    pub async fn deselect_song(&self) {
        self.model.clear_selection().await;
        self.pause_song().await;
    }

    /// Persist the selected song as the favorite, replacing any previous one.
    pub async fn add_favorite(&self) {
        let Some(track) = self.model.selected_song().await else {
            return;
        };

        match self.favorites.save(&track) {
            Ok(()) => {
                self.model.set_status(format!("Saved \"{}\" as favorite", track.name)).await;
                self.model.set_favorite(Some(track)).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Could not save favorite");
                self.model.set_status(format!("Could not save favorite: {}", e)).await;
            }
        }
    }

    pub async fn play_favorite(&self) {
        if let Some(track) = self.model.favorite().await {
            self.select_song(track).await;
        }
    }

    /// Read the stored favorite into the model. Called once at startup.
    pub async fn load_favorite(&self) {
        let favorite = self.favorites.load();
        if let Some(track) = &favorite {
            tracing::debug!(track_id = %track.id, "Loaded favorite");
        }
        self.model.set_favorite(favorite).await;
    }
}
