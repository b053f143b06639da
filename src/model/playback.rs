//! Playback state mirrored from the device

use super::types::Track;

/// Everything the drawer knows about playback.
///
/// `is_playing` is the only transport state tracked; position and volume
/// stay on the device.
#[derive(Clone, Debug, Default)]
pub struct PlaybackInfo {
    pub selected_song: Option<Track>,
    pub is_playing: bool,
    pub device_id: Option<String>,
    pub device_name: String,
    pub favorite: Option<Track>,
}

impl PlaybackInfo {
    pub fn device_ready(&self) -> bool {
        self.device_id.is_some()
    }

    pub fn selected_is_favorite(&self) -> bool {
        match (&self.selected_song, &self.favorite) {
            (Some(selected), Some(favorite)) => selected.id == favorite.id,
            _ => false,
        }
    }
}
