//! Model module - Application state and data types
//!
//! - `types`: track record, drawer UI state, session info
//! - `playback`: playback state mirrored from the device
//! - `favorite`: the single persisted favorite
//! - `spotify_client`: Web API trait and its rspotify implementation
//! - `app_model`: main application model with state management methods

mod types;
mod playback;
mod favorite;
mod spotify_client;
mod app_model;

pub use types::{DeviceInfo, DrawerFocus, SessionInfo, StatusMessage, Track, UiState};
pub use playback::PlaybackInfo;
pub use favorite::FavoriteStore;
pub use spotify_client::{SpotifyClient, WebApi};
pub use app_model::AppModel;

#[cfg(test)]
pub(crate) mod fixtures {
    use super::Track;

    pub fn track(id: &str, name: &str) -> Track {
        Track {
            id: id.to_string(),
            name: name.to_string(),
            artists: vec!["Daft Punk".to_string(), "Pharrell Williams".to_string()],
            album_art_url: Some(format!("https://i.scdn.co/image/{}", id)),
            uri: format!("spotify:track:{}", id),
        }
    }
}
