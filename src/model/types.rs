//! Core type definitions for the drawer

use std::time::Instant;
use rspotify::model::FullTrack;
use rspotify::prelude::Id;
use serde::{Deserialize, Serialize};

/// A track as returned by catalog search
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album_art_url: Option<String>,
    pub uri: String,
}

impl Track {
    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}

impl Track {
    /// `None` for tracks without a catalog id, such as local files.
    pub fn from_full(track: FullTrack) -> Option<Self> {
        let id = track.id.as_ref()?.id().to_string();
        Some(Self {
            uri: format!("spotify:track:{}", id),
            id,
            name: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            album_art_url: track.album.images.into_iter().next().map(|image| image.url),
        })
    }

    /// Only catalog tracks can be started through the Web API.
    pub fn is_playable(&self) -> bool {
        !self.id.is_empty()
    }
}

/// A Spotify Connect device as listed by the Web API
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: String,
    pub name: String,
}

/// Which part of the drawer receives key input
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DrawerFocus {
    #[default]
    Search,
    Results,
    Detail,
}

impl DrawerFocus {
    /// Detail is only reachable while a song is selected.
    pub fn next(self, has_selection: bool) -> Self {
        match self {
            Self::Search => Self::Results,
            Self::Results if has_selection => Self::Detail,
            Self::Results | Self::Detail => Self::Search,
        }
    }
}

/// Transient, non-blocking message shown at the bottom of the drawer
#[derive(Clone, Debug)]
pub struct StatusMessage {
    pub text: String,
    pub since: Instant,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            since: Instant::now(),
        }
    }
}

/// Drawer UI state
#[derive(Clone, Debug, Default)]
pub struct UiState {
    pub drawer_open: bool,
    pub focus: DrawerFocus,
    pub search_query: String,
    pub songs: Vec<Track>,
    pub loading: bool,
    pub result_selected: usize,
    pub status: Option<StatusMessage>,
}

/// Login/session information shown by the toolbar and the drawer
#[derive(Clone, Debug, Default)]
pub struct SessionInfo {
    pub logged_in: bool,
    pub login_in_progress: bool,
    pub user_name: Option<String>,
    pub authorize_url: String,
}
