//! Main application model with state management

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use crate::auth::AccessToken;
use super::playback::PlaybackInfo;
use super::types::{DrawerFocus, SessionInfo, StatusMessage, Track, UiState};

const STATUS_TTL: Duration = Duration::from_secs(5);

/// Main application model containing all state
pub struct AppModel {
    token: Arc<RwLock<Option<AccessToken>>>,
    session: Arc<Mutex<SessionInfo>>,
    playback: Arc<Mutex<PlaybackInfo>>,
    ui_state: Arc<Mutex<UiState>>,
    should_quit: Arc<Mutex<bool>>,
}

impl AppModel {
    pub fn new(authorize_url: String, device_name: String) -> Self {
        Self {
            token: Arc::new(RwLock::new(None)),
            session: Arc::new(Mutex::new(SessionInfo {
                authorize_url,
                ..Default::default()
            })),
            playback: Arc::new(Mutex::new(PlaybackInfo {
                device_name,
                ..Default::default()
            })),
            ui_state: Arc::new(Mutex::new(UiState::default())),
            should_quit: Arc::new(Mutex::new(false)),
        }
    }

    // ========================================================================
    // Session
    // ========================================================================

    pub async fn set_token(&self, token: AccessToken) {
        *self.token.write().await = Some(token);
        self.session.lock().await.logged_in = true;
    }

    /// Forget the token so the drawer shows the login prompt again.
    pub async fn clear_token(&self) {
        *self.token.write().await = None;
        let mut session = self.session.lock().await;
        session.logged_in = false;
        session.user_name = None;
    }

    pub async fn token(&self) -> Option<AccessToken> {
        self.token.read().await.clone()
    }

    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    pub async fn set_user_name(&self, name: String) {
        self.session.lock().await.user_name = Some(name);
    }

    pub async fn set_login_in_progress(&self, in_progress: bool) {
        self.session.lock().await.login_in_progress = in_progress;
    }

    pub async fn get_session_info(&self) -> SessionInfo {
        self.session.lock().await.clone()
    }

    // ========================================================================
    // Drawer & focus
    // ========================================================================

    pub async fn toggle_drawer(&self) {
        let mut state = self.ui_state.lock().await;
        state.drawer_open = !state.drawer_open;
    }

    pub async fn close_drawer(&self) {
        self.ui_state.lock().await.drawer_open = false;
    }

    pub async fn is_drawer_open(&self) -> bool {
        self.ui_state.lock().await.drawer_open
    }

    pub async fn focus(&self) -> DrawerFocus {
        self.ui_state.lock().await.focus
    }

    pub async fn set_focus(&self, focus: DrawerFocus) {
        self.ui_state.lock().await.focus = focus;
    }

    pub async fn cycle_focus(&self) {
        let has_selection = self.playback.lock().await.selected_song.is_some();
        let mut state = self.ui_state.lock().await;
        state.focus = state.focus.next(has_selection);
    }

    // ========================================================================
    // Search
    // ========================================================================

    pub async fn search_query(&self) -> String {
        self.ui_state.lock().await.search_query.clone()
    }

    pub async fn append_to_search(&self, c: char) {
        self.ui_state.lock().await.search_query.push(c);
    }

    pub async fn backspace_search(&self) {
        self.ui_state.lock().await.search_query.pop();
    }

    pub async fn clear_search(&self) {
        self.ui_state.lock().await.search_query.clear();
    }

    pub async fn set_loading(&self, loading: bool) {
        self.ui_state.lock().await.loading = loading;
    }

    pub async fn is_loading(&self) -> bool {
        self.ui_state.lock().await.loading
    }

    pub async fn set_songs(&self, songs: Vec<Track>) {
        let mut state = self.ui_state.lock().await;
        state.songs = songs;
        state.result_selected = 0;
    }

    pub async fn songs(&self) -> Vec<Track> {
        self.ui_state.lock().await.songs.clone()
    }

    pub async fn move_result_up(&self) {
        let mut state = self.ui_state.lock().await;
        state.result_selected = state.result_selected.saturating_sub(1);
    }

    pub async fn move_result_down(&self) {
        let mut state = self.ui_state.lock().await;
        if state.result_selected + 1 < state.songs.len() {
            state.result_selected += 1;
        }
    }

    pub async fn highlighted_result(&self) -> Option<Track> {
        let state = self.ui_state.lock().await;
        state.songs.get(state.result_selected).cloned()
    }

    // ========================================================================
    // Playback
    // ========================================================================

    pub async fn select_song(&self, track: Track) {
        self.playback.lock().await.selected_song = Some(track);
    }

    pub async fn clear_selection(&self) {
        self.playback.lock().await.selected_song = None;
        let mut state = self.ui_state.lock().await;
        if state.focus == DrawerFocus::Detail {
            state.focus = DrawerFocus::Results;
        }
    }

    pub async fn selected_song(&self) -> Option<Track> {
        self.playback.lock().await.selected_song.clone()
    }

    pub async fn set_playing(&self, is_playing: bool) {
        self.playback.lock().await.is_playing = is_playing;
    }

    pub async fn is_playing(&self) -> bool {
        self.playback.lock().await.is_playing
    }

    pub async fn set_device_id(&self, device_id: String) {
        self.playback.lock().await.device_id = Some(device_id);
    }

    pub async fn device_id(&self) -> Option<String> {
        self.playback.lock().await.device_id.clone()
    }

    pub async fn set_favorite(&self, track: Option<Track>) {
        self.playback.lock().await.favorite = track;
    }

    pub async fn favorite(&self) -> Option<Track> {
        self.playback.lock().await.favorite.clone()
    }

    pub async fn get_playback_info(&self) -> PlaybackInfo {
        self.playback.lock().await.clone()
    }

    // ========================================================================
    // Status line
    // ========================================================================

    pub async fn set_status(&self, text: impl Into<String>) {
        self.ui_state.lock().await.status = Some(StatusMessage::new(text));
    }

    pub async fn clear_status(&self) {
        self.ui_state.lock().await.status = None;
    }

    pub async fn auto_clear_old_status(&self) {
        let mut state = self.ui_state.lock().await;
        if state.status.as_ref().is_some_and(|s| s.since.elapsed() >= STATUS_TTL) {
            state.status = None;
        }
    }

    pub async fn get_ui_state(&self) -> UiState {
        self.ui_state.lock().await.clone()
    }

    pub async fn should_quit(&self) -> bool {
        *self.should_quit.lock().await
    }

    pub async fn set_should_quit(&self, quit: bool) {
        *self.should_quit.lock().await = quit;
    }
}
