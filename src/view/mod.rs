//! View module - UI rendering
//!
//! This module handles all UI rendering for the application using ratatui.
//! It is organized into submodules by component type:
//!
//! - `utils`: Shared utility functions (truncation, scrollable lists, drawer placement)
//! - `toolbar`: Top bar and the idle area behind the drawer
//! - `drawer`: The music drawer (login, search, results, detail, favorite)

mod utils;
mod toolbar;
mod drawer;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::model::{PlaybackInfo, SessionInfo, UiState};

pub struct AppView;

impl AppView {
    pub fn render(frame: &mut Frame, ui_state: &UiState, playback: &PlaybackInfo, session: &SessionInfo) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Toolbar
                Constraint::Min(0),    // Idle area, drawer slides over it
            ])
            .split(frame.area());

        toolbar::render_toolbar(frame, chunks[0], session, playback);
        toolbar::render_idle_area(frame, chunks[1], playback);

        if ui_state.drawer_open {
            drawer::render_drawer(frame, chunks[1], ui_state, playback, session);
        }
    }
}
