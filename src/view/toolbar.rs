//! Top toolbar and the area behind the drawer

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph},
    Frame,
};

use crate::model::{PlaybackInfo, SessionInfo};

pub fn render_toolbar(frame: &mut Frame, area: Rect, session: &SessionInfo, playback: &PlaybackInfo) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Title + account
            Constraint::Length(32), // Device
        ])
        .split(area);

    let account = match (&session.user_name, session.logged_in) {
        (Some(name), _) => format!("Logged in as {}", name),
        (None, true) => "Logged in".to_string(),
        (None, false) => "Not logged in".to_string(),
    };

    let title = Paragraph::new(Line::from(vec![
        Span::styled("Music Drawer", Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(account, Style::default().fg(Color::Gray)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .padding(Padding::horizontal(1))
            .title_bottom(Line::from(" m: drawer  space: play/pause  q: quit ").right_aligned()),
    );
    frame.render_widget(title, chunks[0]);

    let (marker, color) = if playback.device_ready() {
        ("●", Color::Green)
    } else {
        ("○", Color::DarkGray)
    };
    let device = Paragraph::new(format!("{} {}", marker, playback.device_name))
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::ALL).title(" Device "));
    frame.render_widget(device, chunks[1]);
}

pub fn render_idle_area(frame: &mut Frame, area: Rect, playback: &PlaybackInfo) {
    let now_playing = match &playback.selected_song {
        Some(track) if playback.is_playing => format!("▶ {} - {}", track.name, track.artist_line()),
        Some(track) => format!("⏸ {} - {}", track.name, track.artist_line()),
        None => "Press m to open the music drawer".to_string(),
    };

    let idle = Paragraph::new(now_playing)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(idle, area);
}
