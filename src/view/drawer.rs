//! The music drawer: login prompt, search, results and song detail

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, ListItem, Padding, Paragraph, Wrap},
    Frame,
};

use crate::model::{DrawerFocus, PlaybackInfo, SessionInfo, Track, UiState};
use super::utils::{drawer_area, render_scrollable_list, truncate_string};

const DRAWER_WIDTH_PERCENT: u16 = 60;

fn border_style(is_focused: bool) -> Style {
    if is_focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    }
}

pub fn render_drawer(
    frame: &mut Frame,
    area: Rect,
    ui_state: &UiState,
    playback: &PlaybackInfo,
    session: &SessionInfo,
) {
    let area = drawer_area(area, DRAWER_WIDTH_PERCENT);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Music Drawer ")
        .title_bottom(Line::from(" esc: close ").right_aligned())
        .border_style(Style::default().fg(Color::Magenta));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if !session.logged_in {
        render_login_prompt(frame, inner, session);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Search / results / detail
            Constraint::Length(3), // Favorite
            Constraint::Length(1), // Status line
        ])
        .split(inner);

    match &playback.selected_song {
        Some(track) if ui_state.focus == DrawerFocus::Detail => {
            render_detail(frame, chunks[0], track, playback);
        }
        _ => render_search(frame, chunks[0], ui_state, playback),
    }

    render_favorite(frame, chunks[1], playback);

    if let Some(status) = &ui_state.status {
        let status = Paragraph::new(status.text.as_str()).style(Style::default().fg(Color::Yellow));
        frame.render_widget(status, chunks[2]);
    }
}

fn render_login_prompt(frame: &mut Frame, area: Rect, session: &SessionInfo) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Connect your Spotify account to search and play music.",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    if session.login_in_progress {
        lines.push(Line::from(Span::styled(
            "Waiting for the browser to finish the login...",
            Style::default().fg(Color::Yellow),
        )));
        lines.push(Line::from(""));
        lines.push(Line::from("If no browser opened, visit:"));
        lines.push(Line::from(Span::styled(
            session.authorize_url.as_str(),
            Style::default().fg(Color::Cyan),
        )));
    } else {
        lines.push(Line::from(vec![
            Span::styled("[Enter]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" Login with Spotify"),
        ]));
    }

    let prompt = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().padding(Padding::uniform(1)));
    frame.render_widget(prompt, area);
}

fn render_search(frame: &mut Frame, area: Rect, ui_state: &UiState, playback: &PlaybackInfo) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search box
            Constraint::Min(0),    // Results
        ])
        .split(area);

    let search_focused = ui_state.focus == DrawerFocus::Search;
    let cursor = if search_focused { "█" } else { "" };
    let search = Paragraph::new(format!("{}{}", ui_state.search_query, cursor))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Search songs ")
                .padding(Padding::horizontal(1))
                .border_style(border_style(search_focused)),
        );
    frame.render_widget(search, chunks[0]);

    let results_focused = ui_state.focus == DrawerFocus::Results;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Results ")
        .padding(Padding::horizontal(1))
        .border_style(border_style(results_focused));

    if ui_state.loading {
        let loading = Paragraph::new("Searching...")
            .style(Style::default().fg(Color::Yellow))
            .block(block);
        frame.render_widget(loading, chunks[1]);
        return;
    }

    if ui_state.songs.is_empty() {
        let hint = if ui_state.search_query.trim().is_empty() {
            "Type a song or artist and press Enter"
        } else {
            "No results"
        };
        let empty = Paragraph::new(hint)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, chunks[1]);
        return;
    }

    let width = chunks[1].width.saturating_sub(6) as usize;
    let playing_uri = playback
        .selected_song
        .as_ref()
        .filter(|_| playback.is_playing)
        .map(|t| t.uri.as_str());

    let items: Vec<ListItem> = ui_state
        .songs
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let is_selected = results_focused && i == ui_state.result_selected;
            let is_playing = playing_uri == Some(track.uri.as_str());
            result_item(track, is_selected, is_playing, width)
        })
        .collect();

    render_scrollable_list(frame, chunks[1], items, ui_state.result_selected, block);
}

fn result_item(track: &Track, is_selected: bool, is_playing: bool, width: usize) -> ListItem<'static> {
    let name_style = if is_selected {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else if is_playing {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let prefix = if is_playing { "▶ " } else { "  " };

    ListItem::new(vec![
        Line::from(vec![
            Span::raw(prefix),
            Span::styled(truncate_string(&track.name, width.saturating_sub(2)), name_style),
        ]),
        Line::from(Span::styled(
            format!("  {}", truncate_string(&track.artist_line(), width.saturating_sub(2))),
            Style::default().fg(Color::Gray),
        )),
    ])
}

fn render_detail(frame: &mut Frame, area: Rect, track: &Track, playback: &PlaybackInfo) {
    let (state, state_color) = if playback.is_playing {
        ("▶ Playing", Color::Green)
    } else {
        ("⏸ Paused", Color::Yellow)
    };

    let mut lines = vec![
        Line::from(Span::styled(
            track.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(track.artist_line(), Style::default().fg(Color::Gray))),
        Line::from(""),
    ];
    if let Some(art) = &track.album_art_url {
        lines.push(Line::from(vec![
            Span::styled("Album art: ", Style::default().fg(Color::DarkGray)),
            Span::raw(art.clone()),
        ]));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(state, Style::default().fg(state_color))));
    if playback.selected_is_favorite() {
        lines.push(Line::from(Span::styled("★ Favorite", Style::default().fg(Color::Magenta))));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(
        "[Space] Play/Pause  [a] Add to favorite  [Esc] Back",
    ));

    let detail = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Now selected ")
                .padding(Padding::horizontal(1))
                .border_style(border_style(true)),
        );
    frame.render_widget(detail, area);
}

fn render_favorite(frame: &mut Frame, area: Rect, playback: &PlaybackInfo) {
    let line = match &playback.favorite {
        Some(track) => Line::from(vec![
            Span::styled("★ ", Style::default().fg(Color::Magenta)),
            Span::styled(track.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!(" - {}", track.artist_line())),
            Span::styled("  [f] play", Style::default().fg(Color::DarkGray)),
        ]),
        None => Line::from(Span::styled(
            "No favorite yet. Select a song and press a.",
            Style::default().fg(Color::DarkGray),
        )),
    };

    let favorite = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Favorite ")
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(favorite, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::track;
    use ratatui::{backend::TestBackend, Terminal};

    fn rendered(ui_state: &UiState, playback: &PlaybackInfo, session: &SessionInfo) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal
            .draw(|frame| render_drawer(frame, frame.area(), ui_state, playback, session))
            .unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn logged_in() -> SessionInfo {
        SessionInfo {
            logged_in: true,
            ..Default::default()
        }
    }

    #[test]
    fn login_prompt_without_token() {
        let screen = rendered(&UiState::default(), &PlaybackInfo::default(), &SessionInfo::default());
        assert!(screen.contains("Login with Spotify"));
        assert!(!screen.contains("Search songs"));
    }

    #[test]
    fn results_show_name_and_artists() {
        let ui_state = UiState {
            drawer_open: true,
            focus: DrawerFocus::Results,
            songs: vec![track("1", "Get Lucky")],
            ..Default::default()
        };
        let screen = rendered(&ui_state, &PlaybackInfo::default(), &logged_in());
        assert!(screen.contains("Get Lucky"));
        assert!(screen.contains("Daft Punk, Pharrell Williams"));
    }

    #[test]
    fn pending_search_shows_searching() {
        let ui_state = UiState {
            drawer_open: true,
            search_query: "get lucky".to_string(),
            songs: vec![track("1", "Old result")],
            loading: true,
            ..Default::default()
        };
        let screen = rendered(&ui_state, &PlaybackInfo::default(), &logged_in());
        assert!(screen.contains("Searching..."));
        assert!(!screen.contains("Old result"));
    }

    #[test]
    fn detail_shows_playback_state() {
        let ui_state = UiState {
            drawer_open: true,
            focus: DrawerFocus::Detail,
            ..Default::default()
        };
        let playback = PlaybackInfo {
            selected_song: Some(track("1", "Get Lucky")),
            is_playing: false,
            ..Default::default()
        };
        let screen = rendered(&ui_state, &playback, &logged_in());
        assert!(screen.contains("Get Lucky"));
        assert!(screen.contains("Paused"));
    }
}
