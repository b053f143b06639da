//! Utility functions for rendering UI components

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, List, ListItem, ListState},
    Frame,
};

pub fn render_scrollable_list(
    frame: &mut Frame,
    area: Rect,
    items: Vec<ListItem>,
    selected_index: usize,
    block: Block,
) {
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default()); // Highlight handled by item styles

    let mut list_state = ListState::default();
    list_state.select(Some(selected_index));

    frame.render_stateful_widget(list, area, &mut list_state);
}

pub fn truncate_string(s: &str, max_width: usize) -> String {
    if s.chars().count() > max_width {
        let truncated: String = s.chars().take(max_width.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}

/// Carve the drawer out of the right-hand side of `area`.
pub fn drawer_area(area: Rect, width_percent: u16) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(100 - width_percent),
            Constraint::Percentage(width_percent),
        ])
        .split(area);
    chunks[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_strings_are_truncated() {
        assert_eq!(truncate_string("Around the World", 10), "Around ...");
        assert_eq!(truncate_string("Da Funk", 10), "Da Funk");
    }

    #[test]
    fn drawer_is_anchored_right() {
        let area = Rect::new(0, 0, 100, 40);
        let drawer = drawer_area(area, 60);
        assert_eq!(drawer.width, 60);
        assert_eq!(drawer.x + drawer.width, 100);
        assert_eq!(drawer.height, 40);
    }
}
