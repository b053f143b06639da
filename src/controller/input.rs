//! Key event handling

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::model::DrawerFocus;
use super::AppController;

impl AppController {
    pub async fn handle_key_event(&self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.model.set_should_quit(true).await;
            return Ok(());
        }

        self.expire_session_if_needed().await;

        // Toolbar: only the drawer toggle, play/pause and quit
        if !self.model.is_drawer_open().await {
            match key.code {
                KeyCode::Char('m') | KeyCode::Char('M') => self.model.toggle_drawer().await,
                KeyCode::Char(' ') => self.toggle_play_pause().await,
                KeyCode::Char('q') | KeyCode::Char('Q') => self.model.set_should_quit(true).await,
                _ => {}
            }
            return Ok(());
        }

        if !self.model.has_token().await {
            match key.code {
                KeyCode::Enter => self.begin_login().await,
                KeyCode::Esc | KeyCode::Char('m') | KeyCode::Char('M') => self.model.close_drawer().await,
                KeyCode::Char('q') | KeyCode::Char('Q') => self.model.set_should_quit(true).await,
                _ => {}
            }
            return Ok(());
        }

        let focus = self.model.focus().await;

        if key.code == KeyCode::Tab || key.code == KeyCode::BackTab {
            self.model.cycle_focus().await;
            return Ok(());
        }

        match focus {
            DrawerFocus::Search => self.handle_search_key(key).await,
            DrawerFocus::Results => self.handle_results_key(key).await,
            DrawerFocus::Detail => self.handle_detail_key(key).await,
        }

        Ok(())
    }

    async fn handle_search_key(&self, key: KeyEvent) {
        match key.code {
            // The search runs in the background; results land in the model
            KeyCode::Enter => {
                let _ = self.perform_search().await;
            }
            KeyCode::Esc => {
                if self.model.search_query().await.is_empty() {
                    self.model.close_drawer().await;
                } else {
                    self.model.clear_search().await;
                }
            }
            KeyCode::Backspace => self.model.backspace_search().await,
            KeyCode::Down => self.model.set_focus(DrawerFocus::Results).await,
            KeyCode::Char(c) => self.model.append_to_search(c).await,
            _ => {}
        }
    }

    async fn handle_results_key(&self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.model.move_result_up().await,
            KeyCode::Down => self.model.move_result_down().await,
            KeyCode::Enter => {
                if let Some(track) = self.model.highlighted_result().await {
                    self.select_song(track).await;
                }
            }
            KeyCode::Esc => self.model.set_focus(DrawerFocus::Search).await,
            _ => self.handle_common_key(key).await,
        }
    }

    async fn handle_detail_key(&self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Left => self.deselect_song().await,
            KeyCode::Char('a') | KeyCode::Char('A') => self.add_favorite().await,
            _ => self.handle_common_key(key).await,
        }
    }

    async fn handle_common_key(&self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(' ') => self.toggle_play_pause().await,
            KeyCode::Char('f') | KeyCode::Char('F') => self.play_favorite().await,
            KeyCode::Char('m') | KeyCode::Char('M') => self.model.close_drawer().await,
            KeyCode::Char('q') | KeyCode::Char('Q') => self.model.set_should_quit(true).await,
            _ => {}
        }
    }
}
