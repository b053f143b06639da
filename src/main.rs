mod audio;
mod auth;
mod config;
mod controller;
mod error;
mod logging;
mod model;
mod view;

use std::io;
use std::sync::Arc;
use std::time::Duration;
use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use auth::AuthConfig;
use config::Config;
use controller::{AppController, BrowserLogin, LibrespotConnector};
use model::AppModel;
use view::AppView;

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = match logging::init_logging() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {}", e);
            None
        }
    };

    tracing::info!("=== Music Drawer Starting ===");

    let config = Config::load()?;
    tracing::debug!(
        redirect_uri = %config.redirect_uri,
        cache_dir = %config.cache_dir.display(),
        device_name = %config.device_name,
        "Configuration loaded"
    );

    let auth_config = AuthConfig::from_config(&config);
    let authorize_url = auth::authorize_url(&auth_config);
    let model = Arc::new(AppModel::new(authorize_url.to_string(), config.device_name.clone()));

    let connector = Arc::new(LibrespotConnector::new(config.clone()));
    let login = Arc::new(BrowserLogin::new(auth_config));
    let controller = AppController::new(model.clone(), &config, connector, login);

    controller.load_favorite().await;

    // A saved token skips the login prompt
    let controller_for_restore = controller.clone();
    tokio::spawn(async move {
        controller_for_restore.restore_session().await;
    });

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, model, controller.clone()).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    controller.shutdown().await;
    tracing::info!("Music Drawer shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    model: Arc<AppModel>,
    controller: AppController,
) -> io::Result<()> {
    loop {
        model.auto_clear_old_status().await;
        controller.expire_session_if_needed().await;

        let ui_state = model.get_ui_state().await;
        let playback = model.get_playback_info().await;
        let session = model.get_session_info().await;

        terminal.draw(|f| {
            AppView::render(f, &ui_state, &playback, &session);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Err(e) = controller.handle_key_event(key).await {
                    tracing::warn!(error = %e, "Key handling failed");
                }
            }
        }

        if model.should_quit().await {
            break;
        }
    }

    Ok(())
}
