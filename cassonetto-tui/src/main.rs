//! Terminal UI for picking a Mantova Ambiente zone and watching its pickups.

mod app;
mod input;
mod ui;

use std::{env, io, path::PathBuf, sync::Arc, time::Duration as StdDuration};

use anyhow::{Context, Result};
use cassonetto_core::{client::AmbienteClient, ports::ScheduleSource};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use reqwest::Client;
use tracing::info;

use crate::app::App;
use crate::input::Action;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    // HTTP + API client setup
    let http = Client::builder().user_agent("cassonetto/0.1").build()?;
    let client = Arc::new(AmbienteClient::new(http));

    // The zone list drives the first setup step; without it there is nothing
    // to configure, so this failure is fatal (no cache fallback for zones).
    let zones = client
        .fetch_zones()
        .await
        .context("could not load the zone list from Mantova Ambiente")?;
    info!(count = zones.len(), "loaded zones");

    // App state
    let app = App::new(client, storage_dir(), zones);

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

async fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        // Draw current UI
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            let action = input::handle_key_event(key, &mut app);

            match action {
                Action::Quit => break,
                Action::None => {}
                Action::StartSchedule => {
                    let service = match app.confirm_setup() {
                        Ok(service) => service,
                        Err(message) => {
                            app.error_message = Some(message);
                            continue;
                        }
                    };

                    app.is_loading = true;
                    app.error_message = None;
                    terminal.draw(|frame| ui::draw(frame, &app))?;

                    let res = service.get_data(false).await;

                    app.is_loading = false;
                    match res {
                        Ok(dataset) => {
                            app.dataset = Some(dataset);
                        }
                        Err(err) => {
                            app.error_message = Some(format!("Failed to load schedule: {err}"));
                        }
                    }
                }
                Action::ForceRefresh => {
                    let Some(service) = app.service.as_ref().map(Arc::clone) else {
                        app.error_message = Some("Finish setup first".into());
                        continue;
                    };

                    app.is_loading = true;
                    app.error_message = None;
                    terminal.draw(|frame| ui::draw(frame, &app))?;

                    let res = service.get_data(true).await;

                    app.is_loading = false;
                    match res {
                        Ok(dataset) => {
                            app.dataset = Some(dataset);
                        }
                        Err(err) => {
                            app.error_message = Some(format!("Refresh failed: {err}"));
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

/// Per-user cache directory: `$XDG_CACHE_HOME/cassonetto` with a
/// `~/.cache/cassonetto` fallback.
fn storage_dir() -> PathBuf {
    env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("cassonetto")
}
