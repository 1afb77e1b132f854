//! Terminal dashboard for binwatch: residents watch their bin and reward points, authorities
//! watch the bins of their residents and accept pickup requests.

mod app;
mod client;
mod input;
mod ui;

use std::{env, io, time::Duration as StdDuration};

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use reqwest::Client;

use crate::app::{App, Screen};
use crate::client::ApiClient;
use crate::input::Action;

const DEFAULT_URL: &str = "http://localhost:5000";

#[tokio::main]
async fn main() -> Result<()> {
    // HTTP client setup
    let base_url = env::var("BINWATCH_URL").unwrap_or_else(|_| DEFAULT_URL.to_owned());
    let http = Client::builder().user_agent("binwatch-tui/0.1").build()?;
    let app = App::new(ApiClient::new(http, &base_url));

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
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            let action = input::handle_key_event(key, &mut app);
            if action == Action::Quit {
                break;
            }
            if action == Action::None {
                continue;
            }

            app.is_loading = true;
            app.error_message = None;
            app.info_message = None;
            terminal.draw(|frame| ui::draw(frame, &app))?;

            let res = perform(&mut app, action).await;

            app.is_loading = false;
            if let Err(err) = res {
                app.error_message = Some(format!("{err}"));
            }
        }
    }

    Ok(())
}

async fn perform(app: &mut App, action: Action) -> Result<()> {
    match action {
        Action::None | Action::Quit => {}
        Action::Login => {
            let email = app.email_input.trim().to_owned();
            if email.is_empty() || app.password_input.is_empty() {
                app.error_message = Some("Enter e-mail and password".into());
                return Ok(());
            }
            let password = app.password_input.clone();
            let auth = app.client.login(&email, &password).await?;
            app.logged_in(&auth);
            app.info_message = Some(auth.message);
            load_home(app).await?;
        }
        Action::Refresh => load_home(app).await?,
        Action::RecalculateRewards => {
            let points = app.client.calculate_rewards().await?;
            if let Some(dashboard) = app.dashboard.as_mut() {
                dashboard.rewards = points.points;
            }
            app.info_message = Some(format!(
                "Rewards recalculated: {} points",
                points.points.total_points
            ));
        }
        Action::ShowPickups => {
            app.pickups = app.client.pickup_requests().await?;
            app.pickup_list_index = app
                .pickup_list_index
                .min(app.pickups.len().saturating_sub(1));
            app.screen = Screen::Pickups;
        }
        Action::AcceptPickup => {
            let index = app.pickup_list_index;
            let Some(view) = app.selected_pickup() else {
                app.error_message = Some("No pickup request selected".into());
                return Ok(());
            };
            let id = view.request.id;
            let response = app.client.accept_pickup(id).await?;
            app.mark_accepted(index);
            app.info_message = Some(response.message);
        }
    }
    Ok(())
}

/// Load the data for the home screen of the logged-in role.
async fn load_home(app: &mut App) -> Result<()> {
    match app.screen {
        Screen::Resident => {
            app.dashboard = Some(app.client.dashboard().await?);
        }
        Screen::Overview | Screen::Pickups => {
            let overview = app.client.overview().await?;
            app.house_list_index = app
                .house_list_index
                .min(overview.houses.len().saturating_sub(1));
            app.overview = Some(overview);
        }
        Screen::Login => {}
    }
    Ok(())
}
