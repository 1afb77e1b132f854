use binwatch_core::classify::{ClassificationResult, Tier};
use binwatch_core::{PickupStatus, WasteKind};
use chrono::{DateTime, Local, Utc};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
};

use crate::app::{App, LoginField, Screen};

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    let title = match &app.user_name {
        Some(name) => format!("binwatch · {name} ({})", app.role),
        None => "binwatch · waste bin monitoring".to_owned(),
    };
    let header =
        Paragraph::new(title).block(Block::default().borders(Borders::ALL).title("Binwatch"));
    frame.render_widget(header, *header_area);

    match app.screen {
        Screen::Login => draw_login(frame, app, *content_area),
        Screen::Resident => draw_resident(frame, app, *content_area),
        Screen::Overview => draw_overview(frame, app, *content_area),
        Screen::Pickups => draw_pickups(frame, app, *content_area),
    }

    // Status bar
    let nav_hint = match app.screen {
        Screen::Login => "Type to edit · Tab switch field · Enter log in · Esc/Ctrl-C quit",
        Screen::Resident => "r recalculate rewards · u refresh · l log out · q quit",
        Screen::Overview => "↑/↓ move · p pickup requests · u refresh · l log out · q quit",
        Screen::Pickups => "↑/↓ move · a accept · u refresh · Esc/b back · q quit",
    };

    let status_text = if app.is_loading {
        format!("Loading… · {nav_hint}")
    } else if let Some(msg) = &app.error_message {
        format!("{msg} · {nav_hint}")
    } else if let Some(msg) = &app.info_message {
        format!("{msg} · {nav_hint}")
    } else {
        nav_hint.to_owned()
    };

    let status_style = if app.error_message.is_some() {
        Style::default().fg(Color::Red)
    } else if app.is_loading {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn draw_login(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // email
            Constraint::Length(3), // password
            Constraint::Min(0),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [email_area, password_area, _] = chunks else {
        return;
    };

    let focused = |field: LoginField| {
        if app.login_field == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        }
    };

    let email = Paragraph::new(app.email_input.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .title("E-mail")
            .border_style(focused(LoginField::Email)),
    );
    frame.render_widget(email, *email_area);

    let masked = "*".repeat(app.password_input.chars().count());
    let password = Paragraph::new(masked).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Password")
            .border_style(focused(LoginField::Password)),
    );
    frame.render_widget(password, *password_area);
}

fn draw_resident(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(dashboard) = &app.dashboard else {
        let paragraph = Paragraph::new("No data loaded yet. Press u to refresh.")
            .block(Block::default().borders(Borders::ALL).title("My bin"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    };

    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // bin
            Constraint::Length(6), // rewards
            Constraint::Min(0),    // history
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [bin_area, rewards_area, history_area] = chunks else {
        return;
    };

    match &dashboard.bin_data {
        Some(bin_data) => {
            let bin = &bin_data.bin.bin;
            let status = bin_data.bin.status;
            let title = format!(
                "My bin · {}",
                bin_data.house_address.as_deref().unwrap_or("<no house>")
            );
            let lines = vec![
                level_line("Organic", bin.reading.organic_level()),
                level_line("Non-recyclable", bin.reading.non_recyclable_level()),
                level_line("Hazardous", bin.reading.hazardous_level()),
                status_line(status),
                Line::from(format!("Last update {}", local_time(bin.last_updated))),
            ];
            let paragraph = Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(paragraph, *bin_area);
        }
        None => {
            let paragraph = Paragraph::new("No bin reported yet.")
                .block(Block::default().borders(Borders::ALL).title("My bin"));
            frame.render_widget(paragraph, *bin_area);
        }
    }

    let rewards = dashboard.rewards;
    let reward_lines = vec![
        Line::from(format!("Organic points        {}", rewards.organic_points)),
        Line::from(format!("Non-recyclable points {}", rewards.non_recyclable_points)),
        Line::from(format!("Plastic penalty       {}", rewards.plastic_penalty)),
        Line::from(format!("Total                 {}", rewards.total_points))
            .style(Style::default().add_modifier(Modifier::BOLD)),
    ];
    let paragraph = Paragraph::new(reward_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Reward points (r to recalculate)"),
    );
    frame.render_widget(paragraph, *rewards_area);

    let rows = dashboard.waste_history.iter().map(|entry| {
        Row::new(vec![
            Cell::from(local_time(entry.collected_at)),
            Cell::from(kind_label(entry.kind)),
            Cell::from(format!("{:.1} kg", entry.quantity)),
            Cell::from(entry.location.clone()),
        ])
        .style(Style::default().fg(kind_color(entry.kind)))
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(17),
            Constraint::Length(15),
            Constraint::Length(10),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(vec!["Collected", "Type", "Quantity", "Location"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Waste log (last 7 days)"),
    )
    .column_spacing(1);
    frame.render_widget(table, *history_area);
}

fn draw_overview(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(overview) = &app.overview else {
        let paragraph = Paragraph::new("No data loaded yet. Press u to refresh.")
            .block(Block::default().borders(Borders::ALL).title("Overview"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    };

    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [stats_area, houses_area] = chunks else {
        return;
    };

    let stats = overview.stats;
    let distribution = overview.waste_distribution;
    let lines = vec![
        Line::from(format!(
            "Houses {} · critical bins {} · avg organic {}% · non-recyclable {}% · hazardous {}%",
            stats.total_houses,
            stats.critical_bins,
            stats.avg_organic_level,
            stats.avg_non_recyclable_level,
            stats.avg_hazardous_level,
        )),
        Line::from(format!(
            "Distribution · organic {}% · non-recyclable {}% · hazardous {}%",
            distribution.organic, distribution.non_recyclable, distribution.hazardous,
        )),
    ];
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Summary"))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, *stats_area);

    let rows = overview.houses.iter().map(|house| {
        let points = house
            .reward
            .map_or_else(|| "-".to_owned(), |reward| reward.total_points.to_string());
        Row::new(vec![
            Cell::from(house.address.clone()),
            Cell::from(format!("{:.0}", house.reading.organic_level())),
            Cell::from(format!("{:.0}", house.reading.non_recyclable_level())),
            Cell::from(format!("{:.0}", house.reading.hazardous_level())),
            Cell::from(format!("{:.1}", house.status.overall_fill)),
            Cell::from(house.status.tier.to_string()),
            Cell::from(if house.plastic_detected { "yes" } else { "" }),
            Cell::from(points),
        ])
        .style(Style::default().fg(tier_color(house.status.tier)))
    });

    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(9),
            Constraint::Length(8),
            Constraint::Length(7),
        ],
    )
    .header(
        Row::new(vec![
            "Address", "Organic", "NonRec", "Hazard", "Overall", "Tier", "Plastic", "Points",
        ])
        .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title("Houses"))
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
    .column_spacing(1);

    let mut state = TableState::default();
    if !overview.houses.is_empty() {
        state.select(Some(app.house_list_index));
    }
    frame.render_stateful_widget(table, *houses_area, &mut state);
}

fn draw_pickups(frame: &mut Frame<'_>, app: &App, area: Rect) {
    if app.pickups.is_empty() {
        let paragraph = Paragraph::new("No pickup requests from your residents.")
            .block(Block::default().borders(Borders::ALL).title("Pickup requests"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let rows = app.pickups.iter().map(|view| {
        let request = &view.request;
        let style = match request.status {
            PickupStatus::Pending => Style::default().fg(Color::Yellow),
            PickupStatus::Accepted => Style::default().fg(Color::Green),
        };
        Row::new(vec![
            Cell::from(local_time(request.created_at)),
            Cell::from(view.requester_name.clone()),
            Cell::from(request.address.clone()),
            Cell::from(request.description.clone().unwrap_or_default()),
            Cell::from(request.status.as_str()),
        ])
        .style(style)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(17),
            Constraint::Length(16),
            Constraint::Min(20),
            Constraint::Min(20),
            Constraint::Length(9),
        ],
    )
    .header(
        Row::new(vec!["Requested", "Resident", "Address", "Note", "Status"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Pickup requests (a to accept)"),
    )
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
    .column_spacing(1);

    let mut state = TableState::default();
    state.select(Some(app.pickup_list_index));
    frame.render_stateful_widget(table, area, &mut state);
}

fn level_line(label: &str, level: f64) -> Line<'static> {
    Line::from(format!("{label:<15} {level:>5.1}%"))
}

fn status_line(status: ClassificationResult) -> Line<'static> {
    let alert = if status.alert_triggered {
        " · needs emptying"
    } else {
        ""
    };
    Line::from(format!(
        "Overall {:.1}% · {}{alert}",
        status.overall_fill, status.tier
    ))
    .style(
        Style::default()
            .fg(tier_color(status.tier))
            .add_modifier(Modifier::BOLD),
    )
}

fn tier_color(tier: Tier) -> Color {
    match tier {
        Tier::Normal => Color::Green,
        Tier::Warning => Color::Yellow,
        Tier::Critical => Color::Red,
    }
}

fn kind_label(kind: WasteKind) -> &'static str {
    match kind {
        WasteKind::Organic => "Organic",
        WasteKind::NonRecyclable => "Non-recyclable",
        WasteKind::Hazardous => "Hazardous",
    }
}

fn kind_color(kind: WasteKind) -> Color {
    match kind {
        WasteKind::Organic => Color::Green,
        WasteKind::NonRecyclable => Color::Gray,
        WasteKind::Hazardous => Color::Magenta,
    }
}

fn local_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%d.%m.%Y %H:%M").to_string()
}
