use chrono::{Local, NaiveDateTime};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
};

use crate::app::{App, Screen};

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

    // Title / header
    let header = Paragraph::new("cassonetto – Mantova Ambiente collection calendar")
        .block(Block::default().borders(Borders::ALL).title("Cassonetto"));
    frame.render_widget(header, *header_area);

    // Main screen
    match app.screen {
        Screen::ZoneSelect => draw_zone_select(frame, app, *content_area),
        Screen::Setup => draw_setup(frame, app, *content_area),
        Screen::ScheduleView => draw_schedule_view(frame, app, *content_area),
    }

    // Status bar
    let nav_hint = match app.screen {
        Screen::ZoneSelect => "↑/↓ move · Enter/Space select zone · q/Ctrl-C quit",
        Screen::Setup => {
            "↑/↓ move · Space toggle · ←/→ adjust TTL · Enter confirm · Esc back · q/Ctrl-C quit"
        }
        Screen::ScheduleView => "r refresh · Esc/←/b back to setup · q/Ctrl-C quit",
    };

    let status_text = if app.is_loading {
        format!("Loading… · {nav_hint}")
    } else if let Some(msg) = &app.error_message {
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

fn draw_zone_select(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let items = if app.zones.is_empty() {
        vec![ListItem::new("No zones available from the API.")]
    } else {
        app.zones
            .iter()
            .enumerate()
            .map(|(idx, zone)| {
                let prefix = if idx == app.zone_list_index {
                    "> "
                } else {
                    "  "
                };
                ListItem::new(format!("{prefix}{}", zone.title))
            })
            .collect::<Vec<ListItem<'_>>>()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Select zone (↑/↓, Enter)"),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !app.zones.is_empty() {
        state.select(Some(app.zone_list_index));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_setup(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let zone_title = app
        .selected_zone
        .as_ref()
        .map_or("<no zone>", |zone| zone.title.as_str());

    let mut items = app
        .waste_toggles
        .iter()
        .map(|toggle| {
            let mark = if toggle.enabled { "[x]" } else { "[ ]" };
            ListItem::new(format!("{mark} {}", toggle.title))
        })
        .collect::<Vec<ListItem<'_>>>();

    items.push(ListItem::new(format!(
        "    Cache TTL: {} h  (←/→ to adjust)",
        app.cache_hours
    )));

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(
            "Waste types for {zone_title} (Space toggles, Enter confirms)"
        )))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    state.select(Some(app.setup_index));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_schedule_view(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let zone_title = app
        .selected_zone
        .as_ref()
        .map_or("<zone>", |zone| zone.title.as_str());

    let fetched = app
        .dataset
        .as_ref()
        .map_or_else(String::new, |dataset| {
            format!(" · updated {}", dataset.fetched_at().format("%d.%m.%Y %H:%M"))
        });

    let title = format!("Pickups in {zone_title}{fetched} (r to refresh)");

    if app.is_loading {
        let paragraph = Paragraph::new("Loading schedule…")
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let collections = app.visible_collections();
    if collections.is_empty() {
        let paragraph = Paragraph::new("No data for the selected waste types yet.")
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let now = Local::now().naive_local();

    let rows = collections.into_iter().map(|collection| {
        let due_tomorrow = collection.is_due_tomorrow(now);
        let next = collection.next_instant(now);

        let next_text = next.map_or_else(
            || "no upcoming pickup".to_owned(),
            |instant| instant.format("%d.%m.%Y %H:%M").to_string(),
        );
        let relative = next.map_or_else(String::new, |instant| relative_day_label(instant, now));

        let mut style = Style::default();
        if due_tomorrow {
            style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
        }

        Row::new(vec![
            Cell::from(collection.title().to_owned()),
            Cell::from(next_text),
            Cell::from(relative),
            Cell::from(if due_tomorrow { "tomorrow!" } else { "" }),
        ])
        .style(style)
    });

    let column_widths = [
        Constraint::Min(20),
        Constraint::Length(18),
        Constraint::Length(12),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec!["Waste type", "Next pickup", "In", ""])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(1);

    frame.render_widget(table, area);
}

fn relative_day_label(instant: NaiveDateTime, now: NaiveDateTime) -> String {
    let delta = (instant.date() - now.date()).num_days();
    match delta {
        0 => "today".to_owned(),
        1 => "tomorrow".to_owned(),
        days if days > 1 => format!("in {days} days"),
        _ => "passed".to_owned(),
    }
}
