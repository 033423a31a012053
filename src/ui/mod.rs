use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

pub mod layout;

use crate::app::{App, Connection, FormRow, StatusLevel};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub fn draw(f: &mut Frame, app: &App) {
    let areas = layout::areas(f.size());

    draw_header(f, areas.header, app);
    draw_form(f, areas.form, app);
    draw_result(f, areas.result, app);
    draw_history(f, areas.history, app);
    draw_status_line(f, areas.status_line, app);
    draw_help_line(f, areas.help_line);
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let mut spans = vec![
        Span::styled(
            "Enigma Duel",
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
    ];
    match &app.connection {
        Connection::Connecting => {
            spans.push(Span::styled("connecting…", Style::default().fg(Color::Yellow)));
        }
        Connection::Ready { endpoint, caller } => {
            spans.push(Span::styled("RPC", Style::default().fg(Color::DarkGray)));
            spans.push(Span::raw(format!(" {endpoint} ")));
            spans.push(Span::styled("Account", Style::default().fg(Color::DarkGray)));
            spans.push(Span::raw(format!(" {}", short_addr(&caller.to_string()))));
        }
        Connection::Failed(_) => {
            spans.push(Span::styled("disconnected", Style::default().fg(Color::Red)));
        }
    }
    let left = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    let right_line = match &app.overview {
        Some(overview) => Line::from(vec![
            Span::styled("Fee ", Style::default().fg(Color::DarkGray)),
            Span::raw(format!("{}  ", overview.fee)),
            Span::styled("Draw ", Style::default().fg(Color::DarkGray)),
            Span::raw(format!("{}  ", overview.draw_fee)),
            Span::styled("EDT ", Style::default().fg(Color::DarkGray)),
            Span::raw(short_addr(&overview.token.to_string())),
        ]),
        None => Line::from(Span::styled("--", Style::default().fg(Color::DarkGray))),
    };
    let right = Paragraph::new(right_line)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    f.render_widget(left, chunks[0]);
    f.render_widget(right, chunks[1]);
}

fn draw_form(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.selected_row();
    let items: Vec<ListItem> = FormRow::ALL
        .iter()
        .map(|row| {
            let is_selected = *row == selected;
            let mut lines = vec![Line::from(Span::styled(
                row.title(),
                Style::default().add_modifier(Modifier::BOLD),
            ))];
            if let Some(placeholder) = row.placeholder() {
                let value = app.input(*row);
                let field = if value.is_empty() {
                    Span::styled(placeholder, Style::default().fg(Color::DarkGray))
                } else {
                    Span::raw(value.to_string())
                };
                let mut spans = vec![Span::raw("  > "), field];
                if is_selected {
                    spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
                }
                lines.push(Line::from(spans));
            }
            lines.push(Line::from(Span::styled(
                format!("  [{}]", row.button()),
                Style::default().fg(Color::Cyan),
            )));
            ListItem::new(Text::from(lines))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Actions"))
        .highlight_style(Style::default().fg(Color::LightCyan))
        .highlight_symbol(">> ");

    let mut state = ListState::default();
    state.select(Some(app.selected));
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_result(f: &mut Frame, area: Rect, app: &App) {
    let title = match app.in_flight {
        Some(operation) => format!(
            "Result {} {:?}",
            SPINNER[app.spinner % SPINNER.len()],
            operation
        ),
        None => "Result".to_string(),
    };
    let text = if app.result.is_empty() {
        Text::from(Line::from(Span::styled(
            "No result yet",
            Style::default().fg(Color::DarkGray),
        )))
    } else {
        Text::from(app.result.as_str())
    };
    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn draw_history(f: &mut Frame, area: Rect, app: &App) {
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = app
        .history
        .iter()
        .rev()
        .take(visible)
        .map(|entry| {
            let (marker, color) = if entry.ok {
                ("ok ", Color::Green)
            } else {
                ("err", Color::Red)
            };
            Line::from(vec![
                Span::styled(format!("{} ", entry.at), Style::default().fg(Color::DarkGray)),
                Span::styled(marker, Style::default().fg(color)),
                Span::raw(format!(" {:?}: {}", entry.operation, entry.summary)),
            ])
        })
        .collect();
    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title("History"))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let line = match app.status_text() {
        Some((text, level)) => {
            let color = match level {
                StatusLevel::Info => Color::Green,
                StatusLevel::Warn => Color::Yellow,
                StatusLevel::Error => Color::Red,
            };
            Line::from(Span::styled(text.to_string(), Style::default().fg(color)))
        }
        None => match &app.connection {
            Connection::Failed(message) => Line::from(Span::styled(
                message.clone(),
                Style::default().fg(Color::Red),
            )),
            _ => Line::from(""),
        },
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_help_line(f: &mut Frame, area: Rect) {
    let hints = [
        ("↑/↓", "select"),
        ("Enter", "submit"),
        ("Ctrl+U", "clear"),
        ("Ctrl+Y", "copy"),
        ("Ctrl+R", "refresh fees"),
        ("Esc", "quit"),
    ];
    let mut spans = Vec::new();
    for (key, action) in hints {
        spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        spans.push(Span::styled(
            format!(" {action}  "),
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn short_addr(value: &str) -> String {
    if value.len() <= 12 {
        return value.to_string();
    }
    format!("{}…{}", &value[..6], &value[value.len() - 4..])
}
