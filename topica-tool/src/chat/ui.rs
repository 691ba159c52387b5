use chrono::{Local, TimeZone};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use topica_chat::{Message, ModelAdapter, Role, STARTER_PROMPTS};

use super::app::{AppMode, ChatApp};

pub fn render<A: ModelAdapter>(frame: &mut Frame, app: &ChatApp<A>) {
    let input_lines = app.input().split('\n').count().clamp(1, 5) as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),               // Header
            Constraint::Min(1),                  // Messages
            Constraint::Length(input_lines + 2), // Input
            Constraint::Length(1),               // Status bar
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    if app.state().messages().is_empty() && !app.is_loading() {
        render_welcome(frame, app, chunks[1]);
    } else {
        render_messages(frame, app, chunks[1]);
    }
    render_input(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    if app.mode == AppMode::SelectTopic {
        render_topic_popup(frame, app);
    }
}

fn render_header<A: ModelAdapter>(frame: &mut Frame, app: &ChatApp<A>, area: Rect) {
    let topic = app.state().current_topic();
    let title = format!("{} topica - {}  [{}]", topic.icon, topic.name, app.model);

    let header =
        Paragraph::new(title).style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    frame.render_widget(header, area);
}

fn render_welcome<A: ModelAdapter>(frame: &mut Frame, app: &ChatApp<A>, area: Rect) {
    let topic = app.state().current_topic();
    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} {}", topic.icon, topic.name),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            topic.description.clone(),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from("Try one of these:"),
    ];
    for (i, prompt) in STARTER_PROMPTS.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("  Alt+{}  ", i + 1), Style::default().fg(Color::Yellow)),
            Span::raw(*prompt),
        ]));
    }
    push_notice(&mut lines, app);

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title("Welcome"))
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

fn render_messages<A: ModelAdapter>(frame: &mut Frame, app: &ChatApp<A>, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();

    for msg in app.state().messages() {
        push_message(&mut lines, msg);
        lines.push(Line::from("")); // Empty line between messages
    }

    if app.is_loading() {
        lines.push(Line::from(Span::styled(
            "Thinking…",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        )));
    }

    push_notice(&mut lines, app);

    let messages_block = Block::default().borders(Borders::ALL).title("Messages");

    // Scroll offset counts lines up from the bottom of the conversation.
    let visible_height = area.height.saturating_sub(2) as usize;
    let total_lines = lines.len();
    let scroll = if total_lines > visible_height {
        (total_lines - visible_height).saturating_sub(app.messages_scroll as usize)
    } else {
        0
    };

    let paragraph = Paragraph::new(Text::from(lines))
        .block(messages_block)
        .wrap(Wrap { trim: false })
        .scroll((scroll as u16, 0));

    frame.render_widget(paragraph, area);
}

fn push_message(lines: &mut Vec<Line<'static>>, msg: &Message) {
    let (role, style) = match msg.role {
        Role::User => ("You", Style::default().fg(Color::Green)),
        Role::Assistant => ("Assistant", Style::default().fg(Color::Blue)),
    };

    lines.push(Line::from(vec![
        Span::styled(role, style.add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("  {}", format_time(msg.timestamp_ms)),
            Style::default().fg(Color::DarkGray),
        ),
    ]));

    for line in msg.content.lines() {
        let mut spans = vec![Span::raw("  ")];
        spans.extend(parse_markdown_line(line));
        lines.push(Line::from(spans));
    }

    if !msg.sources.is_empty() {
        lines.push(Line::from(Span::styled(
            "  Sources:",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
        )));
        for source in &msg.sources {
            lines.push(Line::from(vec![
                Span::raw("  🔗 "),
                Span::styled(source.title.clone(), Style::default().fg(Color::Cyan)),
                Span::styled(
                    format!(" <{}>", source.uri),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
        }
    }
}

fn push_notice<A: ModelAdapter>(lines: &mut Vec<Line<'static>>, app: &ChatApp<A>) {
    if let Some(notice) = app.state().notice() {
        lines.push(Line::from(Span::styled(
            notice.to_string(),
            Style::default().fg(Color::Magenta),
        )));
    }
}

fn format_time(timestamp_ms: i64) -> String {
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default()
}

/// Splits a line on `**` markers, rendering the enclosed runs in bold.
fn parse_markdown_line(line: &str) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut bold = false;

    for (i, part) in line.split("**").enumerate() {
        if i > 0 {
            bold = !bold;
        }
        if part.is_empty() {
            continue;
        }
        let style = if bold {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        spans.push(Span::styled(part.to_string(), style));
    }

    spans
}

fn render_input<A: ModelAdapter>(frame: &mut Frame, app: &ChatApp<A>, area: Rect) {
    let input_block = Block::default().borders(Borders::ALL).title("Input");
    let input = app.input();

    let paragraph = if input.is_empty() {
        Paragraph::new("Type your message here...").style(Style::default().fg(Color::DarkGray))
    } else {
        Paragraph::new(input.to_string())
    };

    frame.render_widget(paragraph.block(input_block), area);

    if app.mode == AppMode::Chat {
        let (col, row) = cursor_offset(input, app.cursor_pos);
        let max_row = area.height.saturating_sub(3);
        frame.set_cursor_position((area.x + 1 + col, area.y + 1 + row.min(max_row)));
    }
}

/// Terminal column and row of the byte offset `cursor` within `input`.
fn cursor_offset(input: &str, cursor: usize) -> (u16, u16) {
    let before = &input[..cursor.min(input.len())];
    let row = before.matches('\n').count() as u16;
    let line = before.rsplit('\n').next().unwrap_or("");
    (Span::raw(line).width() as u16, row)
}

fn render_status_bar<A: ModelAdapter>(frame: &mut Frame, app: &ChatApp<A>, area: Rect) {
    let status = match app.mode {
        AppMode::Chat if app.is_loading() => "Thinking…  Esc: Cancel  Ctrl+C: Quit",
        AppMode::Chat => {
            "Enter: Send  Shift+Enter: Newline  F2: Topic  Ctrl+↑/↓: Scroll  Esc: Quit"
        }
        AppMode::SelectTopic => "↑/↓: Navigate  Enter: Select  Esc: Cancel",
    };

    let status_bar = Paragraph::new(status).style(Style::default().fg(Color::DarkGray));

    frame.render_widget(status_bar, area);
}

fn render_topic_popup<A: ModelAdapter>(frame: &mut Frame, app: &ChatApp<A>) {
    let current = &app.state().current_topic().id;
    let items: Vec<ListItem> = app
        .registry
        .iter()
        .map(|topic| {
            let is_current = &topic.id == current;
            let style = if is_current {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            let marker = if is_current { " ✓" } else { "" };
            ListItem::new(format!(
                "{} {}{} - {}",
                topic.icon, topic.name, marker, topic.description
            ))
            .style(style)
        })
        .collect();

    let area = centered_rect(60, 50, frame.area());

    frame.render_widget(Clear, area);

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Select Topic"))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    let mut state = ratatui::widgets::ListState::default();
    state.select(Some(app.popup_selected));

    frame.render_stateful_widget(list, area, &mut state);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
