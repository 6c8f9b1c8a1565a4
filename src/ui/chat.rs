use chrono::{DateTime, TimeZone, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{input_column, App, InputMode};
use crate::backend::{Message, Principal};

/// Human label for a message timestamp (nanoseconds since epoch). The
/// backend leaves fresh messages at 0 until it assigns a time; that sentinel
/// must read as "just now", never as 1970.
pub fn time_label(timestamp: u64, now: DateTime<Utc>) -> String {
    if timestamp == 0 {
        return "just now".to_string();
    }
    let then = Utc.timestamp_nanos(timestamp as i64);
    let delta = now.signed_duration_since(then);
    let secs = delta.num_seconds().max(0);
    if secs < 60 {
        "just now".to_string()
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3600)
    } else {
        format!("{}d ago", secs / 86_400)
    }
}

/// Top scroll offset over the pre-wrapped message lines. `scroll_up` counts
/// rendered rows up from the newest message; 0 pins the view to the bottom.
pub fn top_offset(total_lines: usize, height: usize, scroll_up: usize) -> usize {
    let max_scroll = total_lines.saturating_sub(height);
    max_scroll.saturating_sub(scroll_up.min(max_scroll))
}

/// Character wrap into chunks of at most `width` chars. The message
/// paragraph is scrolled in rendered-row units, so wrapping happens here
/// rather than in the widget: every chunk is exactly one terminal row.
fn wrap_chars(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut used = 0;
    for c in text.chars() {
        if used == width {
            chunks.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(c);
        used += 1;
    }
    chunks.push(current);
    chunks
}

pub fn draw(f: &mut Frame, app: &App, friend: &str, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Messages
            Constraint::Length(3), // Input
        ])
        .split(area);

    draw_messages(f, app, friend, chunks[0]);
    draw_input(f, app, friend, chunks[1]);
}

fn draw_messages(f: &mut Frame, app: &App, friend: &str, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Chat with {} ", friend))
        .style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let query = app.cache.messages(friend);

    if let Some(msg) = query.and_then(|q| q.error()) {
        let error = Paragraph::new(vec![
            Line::from(Span::styled(
                "Failed to load messages",
                Style::default().fg(Color::Red),
            )),
            Line::from(Span::styled(
                msg.to_string(),
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .wrap(Wrap { trim: true });
        f.render_widget(error, inner);
        return;
    }

    let messages = query.and_then(|q| q.data());
    let Some(messages) = messages else {
        let loading = Paragraph::new(Span::styled(
            "Loading messages...",
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        ));
        f.render_widget(loading, inner);
        return;
    };

    if messages.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(Span::styled(
                "No messages yet",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("Say hi to {}!", friend)),
        ])
        .wrap(Wrap { trim: true });
        f.render_widget(empty, inner);
        return;
    }

    let now = Utc::now();
    let width = inner.width as usize;
    let lines: Vec<Line> = messages
        .iter()
        .flat_map(|msg| message_lines(msg, friend, app.caller(), now, width))
        .collect();

    let offset = top_offset(lines.len(), inner.height as usize, app.chat_scroll_up);
    let paragraph = Paragraph::new(lines).scroll((offset as u16, 0));
    f.render_widget(paragraph, inner);
}

/// Messages render in backend order; "sent" vs "received" is decided by
/// comparing the sender to the caller's own principal. Long content wraps
/// with a hanging indent under the sender prefix; the time label rides the
/// last row, or its own row when it does not fit.
fn message_lines(
    msg: &Message,
    friend: &str,
    caller: Option<&Principal>,
    now: DateTime<Utc>,
    width: usize,
) -> Vec<Line<'static>> {
    let is_sent = caller.is_some_and(|p| *p == msg.sender);
    let (who, who_color) = if is_sent {
        ("you", Color::Green)
    } else {
        (friend, Color::Magenta)
    };
    let prefix = format!("<{}> ", who);
    let indent = " ".repeat(prefix.chars().count());
    let time = format!("  ({})", time_label(msg.timestamp, now));

    let body_width = width.saturating_sub(indent.chars().count()).max(1);
    let chunks = wrap_chars(&msg.content, body_width);
    let time_fits = indent.chars().count()
        + chunks.last().map_or(0, |c| c.chars().count())
        + time.chars().count()
        <= width;

    let last = chunks.len() - 1;
    let mut lines = Vec::with_capacity(chunks.len() + 1);
    for (i, chunk) in chunks.into_iter().enumerate() {
        let lead = if i == 0 {
            Span::styled(prefix.clone(), Style::default().fg(who_color))
        } else {
            Span::raw(indent.clone())
        };
        let mut spans = vec![lead, Span::raw(chunk)];
        if i == last && time_fits {
            spans.push(Span::styled(
                time.clone(),
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.push(Line::from(spans));
    }
    if !time_fits {
        lines.push(Line::from(vec![
            Span::raw(indent),
            Span::styled(time, Style::default().fg(Color::DarkGray)),
        ]));
    }
    lines
}

fn draw_input(f: &mut Frame, app: &App, friend: &str, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let title = if app.sending_message {
        " Sending... ".to_string()
    } else if editing {
        format!(" Message {} - ENTER=send ESC=browse ", friend)
    } else {
        " [BROWSE] i=type  ↑/↓=scroll  End=latest ".to_string()
    };

    let style = if editing {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::White)
    };

    let block = Block::default().borders(Borders::ALL).title(title).style(style);
    let input = Paragraph::new(app.input.as_str())
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(input, area);

    if editing {
        let col = input_column(&app.input, app.cursor_position)
            .min(area.width.saturating_sub(3) as usize);
        f.set_cursor(area.x + col as u16 + 1, area.y + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn nanos_ago(duration: Duration) -> u64 {
        (now() - duration).timestamp_nanos_opt().unwrap() as u64
    }

    #[test]
    fn zero_timestamp_renders_just_now() {
        assert_eq!(time_label(0, now()), "just now");
    }

    #[test]
    fn nonzero_timestamps_render_relative_labels() {
        assert_eq!(time_label(nanos_ago(Duration::seconds(20)), now()), "just now");
        assert_eq!(time_label(nanos_ago(Duration::minutes(5)), now()), "5m ago");
        assert_eq!(time_label(nanos_ago(Duration::hours(3)), now()), "3h ago");
        assert_eq!(time_label(nanos_ago(Duration::days(2)), now()), "2d ago");
    }

    #[test]
    fn future_timestamps_clamp_to_just_now() {
        // Clock skew between client and backend should never show negatives.
        assert_eq!(
            time_label(nanos_ago(Duration::seconds(-30)), now()),
            "just now"
        );
    }

    #[test]
    fn long_messages_wrap_to_the_rendered_width() {
        let msg = Message {
            content: "a".repeat(70),
            sender: Principal("peer".to_string()),
            timestamp: 0,
        };
        // "<alice> " leaves 30 columns per row; 70 chars need 3 of them.
        let lines = message_lines(&msg, "alice", None, now(), 38);
        assert_eq!(lines.len(), 3);

        let short = Message {
            content: "hey".to_string(),
            sender: Principal("peer".to_string()),
            timestamp: 0,
        };
        assert_eq!(message_lines(&short, "alice", None, now(), 38).len(), 1);
    }

    #[tokio::test]
    async fn bottom_pin_keeps_newest_wrapped_message_on_screen() {
        use crate::backend::SessionManager;
        use ratatui::{backend::TestBackend, Terminal};
        use std::time::Instant;

        let dir = tempfile::tempdir().unwrap();
        let mgr = SessionManager::new("http://localhost:0", dir.path().join("session.toml"));
        let mut app = App::new("http://localhost:0".to_string(), mgr);

        // Every message wraps to several rows in a 40-column terminal.
        let messages: Vec<Message> = (0..20)
            .map(|i| Message {
                content: format!("msg{:02} {}", i, "x".repeat(120)),
                sender: Principal("peer".to_string()),
                timestamp: 0,
            })
            .collect();
        app.cache.messages_mut("alice").begin_fetch();
        app.cache
            .messages_mut("alice")
            .resolve(Instant::now(), Ok(messages));

        let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();
        terminal
            .draw(|f| draw(f, &app, "alice", f.size()))
            .unwrap();

        let rendered: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(rendered.contains("msg19"), "newest message not visible");
        assert!(!rendered.contains("msg03"));
    }

    #[test]
    fn scroll_pins_to_bottom_by_default() {
        // 30 lines in a 10-line viewport: bottom pin shows lines 20..30.
        assert_eq!(top_offset(30, 10, 0), 20);
        assert_eq!(top_offset(30, 10, 5), 15);
        // Scrolling past the top clamps.
        assert_eq!(top_offset(30, 10, 100), 0);
        // Fewer lines than the viewport never scroll.
        assert_eq!(top_offset(5, 10, 0), 0);
        assert_eq!(top_offset(5, 10, 3), 0);
    }
}
