use std::time::Instant;

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::call::format_elapsed;
use crate::ui::centered_rect;

pub fn initials(username: &str) -> String {
    username.chars().take(2).collect::<String>().to_uppercase()
}

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let Some(call) = &app.call else {
        return;
    };
    let now = Instant::now();

    let card = centered_rect(50, 70, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Call ")
        .style(if call.is_ended() {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Green)
        });

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("( {} )", initials(call.peer())),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            call.peer().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    if call.is_ended() {
        lines.push(Line::from(Span::styled(
            "Call ended",
            Style::default().fg(Color::Red),
        )));
        lines.push(Line::from(Span::styled(
            format_elapsed(call.elapsed_secs(now)),
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "In call",
            Style::default().fg(Color::DarkGray),
        )));
        lines.push(Line::from(Span::styled(
            format_elapsed(call.elapsed_secs(now)),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));

        let mic = if call.muted() {
            Span::styled("Muted", Style::default().fg(Color::Red))
        } else {
            Span::styled("Mic on", Style::default().fg(Color::Green))
        };
        let video = if call.video_enabled() {
            Span::styled("Video on", Style::default().fg(Color::Green))
        } else {
            Span::styled("Video off", Style::default().fg(Color::Red))
        };
        lines.push(Line::from(vec![
            mic,
            Span::raw("  |  "),
            video,
        ]));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Simulated call, no real audio/video",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, card);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initials_take_first_two_chars_uppercased() {
        assert_eq!(initials("alice"), "AL");
        assert_eq!(initials("x"), "X");
        assert_eq!(initials(""), "");
    }
}
