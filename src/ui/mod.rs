use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{input_column, profile_gate, App, Gate, ProfileGate, View};
use crate::backend::UserProfile;

pub mod call;
pub mod chat;
pub mod friends;
pub mod manage;

pub fn draw(f: &mut Frame, app: &App) {
    match &app.gate {
        Gate::Initializing => draw_blocking(f, "Loading..."),
        Gate::LoggingIn => draw_blocking(f, "Logging in..."),
        Gate::AccessDenied { error } => draw_access_denied(f, error.as_deref()),
        Gate::Authenticated => match profile_gate(&app.cache.profile) {
            ProfileGate::Loading => draw_blocking(f, "Loading profile..."),
            ProfileGate::Error(msg) => draw_profile_error(f, msg),
            ProfileGate::Setup => draw_profile_setup(f, app),
            ProfileGate::Ready(profile) => draw_main(f, app, profile),
        },
    }
}

fn draw_main(f: &mut Frame, app: &App, profile: &UserProfile) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(0),    // View content
            Constraint::Length(1), // Toast / hints
        ])
        .split(f.size());

    draw_title_bar(f, app, profile, chunks[0]);

    match &app.view {
        View::FriendsList => friends::draw(f, app, profile, chunks[1]),
        View::Manage => manage::draw(f, app, chunks[1]),
        View::Chat(friend) => chat::draw(f, app, friend, chunks[1]),
        View::Call(_) => call::draw(f, app, chunks[1]),
    }

    draw_status_line(f, app, chunks[2]);
}

fn draw_title_bar(f: &mut Frame, app: &App, profile: &UserProfile, area: Rect) {
    let route = match &app.view {
        View::FriendsList => "friends".to_string(),
        View::Manage => "manage".to_string(),
        View::Chat(friend) => format!("chat/{}", friend),
        View::Call(friend) => format!("call/{}", friend),
    };

    let title = format!(
        " Amity v{} | {} | {} | online ",
        env!("CARGO_PKG_VERSION"),
        profile.name,
        route,
    );

    let title_block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Green))
        .title(" Amity ");

    let title_paragraph = Paragraph::new(title)
        .block(title_block)
        .alignment(Alignment::Center);

    f.render_widget(title_paragraph, area);
}

fn draw_status_line(f: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(toast) = &app.toast {
        let style = if toast.error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Green)
        };
        Line::from(Span::styled(format!(" {} ", toast.text), style))
    } else {
        let hint = match &app.view {
            View::FriendsList => {
                "↑/↓=select  ENTER=chat  v=call  m=manage  r=refresh  o=logout  q=quit"
            }
            View::Manage => "a=add  /=filter  d=remove  ↑/↓=select  ESC=back  q=quit",
            View::Chat(_) => "ENTER=send  ESC=browse  i=type  v=call  b=back",
            View::Call(_) => "m=mute  v=video  e=end call",
        };
        Line::from(Span::styled(
            format!(" {}", hint),
            Style::default().fg(Color::DarkGray),
        ))
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_blocking(f: &mut Frame, text: &str) {
    let area = centered_rect(40, 20, f.size());
    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Cyan));
    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

fn draw_access_denied(f: &mut Frame, error: Option<&str>) {
    let area = centered_rect(60, 60, f.size());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Amity ")
        .style(Style::default().fg(Color::Green));

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Welcome to Amity",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Stay connected with your friends: chat, call, and"),
        Line::from("manage your social circle all in one place."),
        Line::from(""),
        Line::from(Span::styled(
            "[chat]   [call]   [friends]",
            Style::default().fg(Color::Cyan),
        )),
        Line::from(""),
    ];

    if let Some(msg) = error {
        lines.push(Line::from(Span::styled(
            "Login failed. Please try again.",
            Style::default().fg(Color::Red),
        )));
        lines.push(Line::from(Span::styled(
            msg.to_string(),
            Style::default().fg(Color::DarkGray),
        )));
        lines.push(Line::from(""));
    }

    lines.push(Line::from(Span::styled(
        "Press 'l' to log in, 'q' to quit",
        Style::default().add_modifier(Modifier::BOLD),
    )));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn draw_profile_error(f: &mut Frame, msg: &str) {
    let area = centered_rect(60, 30, f.size());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Profile ")
        .style(Style::default().fg(Color::Red));
    let lines = vec![
        Line::from("Failed to load your profile"),
        Line::from(Span::styled(
            msg.to_string(),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from("r=retry  o=logout  q=quit"),
    ];
    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn draw_profile_setup(f: &mut Frame, app: &App) {
    let area = centered_rect(60, 40, f.size());
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Set Up Your Profile ")
        .style(Style::default().fg(Color::Green));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Description
            Constraint::Length(3), // Name input
            Constraint::Min(0),    // Hint
        ])
        .split(inner);

    let description =
        Paragraph::new("Choose a display name so your friends can find you.")
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
    f.render_widget(description, chunks[0]);

    let input_block = Block::default()
        .borders(Borders::ALL)
        .title(" Display Name (max 50) ")
        .style(Style::default().fg(Color::Cyan));
    let input = Paragraph::new(app.input.as_str()).block(input_block);
    f.render_widget(input, chunks[1]);
    let col = input_column(&app.input, app.cursor_position)
        .min(chunks[1].width.saturating_sub(3) as usize);
    f.set_cursor(chunks[1].x + col as u16 + 1, chunks[1].y + 1);

    let hint = if app.saving_profile {
        "Saving..."
    } else {
        "ENTER=save  ESC=clear  Ctrl+C=quit"
    };
    let hint_paragraph = Paragraph::new(Span::styled(
        hint,
        Style::default().fg(Color::DarkGray),
    ))
    .alignment(Alignment::Center);
    f.render_widget(hint_paragraph, chunks[2]);
}

/// Centered sub-rectangle, in percent of the containing area.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
