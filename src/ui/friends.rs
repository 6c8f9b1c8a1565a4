use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::backend::{Friend, UserProfile};

/// Exact header wording, including the 1-friend singular.
pub fn friends_summary(count: usize) -> String {
    if count == 1 {
        "You have 1 friend".to_string()
    } else {
        format!("You have {} friends", count)
    }
}

pub fn draw(f: &mut Frame, app: &App, profile: &UserProfile, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Greeting + summary
            Constraint::Min(0),    // Friend list
        ])
        .split(area);

    draw_header(f, app, profile, chunks[0]);
    draw_list(f, app, chunks[1]);
}

fn draw_header(f: &mut Frame, app: &App, profile: &UserProfile, area: Rect) {
    let friends = &app.cache.friends;
    let summary = match friends.data() {
        Some(list) if list.is_empty() => "Add friends to get started".to_string(),
        Some(list) => friends_summary(list.len()),
        None if friends.error().is_some() => String::new(),
        None => "Loading friends...".to_string(),
    };

    let lines = vec![
        Line::from(Span::styled(
            format!("Hey, {} 👋", profile.first_name()),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            summary,
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default().borders(Borders::ALL);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_list(f: &mut Frame, app: &App, area: Rect) {
    let friends = &app.cache.friends;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Friends ")
        .style(Style::default().fg(Color::Cyan));

    if let Some(msg) = friends.error() {
        let error = Paragraph::new(vec![
            Line::from(Span::styled(
                "Failed to load friends list",
                Style::default().fg(Color::Red),
            )),
            Line::from(Span::styled(
                msg.to_string(),
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        f.render_widget(error, area);
        return;
    }

    let Some(list) = friends.data() else {
        let loading = Paragraph::new(Span::styled(
            "Loading...",
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        ))
        .block(block);
        f.render_widget(loading, area);
        return;
    };

    if list.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "No friends yet",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from("Add friends by their username to start chatting and calling."),
            Line::from(""),
            Line::from(Span::styled(
                "Press 'm' to add your first friend",
                Style::default().fg(Color::Green),
            )),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = list
        .iter()
        .enumerate()
        .map(|(i, friend)| friend_item(friend, i == app.friends_selected))
        .collect();

    f.render_widget(List::new(items).block(block), area);
}

fn friend_item(friend: &Friend, selected: bool) -> ListItem<'static> {
    let (dot, status, status_color) = if friend.online {
        ("●", "Online", Color::Green)
    } else {
        ("○", "Offline", Color::DarkGray)
    };

    let name_style = if selected {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };

    let marker = if selected { "> " } else { "  " };
    ListItem::new(Line::from(vec![
        Span::raw(marker.to_string()),
        Span::styled(format!("{} ", dot), Style::default().fg(status_color)),
        Span::styled(friend.username.clone(), name_style),
        Span::styled(
            format!("  {}", status),
            Style::default().fg(status_color),
        ),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_pluralizes_exactly() {
        assert_eq!(friends_summary(1), "You have 1 friend");
        assert_eq!(friends_summary(2), "You have 2 friends");
        assert_eq!(friends_summary(0), "You have 0 friends");
        assert_eq!(friends_summary(17), "You have 17 friends");
    }
}
