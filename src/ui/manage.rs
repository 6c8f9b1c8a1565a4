use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{input_column, App, InputMode};
use crate::backend::Friend;
use crate::ui::centered_rect;

/// Case-insensitive substring filter over the cached list; display only,
/// the cache itself is never touched.
pub fn filter_friends<'a>(friends: &'a [Friend], filter: &str) -> Vec<&'a Friend> {
    let needle = filter.to_lowercase();
    friends
        .iter()
        .filter(|f| f.username.to_lowercase().contains(&needle))
        .collect()
}

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Add-friend input
            Constraint::Min(0),    // Friend list
        ])
        .split(area);

    draw_add_form(f, app, chunks[0]);
    draw_list(f, app, chunks[1]);

    if let Some(username) = &app.confirm_remove {
        draw_confirm_overlay(f, username);
    }
}

fn draw_add_form(f: &mut Frame, app: &App, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let title = if app.adding_friend {
        " Add a Friend (adding...) "
    } else if editing {
        " Add a Friend - ENTER=add ESC=done "
    } else {
        " Add a Friend - press 'a' "
    };

    let style = if editing {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::White)
    };

    let block = Block::default().borders(Borders::ALL).title(title).style(style);
    let input = Paragraph::new(if editing { app.input.as_str() } else { "" }).block(block);
    f.render_widget(input, area);

    if editing {
        let col = input_column(&app.input, app.cursor_position)
            .min(area.width.saturating_sub(3) as usize);
        f.set_cursor(area.x + col as u16 + 1, area.y + 1);
    }
}

fn draw_list(f: &mut Frame, app: &App, area: Rect) {
    let friends = &app.cache.friends;
    let filtering = app.input_mode == InputMode::Filtering;

    let title = if app.manage_filter.is_empty() && !filtering {
        format!(
            " Your Friends ({}) ",
            friends.data().map_or(0, Vec::len)
        )
    } else {
        format!(" Your Friends - filter: {}_ ", app.manage_filter)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(if filtering {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Cyan)
        });

    let Some(list) = friends.data() else {
        let text = if let Some(msg) = friends.error() {
            Line::from(Span::styled(
                format!("Failed to load friends: {}", msg),
                Style::default().fg(Color::Red),
            ))
        } else {
            Line::from(Span::styled(
                "Loading...",
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::ITALIC),
            ))
        };
        f.render_widget(Paragraph::new(text).block(block), area);
        return;
    };

    if list.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from("No friends added yet"),
            Line::from(Span::styled(
                "Use the form above to add friends",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        f.render_widget(empty, area);
        return;
    }

    let visible = filter_friends(list, &app.manage_filter);
    if visible.is_empty() {
        let none = Paragraph::new(format!(
            "No friends match \"{}\"",
            app.manage_filter
        ))
        .block(block);
        f.render_widget(none, area);
        return;
    }

    let items: Vec<ListItem> = visible
        .iter()
        .enumerate()
        .map(|(i, friend)| {
            let selected = i == app.manage_selected;
            let marker = if selected { "> " } else { "  " };
            let (dot, color) = if friend.online {
                ("●", Color::Green)
            } else {
                ("○", Color::DarkGray)
            };
            let style = if selected {
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(vec![
                Span::raw(marker.to_string()),
                Span::styled(format!("{} ", dot), Style::default().fg(color)),
                Span::styled(friend.username.clone(), style),
            ]))
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}

fn draw_confirm_overlay(f: &mut Frame, username: &str) {
    let area = centered_rect(50, 25, f.size());
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Remove {}? ", username))
        .style(Style::default().fg(Color::Red));

    let lines = vec![
        Line::from(""),
        Line::from(format!(
            "This will remove {} from your friends list.",
            username
        )),
        Line::from("You can add them again later."),
        Line::from(""),
        Line::from(Span::styled(
            "y=remove  n=cancel",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn friends() -> Vec<Friend> {
        ["Alice", "bob", "Bobby", "carol"]
            .iter()
            .map(|name| Friend {
                username: name.to_string(),
                online: false,
            })
            .collect()
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let all = friends();
        let hits = filter_friends(&all, "BOB");
        let names: Vec<&str> = hits.iter().map(|f| f.username.as_str()).collect();
        assert_eq!(names, vec!["bob", "Bobby"]);
    }

    #[test]
    fn empty_filter_keeps_everything_in_order() {
        let all = friends();
        assert_eq!(filter_friends(&all, "").len(), all.len());
    }

    #[test]
    fn filter_does_not_mutate_the_source() {
        let all = friends();
        let _ = filter_friends(&all, "zzz");
        assert_eq!(all.len(), 4);
    }
}
