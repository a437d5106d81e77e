use chrono::Local;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;
use unicode_width::UnicodeWidthStr;

use crate::message::{Message, format_timestamp};

/// Renders a single search result as a compact card.
///
/// Layout:
///   @username Name · March 3rd 2024, 4:05:09 pm (edited)
///   Message text (may wrap) ...
///   [attachment title]
///   :+1: 2  :tada: 1
pub struct MessageCard<'a> {
    pub message: &'a Message,
    pub time_format: &'a str,
    pub selected: bool,
    /// Highlighted reaction when the card is selected.
    pub reaction_index: usize,
    /// The current user, whose own reactions are marked.
    pub username: Option<&'a str>,
    pub edited_label: &'a str,
}

impl<'a> MessageCard<'a> {
    pub fn new(message: &'a Message, time_format: &'a str) -> Self {
        Self {
            message,
            time_format,
            selected: false,
            reaction_index: 0,
            username: None,
            edited_label: "edited",
        }
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn reaction_index(mut self, index: usize) -> Self {
        self.reaction_index = index;
        self
    }

    pub fn username(mut self, username: Option<&'a str>) -> Self {
        self.username = username;
        self
    }

    pub fn edited_label(mut self, label: &'a str) -> Self {
        self.edited_label = label;
        self
    }
}

impl Widget for MessageCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let highlight_style = if self.selected {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        let bottom = area.y + area.height;
        let mut y = area.y;

        // -- Line 1: author + timestamp --
        let author = &self.message.author;
        let mut header_spans = vec![Span::styled(
            format!("@{}", author.username),
            highlight_style.add_modifier(Modifier::BOLD),
        )];

        if let Some(name) = &author.name {
            header_spans.push(Span::raw(" "));
            header_spans.push(Span::styled(
                name.as_str(),
                Style::default().fg(Color::DarkGray),
            ));
        }

        if let Some(ts) = self.message.ts {
            header_spans.push(Span::styled(
                format!(
                    " \u{00B7} {}",
                    format_timestamp(ts.with_timezone(&Local), self.time_format)
                ),
                Style::default().fg(Color::DarkGray),
            ));
        }

        if self.message.edited {
            header_spans.push(Span::styled(
                format!(" ({})", self.edited_label),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ));
        }

        buf.set_line(area.x, y, &Line::from(header_spans), area.width);
        y += 1;

        // -- Body --
        let width = area.width as usize;
        let text_style = if self.selected {
            Style::default().fg(Color::White)
        } else {
            Style::default()
        };
        for line_text in body_lines(self.message, width) {
            if y >= bottom {
                return;
            }
            buf.set_stringn(area.x, y, &line_text, width, text_style);
            y += 1;
        }

        for title in &self.message.attachments {
            if y >= bottom {
                return;
            }
            buf.set_stringn(
                area.x,
                y,
                format!("[{title}]"),
                width,
                Style::default().fg(Color::Blue),
            );
            y += 1;
        }

        // -- Reactions --
        if y >= bottom || self.message.reactions.is_empty() {
            return;
        }
        let mut spans = Vec::new();
        for (i, reaction) in self.message.reactions.iter().enumerate() {
            let mine = self.username.is_some_and(|u| reaction.includes(u));
            let mut style = if mine {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::Gray)
            };
            if self.selected && i == self.reaction_index {
                style = style.add_modifier(Modifier::REVERSED);
            }
            if i > 0 {
                spans.push(Span::raw("  "));
            }
            spans.push(Span::styled(
                format!("{} {}", reaction.emoji, reaction.count()),
                style,
            ));
        }
        buf.set_line(area.x, y, &Line::from(spans), area.width);
    }
}

fn body_lines(message: &Message, width: usize) -> Vec<String> {
    match &message.system_type {
        Some(kind) if message.text.is_empty() => vec![format!("[{kind}]")],
        _ => wrap_text(&message.text, width),
    }
}

/// Height in lines needed for a message card.
pub fn message_card_height(message: &Message, width: u16) -> u16 {
    let body = body_lines(message, width as usize).len();
    let reactions = usize::from(!message.reactions.is_empty());
    let lines = 1 + body + message.attachments.len() + reactions;
    u16::try_from(lines).unwrap_or(u16::MAX)
}

pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![];
    }
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        if paragraph.is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current = word.to_string();
            } else if current.width() + 1 + word.width() <= width {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(current);
                current = word.to_string();
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
