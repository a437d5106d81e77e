use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;

use crate::app::{App, AppMode, Focus};

/// Bottom status bar showing mode, room, result count, and status messages.
pub struct StatusBar<'a> {
    pub app: &'a App,
}

impl<'a> StatusBar<'a> {
    pub fn new(app: &'a App) -> Self {
        Self { app }
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        // Background
        let bg_style = Style::default().bg(Color::DarkGray).fg(Color::White);
        for x in area.x..area.x + area.width {
            buf[(x, area.y)].set_style(bg_style);
        }

        let mut spans = Vec::new();

        // Mode indicator
        let (mode_str, mode_bg) = match (self.app.mode, self.app.focus) {
            (AppMode::Command, _) => (" COMMAND ", Color::Magenta),
            (AppMode::Normal, Focus::Input) => (" INPUT ", Color::Yellow),
            (AppMode::Normal, Focus::List) => (" LIST ", Color::Blue),
        };
        let mode_style = Style::default()
            .bg(mode_bg)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);
        spans.push(Span::styled(mode_str, mode_style));
        spans.push(Span::raw(" "));

        spans.push(Span::styled(format!("Room: {}", self.app.room_label), bg_style));

        let count = self.app.results().len();
        if count > 0 {
            spans.push(Span::styled(format!("  {count} results"), bg_style));
        }

        // Status message (right-aligned)
        if let Some(ref msg) = self.app.status_message {
            let left_width: usize = spans.iter().map(|s| s.width()).sum();
            let msg_width = msg.chars().count().min(area.width as usize);
            let padding = (area.width as usize).saturating_sub(left_width + msg_width);
            if padding > 0 {
                spans.push(Span::styled(" ".repeat(padding), bg_style));
            }
            spans.push(Span::styled(
                msg.chars().take(msg_width).collect::<String>(),
                Style::default().bg(Color::DarkGray).fg(Color::Red),
            ));
        }

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
