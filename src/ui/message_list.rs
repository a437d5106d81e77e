use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::Widget;

use crate::message::Message;
use crate::ui::message::{MessageCard, message_card_height};

const SPINNER: [&str; 10] = [
    "\u{280B}", "\u{2819}", "\u{2839}", "\u{2838}", "\u{283C}", "\u{2834}", "\u{2826}", "\u{2827}",
    "\u{2807}", "\u{280F}",
];

pub fn spinner(frame: usize) -> &'static str {
    SPINNER[frame % SPINNER.len()]
}

/// A scrollable list of search results with selection highlight.
///
/// Shows an activity row above the items while the first page loads and
/// below them while a further page loads.
pub struct MessageList<'a> {
    pub messages: &'a [Message],
    pub selected_index: Option<usize>,
    pub reaction_index: usize,
    pub username: Option<&'a str>,
    pub time_format: &'a str,
    pub edited_label: &'a str,
    /// Header indicator text, shown while the initial search is in flight.
    pub header: Option<String>,
    /// Footer indicator text, shown while a further page is loading.
    pub footer: Option<String>,
    pub empty_text: Option<&'a str>,
}

impl<'a> MessageList<'a> {
    pub fn new(messages: &'a [Message], time_format: &'a str) -> Self {
        Self {
            messages,
            selected_index: None,
            reaction_index: 0,
            username: None,
            time_format,
            edited_label: "edited",
            header: None,
            footer: None,
            empty_text: None,
        }
    }

    pub fn selected(mut self, index: Option<usize>, reaction_index: usize) -> Self {
        self.selected_index = index;
        self.reaction_index = reaction_index;
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

    pub fn header(mut self, header: Option<String>) -> Self {
        self.header = header;
        self
    }

    pub fn footer(mut self, footer: Option<String>) -> Self {
        self.footer = footer;
        self
    }

    pub fn empty_text(mut self, text: Option<&'a str>) -> Self {
        self.empty_text = text;
        self
    }
}

impl Widget for MessageList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let indicator_style = Style::default().fg(Color::Yellow);
        let mut inner = area;

        if let Some(ref header) = self.header {
            buf.set_stringn(inner.x + 1, inner.y, header, inner.width as usize, indicator_style);
            inner.y += 1;
            inner.height -= 1;
        }

        if let Some(ref footer) = self.footer
            && inner.height > 0
        {
            inner.height -= 1;
            buf.set_stringn(
                inner.x + 1,
                inner.y + inner.height,
                footer,
                inner.width as usize,
                indicator_style,
            );
        }

        if inner.height == 0 {
            return;
        }

        if self.messages.is_empty() {
            if let Some(msg) = self.empty_text {
                buf.set_string(
                    inner.x + 1,
                    inner.y,
                    msg,
                    Style::default().fg(Color::DarkGray),
                );
            }
            return;
        }

        let content_width = inner.width.saturating_sub(1); // 1 char left margin
        let available_height = inner.height;

        // Pre-compute heights for each card (including separator).
        let heights: Vec<u16> = self
            .messages
            .iter()
            .map(|m| message_card_height(m, content_width) + 1)
            .collect();

        let selected = self.selected_index.unwrap_or(0);
        let scroll_start = compute_scroll_start(&heights, selected, available_height);

        let mut y = inner.y;
        let mut idx = scroll_start;
        while idx < self.messages.len() && y < inner.y + inner.height {
            let card_h = heights[idx];
            let remaining = inner.y + inner.height - y;
            let render_h = card_h.min(remaining);

            let card_area = Rect::new(inner.x + 1, y, content_width, render_h.saturating_sub(1));

            MessageCard::new(&self.messages[idx], self.time_format)
                .selected(self.selected_index == Some(idx))
                .reaction_index(self.reaction_index)
                .username(self.username)
                .edited_label(self.edited_label)
                .render(card_area, buf);

            y += render_h;

            // Draw separator line
            if y < inner.y + inner.height && idx + 1 < self.messages.len() {
                let sep = "\u{2500}".repeat(content_width as usize);
                buf.set_string(
                    inner.x + 1,
                    y.saturating_sub(1),
                    &sep,
                    Style::default().fg(Color::DarkGray),
                );
            }

            idx += 1;
        }
    }
}

/// Find the smallest scroll start index so that the selected item fits
/// within the available height.
fn compute_scroll_start(heights: &[u16], selected: usize, available: u16) -> usize {
    if heights.is_empty() {
        return 0;
    }

    let selected = selected.min(heights.len() - 1);
    if available == 0 {
        return selected;
    }

    // Build a viewport that always includes the selected item and packs as
    // many previous items as can fit above it.
    let mut start = selected;
    let mut used = heights[selected];

    while start > 0 {
        let next = used.saturating_add(heights[start - 1]);
        if next > available {
            break;
        }
        start -= 1;
        used = next;
    }

    start
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_empty_list() {
        assert_eq!(compute_scroll_start(&[], 0, 10), 0);
    }

    #[test]
    fn advances_when_selected_is_below_exactly_full_window() {
        let heights = [5, 5, 5];
        assert_eq!(compute_scroll_start(&heights, 2, 10), 1);
    }

    #[test]
    fn keeps_selected_item_visible_when_it_is_taller_than_viewport() {
        let heights = [3, 12, 4];
        assert_eq!(compute_scroll_start(&heights, 1, 8), 1);
    }

    #[test]
    fn spinner_cycles() {
        assert_eq!(spinner(0), spinner(SPINNER.len()));
        assert_ne!(spinner(0), spinner(1));
    }

    #[test]
    fn renders_header_and_footer_indicators() {
        let area = Rect::new(0, 0, 20, 4);
        let mut buf = Buffer::empty(area);
        MessageList::new(&[], "%Y")
            .header(Some("* Searching".into()))
            .footer(Some("* Loading more".into()))
            .render(area, &mut buf);

        let row = |y: u16| -> String {
            (0..area.width)
                .map(|x| buf[(x, y)].symbol().to_string())
                .collect::<String>()
                .trim_end()
                .to_string()
        };
        assert_eq!(row(0), " * Searching");
        assert_eq!(row(3), " * Loading more");
    }
}
