use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Widget;
use unicode_width::UnicodeWidthChar;

/// A simple single-line text input renderer.
///
/// Renders the prompt + text content, with a cursor indicator at the end when
/// focused. An empty, unfocused-or-focused field shows its placeholder.
pub struct TextInput<'a> {
    pub prompt: &'a str,
    pub text: &'a str,
    pub placeholder: Option<&'a str>,
    pub focused: bool,
    pub style: Style,
}

impl<'a> TextInput<'a> {
    pub fn new(prompt: &'a str, text: &'a str) -> Self {
        Self {
            prompt,
            text,
            placeholder: None,
            focused: true,
            style: Style::default().fg(Color::White),
        }
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

/// The longest suffix of `s` that fits in `max_width` terminal columns.
pub fn tail_fitting(s: &str, max_width: usize) -> &str {
    let mut width = 0;
    let mut start = s.len();
    for (idx, ch) in s.char_indices().rev() {
        let w = ch.width().unwrap_or(0);
        if width + w > max_width {
            break;
        }
        width += w;
        start = idx;
    }
    &s[start..]
}

impl Widget for TextInput<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let cursor = if self.focused { "\u{2588}" } else { "" };

        if self.text.is_empty()
            && let Some(placeholder) = self.placeholder
        {
            let width = area.width as usize;
            let (x, _) = buf.set_stringn(area.x, area.y, self.prompt, width, self.style);
            let (x, _) = buf.set_stringn(x, area.y, cursor, width, self.style);
            let remaining = (area.x + area.width).saturating_sub(x) as usize;
            buf.set_stringn(
                x,
                area.y,
                placeholder,
                remaining,
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            );
            return;
        }

        let display = format!("{}{}{cursor}", self.prompt, self.text);
        // If the display is wider than the area, show the rightmost portion.
        let visible = tail_fitting(&display, area.width as usize);
        buf.set_string(area.x, area.y, visible, self.style);
    }
}
