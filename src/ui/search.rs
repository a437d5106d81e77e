use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget, Wrap};

use crate::app::{App, Focus};
use crate::i18n::t;
use crate::ui::input::TextInput;
use crate::ui::message_list::{MessageList, spinner};

/// The message search screen: labelled input, syntax hint, divider, results.
pub struct SearchView<'a> {
    pub app: &'a App,
}

impl<'a> SearchView<'a> {
    pub fn new(app: &'a App) -> Self {
        Self { app }
    }
}

impl Widget for SearchView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = self.app;
        let locale = app.locale;

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", t(locale, "Search")))
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .border_style(Style::default().fg(Color::DarkGray));

        let inner = block.inner(area);
        block.render(area, buf);

        let hint = inline_code_line(t(locale, "You_can_search_using_RegExp_eg"));
        let hint_height = hint_rows(&hint, inner.width);

        let [label_area, input_area, hint_area, divider_area, list_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(hint_height),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .areas(inner);

        let focused = app.focus == Focus::Input;
        let label_style = if focused {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        buf.set_stringn(
            label_area.x + 1,
            label_area.y,
            t(locale, "Search"),
            label_area.width as usize,
            label_style,
        );

        TextInput::new("> ", &app.search_input)
            .placeholder(t(locale, "Search_Messages"))
            .focused(focused)
            .render(pad_left(input_area), buf);

        Paragraph::new(hint)
            .wrap(Wrap { trim: true })
            .render(pad_left(hint_area), buf);

        let divider = "\u{2500}".repeat(divider_area.width as usize);
        buf.set_string(
            divider_area.x,
            divider_area.y,
            divider,
            Style::default().fg(Color::DarkGray),
        );

        let state = app.search.state();
        let frame = spinner(app.spinner_frame);
        let header = state
            .searching
            .then(|| format!("{frame} {}", t(locale, "Searching")));
        let footer = state
            .loading_more
            .then(|| format!("{frame} {}", t(locale, "Loading_more")));
        let empty_text = (!app.search.query().text.is_empty() && !state.searching)
            .then(|| t(locale, "No_results_found"));

        let selected = (app.focus == Focus::List).then_some(app.selected_index);

        MessageList::new(app.results(), &app.config.time_format)
            .selected(selected, app.reaction_index)
            .username(app.username.as_deref())
            .edited_label(t(locale, "Edited"))
            .header(header)
            .footer(footer)
            .empty_text(empty_text)
            .render(list_area, buf);
    }
}

fn pad_left(area: Rect) -> Rect {
    Rect {
        x: area.x + 1,
        width: area.width.saturating_sub(1),
        ..area
    }
}

/// Render backtick-delimited spans as inline code.
pub fn inline_code_line(text: &str) -> Line<'_> {
    let code_style = Style::default()
        .fg(Color::Magenta)
        .bg(Color::Black)
        .add_modifier(Modifier::BOLD);
    let plain = Style::default().fg(Color::DarkGray);

    let spans: Vec<Span<'_>> = text
        .split('`')
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .map(|(i, part)| {
            // Odd segments sit between a pair of backticks.
            let style = if i % 2 == 1 { code_style } else { plain };
            Span::styled(part, style)
        })
        .collect();
    Line::from(spans)
}

fn hint_rows(line: &Line<'_>, width: u16) -> u16 {
    let usable = usize::from(width.saturating_sub(1)).max(1);
    let rows = line.width().div_ceil(usable).max(1);
    u16::try_from(rows).unwrap_or(1).min(3)
}
