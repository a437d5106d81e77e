pub mod command_bar;
pub mod help;
pub mod input;
pub mod message;
pub mod message_list;
pub mod search;
pub mod status_bar;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

use crate::app::{App, AppMode};

use command_bar::CommandBar;
use help::HelpView;
use search::SearchView;
use status_bar::StatusBar;

pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Layout: main content + status bar + optional command bar
    let bottom_height = if app.mode == AppMode::Command { 2 } else { 1 };

    let [main_area, bottom_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(bottom_height)]).areas(area);

    if app.mode == AppMode::Command {
        let [status_area, cmd_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(bottom_area);
        frame.render_widget(StatusBar::new(app), status_area);
        frame.render_widget(CommandBar::new(app), cmd_area);
    } else {
        frame.render_widget(StatusBar::new(app), bottom_area);
    }

    frame.render_widget(SearchView::new(app), main_area);

    if app.show_help {
        frame.render_widget(HelpView::new(), main_area);
    }
}
