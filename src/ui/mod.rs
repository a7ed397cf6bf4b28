pub mod details;
pub mod footer;
pub mod header;
pub mod help;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Frame;

use crate::app::{App, AppMode};

/// Header rows: Net meter, sample time, app usage
pub const HEADER_HEIGHT: u16 = 3;

/// Render the complete UI
pub fn draw(f: &mut Frame, app: &App) {
    let size = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT), // meters
            Constraint::Min(3),                // sampling details
            Constraint::Length(1),             // footer (F-key bar)
        ])
        .split(size);

    header::draw_header(f, app, chunks[0]);
    details::draw_details(f, app, chunks[1]);
    footer::draw_footer(f, app, chunks[2]);

    if app.mode == AppMode::Help {
        help::draw_help(f);
    }
}
