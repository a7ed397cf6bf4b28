use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{App, AppMode};

/// F-key definitions: (key_label, description)
const FKEYS_NORMAL: &[(&str, &str)] = &[
    ("F1", "Help  "),
    ("Z", "Pause "),
    ("F10", "Quit "),
];

const FKEYS_HELP: &[(&str, &str)] = &[
    ("Esc", "Close "),
    ("F10", "Quit "),
];

/// Draw the bottom F-key bar (htop styling)
/// Fn key in black-on-cyan, description in white-on-black
pub fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    // Full-width dark background first
    let bg_fill = " ".repeat(area.width as usize);
    f.render_widget(
        Paragraph::new(bg_fill).style(Style::default().bg(Color::Indexed(234))),
        area,
    );

    let fkeys = match app.mode {
        AppMode::Help => FKEYS_HELP,
        AppMode::Normal => FKEYS_NORMAL,
    };

    let mut spans: Vec<Span> = Vec::new();

    for (key, desc) in fkeys {
        spans.push(Span::styled(
            key.to_string(),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            desc.to_string(),
            Style::default()
                .fg(Color::Indexed(252)) // light gray
                .bg(Color::Indexed(234)), // very dark gray
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
