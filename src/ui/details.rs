use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::App;

/// Sampling setup and raw values, one per row
pub fn draw_details(f: &mut Frame, app: &App, area: Rect) {
    let row = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!(" {:<18}", label), Style::default().fg(Color::Cyan)),
            Span::styled(value, Style::default().fg(Color::White)),
        ])
    };

    let raw_speed = if app.has_sample() {
        format!("{} bytes", app.speed.bytes_per_second)
    } else {
        "-".to_string()
    };
    let (sent, received) = match app.usage {
        Some(u) => (u.bytes_sent.to_string(), u.bytes_received.to_string()),
        None => ("-".to_string(), "-".to_string()),
    };

    let mut lines = vec![
        row("Last delta", raw_speed),
        row("Uid bytes sent", sent),
        row("Uid bytes received", received),
        row("Loopback counted", if app.include_loopback { "yes" } else { "no" }.to_string()),
        row("Usage poll", format!("{}ms", app.usage_interval.as_millis())),
        row("Refreshes", app.tick.to_string()),
    ];
    if app.speed.bytes_per_second < 0 {
        lines.push(Line::from(Span::styled(
            " Negative delta: host counters were reset during the window",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Sampling ")
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(paragraph, area);
}
