use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use netsample::system::network::{format_bytes, format_rate};

use crate::app::App;

/// 1 Gbps in bytes/sec, the visual max of the Net bar
const NET_BAR_MAX: f64 = 125_000_000.0;

const LABEL: Color = Color::Cyan;
const VALUE: Color = Color::White;
const BAR: Color = Color::Green;
const BAR_NEGATIVE: Color = Color::Red;
const DIM: Color = Color::DarkGray;

/// Draw the three header rows:
///
///   Net[||||||||                     1.2 M/s]
///   Sampled: 14:03:27  window 1000ms  every 3000ms
///   App uid 10123: 12M sent, 300M received
pub fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let area = Rect {
        x: area.x + 1,
        y: area.y,
        width: area.width.saturating_sub(2),
        height: area.height,
    };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    draw_network_bar(f, app, rows[0]);
    draw_sample_line(f, app, rows[1]);
    draw_usage_line(f, app, rows[2]);
}

/// Draw: "Net[||||||      1.2 M/s]"
fn draw_network_bar(f: &mut Frame, app: &App, area: Rect) {
    let bps = app.speed.bytes_per_second;
    let suffix = if app.has_sample() {
        format_rate(bps)
    } else {
        "sampling...".to_string()
    };

    let prefix = "Net";
    let bar_width = area.width as usize;
    let bracket_len = 2;
    let available = bar_width.saturating_sub(prefix.len() + suffix.len() + bracket_len + 1);

    // A negative sample (counter reset) draws no bar
    let frac = (bps.max(0) as f64 / NET_BAR_MAX).min(1.0);
    let filled = ((frac * available as f64) as usize).min(available);
    let empty = available.saturating_sub(filled);

    let suffix_color = if bps < 0 { BAR_NEGATIVE } else { VALUE };
    let line = Line::from(vec![
        Span::styled(prefix, Style::default().fg(LABEL).add_modifier(Modifier::BOLD)),
        Span::styled("[", Style::default().fg(LABEL)),
        Span::styled("|".repeat(filled), Style::default().fg(BAR)),
        Span::styled(" ".repeat(empty), Style::default().fg(DIM)),
        Span::styled(" ", Style::default()),
        Span::styled(suffix, Style::default().fg(suffix_color).add_modifier(Modifier::BOLD)),
        Span::styled("]", Style::default().fg(LABEL)),
    ]);

    f.render_widget(Paragraph::new(line), area);
}

/// Draw: "Sampled: 14:03:27  window 1000ms  every 3000ms"
fn draw_sample_line(f: &mut Frame, app: &App, area: Rect) {
    let when = if app.has_sample() {
        app.speed.measured_at.format("%H:%M:%S").to_string()
    } else {
        "--:--:--".to_string()
    };

    let mut spans = vec![
        Span::styled("Sampled: ", Style::default().fg(LABEL).add_modifier(Modifier::BOLD)),
        Span::styled(when, Style::default().fg(VALUE).add_modifier(Modifier::BOLD)),
        Span::styled(
            format!(
                "  window {}ms  every {}ms",
                app.window.as_millis(),
                app.speed_interval.as_millis()
            ),
            Style::default().fg(VALUE),
        ),
    ];
    if app.paused {
        spans.push(Span::styled(
            "  PAUSED",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Draw: "App uid 10123: 12M sent, 300M received"
fn draw_usage_line(f: &mut Frame, app: &App, area: Rect) {
    let label = match app.uid {
        Some(uid) => format!("App uid {}: ", uid),
        None => "App: ".to_string(),
    };

    let value = match (app.uid, app.usage) {
        (None, _) => Span::styled("no uid set (--uid)", Style::default().fg(DIM)),
        (Some(_), _) if !app.per_uid_supported => {
            Span::styled("per-uid counters unavailable", Style::default().fg(DIM))
        }
        (Some(_), None) => Span::styled("waiting...", Style::default().fg(DIM)),
        (Some(_), Some(usage)) => Span::styled(
            format!(
                "{} sent, {} received",
                format_bytes(usage.bytes_sent),
                format_bytes(usage.bytes_received)
            ),
            Style::default().fg(VALUE).add_modifier(Modifier::BOLD),
        ),
    };

    let line = Line::from(vec![
        Span::styled(label, Style::default().fg(LABEL).add_modifier(Modifier::BOLD)),
        value,
    ]);
    f.render_widget(Paragraph::new(line), area);
}
