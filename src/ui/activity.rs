use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use agentree::app::{App, FocusPanel};

use super::colors;

/// In-flight generations first, then the most recent activity that fits.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let border_style = if app.focus == FocusPanel::Tasks {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let running = app.tracker.running();
    let block = Block::default()
        .title(format!(" Generations ({} running) ", running.len()))
        .borders(Borders::ALL)
        .border_style(border_style);

    let max_lines = area.height.saturating_sub(2) as usize;
    let mut lines: Vec<Line> = running
        .into_iter()
        .take(max_lines)
        .map(|(token, description)| {
            let short = token.simple().to_string();
            Line::from(vec![
                Span::styled(
                    format!(" [{}] ", &short[..8]),
                    Style::default().fg(colors::PENDING),
                ),
                Span::styled(description, Style::default().fg(Color::White)),
                Span::styled("  (generating)", Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let room = max_lines.saturating_sub(lines.len());
    let start = app.activity.len().saturating_sub(room);
    lines.extend(app.activity[start..].iter().map(|message| {
        Line::from(vec![
            Span::styled(" · ", Style::default().fg(colors::ACCENT_MUTED)),
            Span::styled(message.as_str(), Style::default().fg(Color::White)),
        ])
    }));

    let paragraph = if lines.is_empty() {
        Paragraph::new(Line::from(Span::styled(
            "  No activity yet",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block)
    } else {
        Paragraph::new(lines).block(block)
    };

    f.render_widget(paragraph, area);
}
