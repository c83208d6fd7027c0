pub mod activity;
pub mod colors;
pub mod details;
pub mod tree_view;

use std::rc::Rc;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::Frame;

use agentree::app::App;
use agentree::drag::DropCandidate;

fn outer_layout(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),   // top: tree + details
            Constraint::Length(8), // bottom: generations + activity
            Constraint::Length(1), // status bar
        ])
        .split(area)
}

fn top_layout(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(62), // tree
            Constraint::Percentage(38), // details
        ])
        .split(area)
}

/// Where the tree panel lands for a given frame size. The app hit-tests
/// pointer events against this, so it must match `render`.
pub fn tree_area(area: Rect) -> Rect {
    top_layout(outer_layout(area)[0])[0]
}

pub fn render(f: &mut Frame, app: &App) {
    let outer = outer_layout(f.area());
    let top = top_layout(outer[0]);

    tree_view::render(f, app, top[0]);
    details::render(f, app, top[1]);
    activity::render(f, app, outer[1]);
    render_status_bar(f, app, outer[2]);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    use ratatui::style::{Color, Style};
    use ratatui::text::{Line, Span};
    use ratatui::widgets::Paragraph;

    let status = if app.prompt_mode {
        Line::from(vec![
            Span::styled(" describe agent: ", Style::default().fg(Color::Yellow)),
            Span::raw(&app.prompt_input),
            Span::styled("_", Style::default().fg(Color::Yellow)),
        ])
    } else if let Some(session) = app.drag.session() {
        let name = |id: &str| {
            app.store
                .get(id)
                .map(|n| n.name.clone())
                .unwrap_or_else(|| id.to_string())
        };
        let target = match session.highlight() {
            Some(DropCandidate::Onto(t)) => match t.edge {
                agentree::drag::EdgeKind::Child => format!("into {}", name(&t.target_id)),
                agentree::drag::EdgeKind::Tool => format!("as tool of {}", name(&t.target_id)),
            },
            Some(DropCandidate::Insert(t)) => {
                format!("into {} at {}", name(&t.parent_id), t.index)
            }
            None => "no target".to_string(),
        };
        Line::from(vec![
            Span::styled(" dragging ", Style::default().fg(Color::Yellow)),
            Span::raw(name(&session.source_id)),
            Span::styled(" → ", Style::default().fg(Color::Yellow)),
            Span::raw(target),
            Span::styled("  [esc]", Style::default().fg(Color::DarkGray)),
            Span::raw("cancel"),
        ])
    } else {
        let mut spans = vec![
            Span::styled(" [q]", Style::default().fg(Color::DarkGray)),
            Span::raw("uit "),
            Span::styled("[j/k]", Style::default().fg(Color::DarkGray)),
            Span::raw("nav "),
            Span::styled("[h/l]", Style::default().fg(Color::DarkGray)),
            Span::raw("expand "),
            Span::styled("[J/K]", Style::default().fg(Color::DarkGray)),
            Span::raw("move "),
            Span::styled("[n]", Style::default().fg(Color::DarkGray)),
            Span::raw("ew "),
            Span::styled("[d]", Style::default().fg(Color::DarkGray)),
            Span::raw("elete "),
            Span::styled("[a]", Style::default().fg(Color::DarkGray)),
            Span::raw("i-generate "),
            Span::styled("[tab]", Style::default().fg(Color::DarkGray)),
            Span::raw("focus "),
        ];
        if let Some(status) = &app.status {
            spans.push(Span::styled("│ ", Style::default().fg(Color::DarkGray)));
            spans.push(Span::styled(status.as_str(), Style::default().fg(Color::Yellow)));
        }
        Line::from(spans)
    };

    f.render_widget(
        Paragraph::new(status).style(Style::default().bg(Color::DarkGray).fg(Color::White)),
        area,
    );
}
