use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};
use ratatui::Frame;

use agentree::app::{App, FocusPanel, RowKind, TreeRow};
use agentree::drag::{DropCandidate, EdgeKind};

use super::colors;

/// How the active drag relates to one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DropMark {
    None,
    Source,
    Child,
    Tool,
    InsertBefore,
}

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let border_style = if app.focus == FocusPanel::Tree {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .title(format!(" Agents ({}) ", app.store.len()))
        .borders(Borders::ALL)
        .border_style(border_style);

    // Rows are sliced at the app's scroll offset so pointer hit-testing and
    // rendering agree on which row sits where.
    let start = app.scroll_offset.min(app.tree_rows.len());
    let items: Vec<ListItem> = app.tree_rows[start..]
        .iter()
        .map(|row| ListItem::new(row_line(row, drop_mark(app, row))))
        .collect();

    let mut state = ListState::default();
    let visible = area.height.saturating_sub(2) as usize;
    if (start..start + visible).contains(&app.selected_index) {
        state.select(Some(app.selected_index - start));
    }

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .bg(colors::HIGHLIGHT_BG)
            .fg(colors::HIGHLIGHT_FG)
            .add_modifier(Modifier::BOLD),
    );

    f.render_stateful_widget(list, area, &mut state);
}

fn row_line(row: &TreeRow, mark: DropMark) -> Line<'_> {
    let indent_style = if mark == DropMark::InsertBefore {
        Style::default().bg(colors::DROP_INSERT)
    } else {
        Style::default()
    };
    let icon = match row.kind {
        RowKind::Cycle => "↻ ",
        RowKind::ToolHeader => {
            if row.has_children {
                "▾ "
            } else {
                "  "
            }
        }
        RowKind::Tool => "· ",
        RowKind::Agent if row.has_children => {
            if row.is_expanded {
                "▼ "
            } else {
                "▶ "
            }
        }
        RowKind::Agent => "  ",
    };

    let mut spans = vec![
        Span::styled("  ".repeat(row.depth), indent_style),
        Span::styled(icon, Style::default().fg(Color::DarkGray)),
    ];

    let mut name_style = match row.kind {
        RowKind::Agent => Style::default().fg(kind_color(&row.label)),
        RowKind::Cycle => Style::default().fg(colors::CYCLE),
        RowKind::ToolHeader => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
        RowKind::Tool => Style::default().fg(colors::TOOL),
    };
    match mark {
        DropMark::Source => name_style = name_style.fg(colors::DRAG_SOURCE),
        DropMark::Child => name_style = name_style.bg(colors::DROP_CHILD_BG),
        DropMark::Tool => name_style = name_style.bg(colors::DROP_TOOL_BG),
        DropMark::InsertBefore | DropMark::None => {}
    }

    if row.is_agent() {
        spans.push(Span::styled(
            format!("{} ", row.label),
            Style::default().fg(Color::DarkGray),
        ));
    }
    spans.push(Span::styled(row.display_name.as_str(), name_style));
    if row.kind == RowKind::Cycle {
        spans.push(Span::styled(
            "  (already above)",
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

fn drop_mark(app: &App, row: &TreeRow) -> DropMark {
    let Some(session) = app.drag.session() else {
        return DropMark::None;
    };
    match session.highlight() {
        Some(DropCandidate::Onto(t)) if t.target_id == row.node_id => match (t.edge, row.kind) {
            (EdgeKind::Child, RowKind::Agent) => return DropMark::Child,
            (EdgeKind::Tool, RowKind::ToolHeader) => return DropMark::Tool,
            _ => {}
        },
        Some(DropCandidate::Insert(t))
            if row.is_agent()
                && row.parent_id.as_deref() == Some(t.parent_id.as_str())
                && row.sibling_index == t.index =>
        {
            return DropMark::InsertBefore;
        }
        _ => {}
    }
    if row.is_agent() && row.node_id == session.source_id {
        DropMark::Source
    } else {
        DropMark::None
    }
}

fn kind_color(label: &str) -> Color {
    match label {
        "llm" => colors::KIND_LLM,
        "seq" => colors::KIND_SEQUENTIAL,
        "par" => colors::KIND_PARALLEL,
        "loop" => colors::KIND_LOOP,
        "remote" => colors::KIND_REMOTE,
        _ => Color::White,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::test_support::*;
    use agentree::agents::AgentNode;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn draw(app: &App) -> Terminal<TestBackend> {
        let backend = TestBackend::new(60, 14);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| render(f, app, f.area())).unwrap();
        terminal
    }

    #[test]
    fn kind_color_variants() {
        assert_eq!(kind_color("llm"), colors::KIND_LLM);
        assert_eq!(kind_color("seq"), colors::KIND_SEQUENTIAL);
        assert_eq!(kind_color("par"), colors::KIND_PARALLEL);
        assert_eq!(kind_color("loop"), colors::KIND_LOOP);
        assert_eq!(kind_color("remote"), colors::KIND_REMOTE);
    }

    #[test]
    fn renders_nested_rows_with_indent() {
        let (app, _rt, _rx) = test_app(vec![seq("pipeline", &["stage"]), seq("stage", &[])]);
        let terminal = draw(&app);
        let backend = terminal.backend();
        assert!(row_text(backend, 1).contains("▼ seq pipeline"));
        let parent_col = column_of(backend, 1, "pipeline").unwrap();
        let child_col = column_of(backend, 2, "stage").unwrap();
        assert_eq!(child_col, parent_col + 2);
    }

    #[test]
    fn cycle_row_is_marked() {
        let (app, _rt, _rx) = test_app(vec![seq("a", &["b"]), seq("b", &["a"])]);
        let terminal = draw(&app);
        assert!(row_text(terminal.backend(), 3).contains("↻ seq a  (already above)"));
        assert_eq!(fg_color_of(terminal.backend(), 3, "a  (already"), Some(colors::CYCLE));
    }

    #[test]
    fn scrolled_view_starts_at_offset() {
        let nodes = (0..20).map(|i| seq(&format!("n{i:02}"), &[])).collect();
        let (mut app, _rt, _rx) = test_app(nodes);
        app.scroll_offset = 5;
        let terminal = draw(&app);
        assert!(row_text(terminal.backend(), 1).contains("n05"));
    }

    #[test]
    fn child_drop_target_is_highlighted() {
        let (mut app, _rt, _rx) = test_app(vec![seq("alpha", &[]), seq("beta", &[])]);
        app.selected_index = 1;
        app.drag.begin("beta");
        app.drag
            .hover(&app.store, &[DropCandidate::child("alpha")]);
        let terminal = draw(&app);
        assert_eq!(
            bg_color_of(terminal.backend(), 1, "alpha"),
            Some(colors::DROP_CHILD_BG)
        );
    }

    #[test]
    fn tool_drop_target_highlights_header() {
        let helper = AgentNode::llm("helper").with_id("helper");
        let owner = AgentNode::llm("owner").with_id("owner");
        let (mut app, _rt, _rx) = test_app(vec![owner, helper]);
        app.selected_index = 3;
        app.drag.begin("helper");
        app.drag.hover(&app.store, &[DropCandidate::tool("owner")]);
        let terminal = draw(&app);
        // Row 2 is owner's tools header.
        assert_eq!(
            bg_color_of(terminal.backend(), 2, "tools"),
            Some(colors::DROP_TOOL_BG)
        );
    }

    #[test]
    fn insert_target_marks_indent() {
        let (mut app, _rt, _rx) = test_app(vec![
            seq("p", &["a", "b"]),
            seq("a", &[]),
            seq("b", &[]),
        ]);
        app.drag.begin("b");
        app.drag.hover(&app.store, &[DropCandidate::insert("p", 0)]);
        let terminal = draw(&app);
        // Row 2 is "a" at depth 1; its indent starts just inside the border.
        assert_eq!(terminal.backend().buffer()[(1, 2)].bg, colors::DROP_INSERT);
    }
}
