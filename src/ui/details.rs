use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use agentree::agents::{AgentKind, AgentNode};
use agentree::app::{App, FocusPanel};

use super::colors;

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let border_style = if app.focus == FocusPanel::Details {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .title(" Details ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let lines = match app.selected_agent() {
        Some(node) => agent_lines(app, node),
        None => vec![
            Line::from(""),
            Line::from(Span::styled(
                "  No agent selected",
                Style::default().fg(Color::DarkGray),
            )),
        ],
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn agent_lines<'a>(app: &'a App, node: &'a AgentNode) -> Vec<Line<'a>> {
    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(
                node.name.as_str(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  ({})", node.kind_label()),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        field("  Id", node.id.clone()),
    ];
    if !node.description.is_empty() {
        lines.push(field("  Description", node.description.clone()));
    }

    match &node.kind {
        AgentKind::Llm(llm) => {
            lines.push(field("  Model", llm.model.clone()));
            if let Some(key) = &llm.output_key {
                lines.push(field("  Output key", key.clone()));
            }
            if !llm.instruction.is_empty() {
                lines.push(field("  Instruction", llm.instruction.clone()));
            }
        }
        AgentKind::Loop(lp) => {
            let max = lp
                .max_iterations
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unbounded".to_string());
            lines.push(field("  Max iterations", max));
        }
        AgentKind::Remote(remote) => {
            lines.push(field("  Agent card", remote.agent_card_url.clone()));
        }
        AgentKind::Sequential(_) | AgentKind::Parallel(_) => {}
    }

    if node.can_own_children() {
        lines.push(field("  Sub-agents", node.children().len().to_string()));
    }
    if node.can_own_tools() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  Tools: {}", node.tools().len()),
            Style::default().fg(Color::White),
        )));
        for tool in node.tools() {
            lines.push(Line::from(vec![
                Span::styled("  \u{251c}\u{2500} ", Style::default().fg(Color::DarkGray)),
                Span::styled(tool.to_string(), Style::default().fg(colors::ACCENT_MUTED)),
            ]));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  Registry: ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!(
            "{} mcp, {} custom",
            app.registry.mcp_count(),
            app.registry.custom_count()
        )),
    ]));
    lines
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(Color::DarkGray)),
        Span::styled(value, Style::default().fg(Color::White)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::test_support::*;
    use agentree::agents::{AgentNode, ToolRef};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen(app: &App) -> String {
        let backend = TestBackend::new(50, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| render(f, app, f.area())).unwrap();
        (0..20)
            .map(|row| row_text(terminal.backend(), row))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn shows_llm_fields_and_tools() {
        let mut node = AgentNode::llm("writer").with_id("w");
        if let Some(tools) = node.tools_mut() {
            tools.push(ToolRef::Builtin {
                name: "google_search".into(),
            });
        }
        let (app, _rt, _rx) = test_app(vec![node]);
        let text = screen(&app);
        assert!(text.contains("writer  (llm)"));
        assert!(text.contains("Model: gemini-2.5-flash"));
        assert!(text.contains("Tools: 1"));
        assert!(text.contains("builtin:google_search"));
    }

    #[test]
    fn shows_loop_bound() {
        let node = AgentNode::looping("refine", Some(3)).with_id("r");
        let (app, _rt, _rx) = test_app(vec![node]);
        let text = screen(&app);
        assert!(text.contains("Max iterations: 3"));
        assert!(text.contains("Sub-agents: 0"));
    }

    #[test]
    fn empty_store_shows_placeholder() {
        let (app, _rt, _rx) = test_app(Vec::new());
        assert!(screen(&app).contains("No agent selected"));
    }
}
