use std::collections::HashSet;

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;
use tracing::info;

use crate::agents::{AgentId, AgentNode};
use crate::drag::{AutoScroll, DragCoordinator, DropCandidate, DropOutcome, EdgeKind};
use crate::generation::{
    apply_settled, FailureReporter, GenerationSettled, GenerationTracker, TracingReporter,
};
use crate::project::ToolRegistry;
use crate::store::AgentStore;
use crate::tree::{attach_child, compute_roots, detach_tool, shift_among_siblings};

/// What a rendered row stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Agent,
    /// A node already on the path from its root; shown once, never expanded.
    Cycle,
    /// Drop zone for agent-as-tool references of the owning agent.
    ToolHeader,
    Tool,
}

/// A flattened row in the tree view, ready for rendering.
#[derive(Debug, Clone)]
pub struct TreeRow {
    /// The agent this row shows, or the owning agent for tool rows.
    pub node_id: AgentId,
    pub display_name: String,
    pub label: String,
    pub depth: usize,
    pub kind: RowKind,
    pub is_expanded: bool,
    pub has_children: bool,
    /// Structural parent in this rendering (None for roots and tool rows).
    pub parent_id: Option<AgentId>,
    /// Position in the parent's child list, dangling ids included.
    pub sibling_index: usize,
    /// Rendered agent ancestors, root first.
    pub ancestors: Vec<AgentId>,
    pub tool_index: Option<usize>,
}

impl TreeRow {
    pub fn is_agent(&self) -> bool {
        matches!(self.kind, RowKind::Agent | RowKind::Cycle)
    }

    /// Column (relative to the list's inner area) where the label starts.
    pub fn label_column(&self) -> u16 {
        (self.depth * 2 + 2) as u16
    }
}

/// Which panel is focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPanel {
    Tree,
    Details,
    Tasks,
}

pub struct App {
    pub store: AgentStore,
    pub registry: ToolRegistry,
    pub tracker: GenerationTracker,
    pub drag: DragCoordinator,
    pub autoscroll: AutoScroll,
    pub should_quit: bool,

    // Tree view state.
    pub tree_rows: Vec<TreeRow>,
    pub selected_index: usize,
    pub collapsed: HashSet<AgentId>,
    pub scroll_offset: usize,
    /// Outer rect of the tree panel (borders included), set by the renderer's layout.
    pub viewport: Rect,
    pub drag_pointer: Option<(u16, u16)>,
    /// Agent row under a left press that has not moved off that row yet.
    pressed: Option<(AgentId, u16)>,

    pub focus: FocusPanel,

    // Generation prompt.
    pub prompt_mode: bool,
    pub prompt_input: String,

    // Recent editor messages, newest last.
    pub activity: Vec<String>,
    /// Latest message, shown in the status bar until the next one.
    pub status: Option<String>,

    reporter: Box<dyn FailureReporter>,
}

impl App {
    pub fn new(store: AgentStore, registry: ToolRegistry, tracker: GenerationTracker) -> Self {
        let mut app = Self {
            store,
            registry,
            tracker,
            drag: DragCoordinator::new(),
            autoscroll: AutoScroll::default(),
            should_quit: false,
            tree_rows: Vec::new(),
            selected_index: 0,
            collapsed: HashSet::new(),
            scroll_offset: 0,
            viewport: Rect::default(),
            drag_pointer: None,
            pressed: None,
            focus: FocusPanel::Tree,
            prompt_mode: false,
            prompt_input: String::new(),
            activity: Vec::new(),
            status: None,
            reporter: Box::new(TracingReporter),
        };
        app.rebuild_tree_rows();
        app
    }

    pub fn with_reporter(mut self, reporter: Box<dyn FailureReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Rebuild the flattened rows from the store + collapsed state.
    pub fn rebuild_tree_rows(&mut self) {
        let mut rows = Vec::new();
        let mut path = Vec::new();
        for (idx, root) in compute_roots(&self.store).iter().enumerate() {
            flatten_agent(&self.store, root, None, idx, &self.collapsed, &mut path, &mut rows);
        }
        self.tree_rows = rows;
        if self.selected_index >= self.tree_rows.len() {
            self.selected_index = self.tree_rows.len().saturating_sub(1);
        }
        self.clamp_scroll();
    }

    pub fn selected_row(&self) -> Option<&TreeRow> {
        self.tree_rows.get(self.selected_index)
    }

    /// The agent under the cursor; tool rows resolve to their owner.
    pub fn selected_agent(&self) -> Option<&AgentNode> {
        self.selected_row().and_then(|r| self.store.get(&r.node_id))
    }

    /// Move the cursor to the first row showing `id`, if visible.
    pub fn select_node(&mut self, id: &str) -> bool {
        match self
            .tree_rows
            .iter()
            .position(|r| r.is_agent() && r.node_id == id)
        {
            Some(idx) => {
                self.selected_index = idx;
                self.ensure_selected_visible();
                true
            }
            None => false,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if self.prompt_mode {
            self.handle_prompt_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Esc => {
                self.drag.cancel();
                self.drag_pointer = None;
                self.pressed = None;
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Enter => self.toggle_expand(),
            KeyCode::Char('h') | KeyCode::Left => self.collapse_current(),
            KeyCode::Char('G') => self.select_last(),
            KeyCode::Char('g') => self.select_first(),
            KeyCode::Char('J') => self.shift_selected(1),
            KeyCode::Char('K') => self.shift_selected(-1),
            KeyCode::Char('n') => self.add_agent(),
            KeyCode::Char('d') => self.delete_selected(),
            KeyCode::Char('a') => {
                self.prompt_mode = true;
                self.prompt_input.clear();
            }
            KeyCode::Tab => self.cycle_focus(),
            KeyCode::PageDown => self.move_selection(20),
            KeyCode::PageUp => self.move_selection(-20),
            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.prompt_mode = false;
                self.prompt_input.clear();
            }
            KeyCode::Enter => {
                self.prompt_mode = false;
                let description = std::mem::take(&mut self.prompt_input);
                let description = description.trim();
                if !description.is_empty() {
                    self.tracker.start(description);
                    self.push_activity(format!("generating: {description}"));
                }
            }
            KeyCode::Backspace => {
                self.prompt_input.pop();
            }
            KeyCode::Char(c) => {
                self.prompt_input.push(c);
            }
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let pointer = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(idx) = self.row_at(pointer.1) else {
                    return;
                };
                self.selected_index = idx;
                let row = &self.tree_rows[idx];
                self.pressed = row.is_agent().then(|| (row.node_id.clone(), pointer.1));
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                // A press becomes a drag only once the pointer leaves its row.
                if !self.drag.is_dragging() {
                    match self.pressed.take() {
                        Some((source, row)) if row != pointer.1 => self.drag.begin(source),
                        pressed => {
                            self.pressed = pressed;
                            return;
                        }
                    }
                }
                self.drag_pointer = Some(pointer);
                self.step_autoscroll();
                self.hover_at(pointer);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.pressed = None;
                if self.drag.is_dragging() {
                    self.drag_pointer = None;
                    self.hover_at(pointer);
                    self.finish_drop();
                }
            }
            MouseEventKind::ScrollUp => self.scroll_by(-3),
            MouseEventKind::ScrollDown => self.scroll_by(3),
            _ => {}
        }
    }

    /// Periodic work: keep scrolling while a drag rests near an edge.
    pub fn on_tick(&mut self) {
        if let Some(pointer) = self.drag_pointer {
            if self.drag.is_dragging() && self.step_autoscroll() {
                self.hover_at(pointer);
            }
        }
    }

    /// Apply a finished background generation.
    pub fn on_generation_settled(&mut self, settled: GenerationSettled) {
        let description = settled.description.clone();
        let failed = settled.outcome.is_err();
        match apply_settled(settled, &mut self.store, &self.registry, self.reporter.as_ref()) {
            Some(id) => {
                self.rebuild_tree_rows();
                self.select_node(&id);
                let name = self.store.get(&id).map(|n| n.name.clone()).unwrap_or_default();
                self.push_activity(format!("generated {name} ({description})"));
            }
            None if failed => self.push_activity(format!("generation failed: {description}")),
            None => {}
        }
    }

    pub fn replace_registry(&mut self, registry: ToolRegistry) {
        info!(
            mcp = registry.mcp_count(),
            custom = registry.custom_count(),
            "tool registry reloaded"
        );
        self.registry = registry;
    }

    /// Rows that fit in the tree panel (inside its borders).
    pub fn visible_rows(&self) -> usize {
        self.viewport.height.saturating_sub(2) as usize
    }

    /// Index of the row drawn at terminal row `y`, if any.
    pub fn row_at(&self, y: u16) -> Option<usize> {
        let inner = self.inner_viewport();
        if y < inner.y || y >= inner.y + inner.height {
            return None;
        }
        let idx = self.scroll_offset + (y - inner.y) as usize;
        (idx < self.tree_rows.len()).then_some(idx)
    }

    /// Drop candidates for a pointer position, innermost first, followed by
    /// the rendered ancestors so an illegal inner target can bubble outward.
    pub fn candidates_at(&self, (x, y): (u16, u16)) -> Vec<DropCandidate> {
        let Some(row) = self.row_at(y).map(|idx| &self.tree_rows[idx]) else {
            return Vec::new();
        };
        // Over the dragged agent itself there is nothing to drop onto, and
        // bubbling would hand the drop to its own parent.
        let source = self.drag.session().map(|s| s.source_id.as_str());
        if row.is_agent() && source == Some(row.node_id.as_str()) {
            return Vec::new();
        }
        let column = x.saturating_sub(self.inner_viewport().x);
        let mut out = Vec::new();
        match row.kind {
            RowKind::ToolHeader | RowKind::Tool => {
                out.push(DropCandidate::tool(row.node_id.clone()));
                return out;
            }
            RowKind::Agent | RowKind::Cycle => match &row.parent_id {
                Some(parent) if column < row.label_column().saturating_sub(2) => {
                    out.push(DropCandidate::insert(parent.clone(), row.sibling_index));
                }
                _ => out.push(DropCandidate::child(row.node_id.clone())),
            },
        }
        for ancestor in row.ancestors.iter().rev() {
            out.push(DropCandidate::child(ancestor.clone()));
        }
        out
    }

    fn hover_at(&mut self, pointer: (u16, u16)) {
        let candidates = self.candidates_at(pointer);
        self.drag.hover(&self.store, &candidates);
    }

    fn finish_drop(&mut self) {
        let source = self.drag.session().map(|s| s.source_id.clone());
        let had_target = self
            .drag
            .session()
            .is_some_and(|s| s.highlight().is_some());
        match self.drag.drop(&mut self.store) {
            DropOutcome::Applied(candidate) => {
                let receiver = candidate.receiver().to_string();
                self.collapsed.remove(&receiver);
                self.rebuild_tree_rows();
                if let Some(source) = source {
                    let name = self.display_name(&source);
                    let target = self.display_name(&receiver);
                    let verb = match candidate {
                        DropCandidate::Onto(t) if t.edge == EdgeKind::Tool => "as tool of",
                        DropCandidate::Insert(_) => "reordered under",
                        DropCandidate::Onto(_) => "moved under",
                    };
                    self.push_activity(format!("{name} {verb} {target}"));
                    self.select_node(&source);
                }
            }
            DropOutcome::Ignored if had_target => {
                self.status = Some("drop rejected".to_string());
            }
            DropOutcome::Ignored => {}
        }
    }

    /// Scroll one auto-scroll step. Returns whether the view moved.
    fn step_autoscroll(&mut self) -> bool {
        let Some((_, y)) = self.drag_pointer else {
            return false;
        };
        let inner = self.inner_viewport();
        let velocity = self.autoscroll.velocity(y, inner.y, inner.height);
        let before = self.scroll_offset;
        self.scroll_by(velocity);
        self.scroll_offset != before
    }

    pub fn scroll_by(&mut self, delta: i32) {
        let offset = self.scroll_offset as i64 + i64::from(delta);
        self.scroll_offset = offset.max(0) as usize;
        self.clamp_scroll();
    }

    fn clamp_scroll(&mut self) {
        let max = self.tree_rows.len().saturating_sub(self.visible_rows().max(1));
        self.scroll_offset = self.scroll_offset.min(max);
    }

    fn ensure_selected_visible(&mut self) {
        let height = self.visible_rows().max(1);
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        } else if self.selected_index >= self.scroll_offset + height {
            self.scroll_offset = self.selected_index + 1 - height;
        }
    }

    fn inner_viewport(&self) -> Rect {
        Rect {
            x: self.viewport.x.saturating_add(1),
            y: self.viewport.y.saturating_add(1),
            width: self.viewport.width.saturating_sub(2),
            height: self.viewport.height.saturating_sub(2),
        }
    }

    fn move_selection(&mut self, delta: i32) {
        if self.tree_rows.is_empty() {
            return;
        }
        let new_idx = self.selected_index as i32 + delta;
        self.selected_index = new_idx.clamp(0, self.tree_rows.len() as i32 - 1) as usize;
        self.ensure_selected_visible();
    }

    fn select_first(&mut self) {
        self.selected_index = 0;
        self.ensure_selected_visible();
    }

    fn select_last(&mut self) {
        if !self.tree_rows.is_empty() {
            self.selected_index = self.tree_rows.len() - 1;
            self.ensure_selected_visible();
        }
    }

    fn toggle_expand(&mut self) {
        if let Some(row) = self.tree_rows.get(self.selected_index) {
            if row.kind == RowKind::Agent && row.has_children {
                let id = row.node_id.clone();
                if !self.collapsed.remove(&id) {
                    self.collapsed.insert(id);
                }
                self.rebuild_tree_rows();
            }
        }
    }

    fn collapse_current(&mut self) {
        if let Some(row) = self.tree_rows.get(self.selected_index) {
            if row.kind == RowKind::Agent && row.has_children && row.is_expanded {
                self.collapsed.insert(row.node_id.clone());
                self.rebuild_tree_rows();
            }
        }
    }

    fn shift_selected(&mut self, delta: isize) {
        let Some(row) = self.selected_row().filter(|r| r.is_agent()) else {
            return;
        };
        let id = row.node_id.clone();
        if shift_among_siblings(&mut self.store, &id, delta) {
            self.rebuild_tree_rows();
            self.select_node(&id);
        }
    }

    /// Create an LLM agent under the selected agent, or as a root when the
    /// selection cannot take children.
    fn add_agent(&mut self) {
        let node = AgentNode::llm("new_agent");
        let id = node.id.clone();
        self.store.upsert(node);
        if let Some(parent) = self.selected_agent().map(|n| n.id.clone()) {
            if attach_child(&mut self.store, &parent, &id) {
                self.collapsed.remove(&parent);
            }
        }
        self.rebuild_tree_rows();
        self.select_node(&id);
    }

    /// Remove the selected agent (no cascade), or detach the selected tool.
    fn delete_selected(&mut self) {
        let Some(row) = self.selected_row().cloned() else {
            return;
        };
        match (row.kind, row.tool_index) {
            (RowKind::Tool, Some(index)) => {
                detach_tool(&mut self.store, &row.node_id, index);
            }
            (RowKind::Agent | RowKind::Cycle, _) => {
                if let Some(node) = self.store.remove(&row.node_id) {
                    self.push_activity(format!("removed {}", node.name));
                }
            }
            _ => return,
        }
        self.rebuild_tree_rows();
    }

    fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            FocusPanel::Tree => FocusPanel::Details,
            FocusPanel::Details => FocusPanel::Tasks,
            FocusPanel::Tasks => FocusPanel::Tree,
        };
    }

    fn display_name(&self, id: &str) -> String {
        self.store
            .get(id)
            .map(|n| n.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    fn push_activity(&mut self, message: String) {
        self.status = Some(message.clone());
        self.activity.push(message);
        if self.activity.len() > 200 {
            self.activity.drain(0..100);
        }
    }
}

/// Depth-first flattening. `path` holds the agents between the root and the
/// current row; meeting one of them again emits a cycle row and stops, so any
/// graph shape renders in finite time. Dangling ids are skipped.
fn flatten_agent(
    store: &AgentStore,
    id: &str,
    parent_id: Option<&AgentId>,
    sibling_index: usize,
    collapsed: &HashSet<AgentId>,
    path: &mut Vec<AgentId>,
    rows: &mut Vec<TreeRow>,
) {
    let Some(node) = store.get(id) else {
        return;
    };
    let depth = path.len();
    let base = TreeRow {
        node_id: node.id.clone(),
        display_name: node.name.clone(),
        label: node.kind_label().to_string(),
        depth,
        kind: RowKind::Agent,
        is_expanded: false,
        has_children: false,
        parent_id: parent_id.cloned(),
        sibling_index,
        ancestors: path.clone(),
        tool_index: None,
    };

    if path.iter().any(|p| p == id) {
        rows.push(TreeRow {
            kind: RowKind::Cycle,
            ..base
        });
        return;
    }

    let has_children = node.can_own_tools() || !node.children().is_empty();
    let is_expanded = has_children && !collapsed.contains(id);
    rows.push(TreeRow {
        is_expanded,
        has_children,
        ..base
    });
    if !is_expanded {
        return;
    }

    path.push(node.id.clone());
    if node.can_own_tools() {
        rows.push(TreeRow {
            node_id: node.id.clone(),
            display_name: "tools".to_string(),
            label: String::new(),
            depth: depth + 1,
            kind: RowKind::ToolHeader,
            is_expanded: true,
            has_children: !node.tools().is_empty(),
            parent_id: None,
            sibling_index: 0,
            ancestors: path.clone(),
            tool_index: None,
        });
        for (index, tool) in node.tools().iter().enumerate() {
            let display_name = match tool {
                crate::agents::ToolRef::Agent { agent_id } => match store.get(agent_id) {
                    Some(target) => format!("{} (agent)", target.name),
                    None => continue,
                },
                other => other.to_string(),
            };
            rows.push(TreeRow {
                node_id: node.id.clone(),
                display_name,
                label: String::new(),
                depth: depth + 2,
                kind: RowKind::Tool,
                is_expanded: false,
                has_children: false,
                parent_id: None,
                sibling_index: 0,
                ancestors: path.clone(),
                tool_index: Some(index),
            });
        }
    }
    for (index, child) in node.children().iter().enumerate() {
        flatten_agent(store, child, Some(&node.id), index, collapsed, path, rows);
    }
    path.pop();
}

#[cfg(test)]
#[path = "../tests/helpers/mod.rs"]
#[allow(dead_code)]
mod helpers;

#[cfg(test)]
mod tests {
    use super::helpers::*;
    use super::*;
    use crate::generation::UnconfiguredGenerator;
    use crossterm::event::KeyEventState;
    use std::sync::mpsc;
    use std::sync::Arc;
    use tokio::runtime::Runtime;

    struct Harness {
        app: App,
        _runtime: Runtime,
        _rx: mpsc::Receiver<crate::events::AppEvent>,
    }

    fn harness(nodes: Vec<AgentNode>) -> Harness {
        let runtime = Runtime::new().unwrap();
        let (tx, rx) = mpsc::channel();
        let tracker = GenerationTracker::new(
            Arc::new(UnconfiguredGenerator),
            runtime.handle().clone(),
            tx,
            "test",
        );
        let mut app = App::new(store_of(nodes), registry(), tracker);
        app.viewport = Rect::new(0, 0, 40, 12);
        app.rebuild_tree_rows();
        Harness {
            app,
            _runtime: runtime,
            _rx: rx,
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: crossterm::event::KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn row_names(app: &App) -> Vec<String> {
        app.tree_rows
            .iter()
            .map(|r| format!("{}{}", "  ".repeat(r.depth), r.display_name))
            .collect()
    }

    /// Terminal row of the first row showing `id` (inside the top border).
    fn screen_row(app: &App, id: &str) -> u16 {
        let idx = app
            .tree_rows
            .iter()
            .position(|r| r.is_agent() && r.node_id == id)
            .unwrap();
        (idx - app.scroll_offset) as u16 + 1
    }

    #[test]
    fn flatten_filters_dangling_children() {
        let h = harness(vec![seq("a", &["b", "gone"]), seq("b", &[])]);
        assert_eq!(row_names(&h.app), vec!["a", "  b"]);
    }

    #[test]
    fn flatten_terminates_on_cycles() {
        let h = harness(vec![seq("a", &["b"]), seq("b", &["c"]), seq("c", &["a"])]);
        assert_eq!(row_names(&h.app).len(), 12);
        let kinds: Vec<RowKind> = h.app.tree_rows.iter().map(|r| r.kind).collect();
        assert_eq!(
            &kinds[..4],
            &[RowKind::Agent, RowKind::Agent, RowKind::Agent, RowKind::Cycle]
        );
    }

    #[test]
    fn flatten_lists_tools_under_llm_agents() {
        let h = harness(vec![llm_with_agent_tool("a", "b"), llm("b"), llm_with_agent_tool("c", "gone")]);
        let names = row_names(&h.app);
        assert_eq!(
            names,
            vec!["a", "  tools", "    b (agent)", "b", "  tools", "c", "  tools"]
        );
        assert_eq!(h.app.tree_rows[2].kind, RowKind::Tool);
        assert_eq!(h.app.tree_rows[2].tool_index, Some(0));
    }

    #[test]
    fn collapse_hides_children() {
        let mut h = harness(vec![seq("a", &["b"]), seq("b", &[])]);
        h.app.handle_key(key(KeyCode::Char('h')));
        assert_eq!(row_names(&h.app), vec!["a"]);
        h.app.handle_key(key(KeyCode::Char('l')));
        assert_eq!(row_names(&h.app), vec!["a", "  b"]);
    }

    #[test]
    fn mouse_drag_reparents_onto_label() {
        let mut h = harness(vec![seq("a", &[]), seq("b", &[])]);
        let app = &mut h.app;
        let from = screen_row(app, "b");
        let to = screen_row(app, "a");
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 5, from));
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 5, to));
        assert!(app.drag.session().unwrap().drop_target().is_some());
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 5, to));
        assert_eq!(children_of(&app.store, "a"), vec!["b"]);
        assert_eq!(row_names(app), vec!["a", "  b"]);
        assert_eq!(app.selected_row().unwrap().node_id, "b");
    }

    #[test]
    fn mouse_drag_into_indent_inserts_before_row() {
        let mut h = harness(vec![seq("a", &["b", "c"]), seq("b", &[]), seq("c", &[])]);
        let app = &mut h.app;
        let from = screen_row(app, "c");
        let to = screen_row(app, "b");
        // Column 1 is inside b's indentation; its label starts at column 5.
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 6, from));
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 1, to));
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 1, to));
        assert_eq!(children_of(&app.store, "a"), vec!["c", "b"]);
    }

    #[test]
    fn drag_onto_own_descendant_bubbles_to_parent() {
        let mut h = harness(vec![seq("root", &["a", "x"]), seq("a", &["b"]), seq("b", &[]), seq("x", &[])]);
        let app = &mut h.app;
        let from = screen_row(app, "a");
        let to = screen_row(app, "b");
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 5, from));
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 8, to));
        assert_eq!(
            app.drag.session().unwrap().highlight(),
            Some(&DropCandidate::child("root"))
        );
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 8, to));
        assert_eq!(children_of(&app.store, "root"), vec!["x", "a"]);
        assert_eq!(children_of(&app.store, "a"), vec!["b"]);
    }

    #[test]
    fn drag_onto_tools_header_adds_agent_tool() {
        let mut h = harness(vec![llm("a"), llm("helper")]);
        let app = &mut h.app;
        let from = screen_row(app, "helper");
        // Row right after "a" is a's tools header.
        let to = screen_row(app, "a") + 1;
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 3, from));
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 6, to));
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 6, to));
        assert!(app.store.get("a").unwrap().has_agent_tool("helper"));
        assert!(children_of(&app.store, "a").is_empty());
    }

    #[test]
    fn click_without_drag_only_selects() {
        let mut h = harness(vec![seq("a", &[]), seq("b", &[])]);
        let app = &mut h.app;
        let row = screen_row(app, "b");
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 4, row));
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 4, row));
        assert_eq!(app.selected_row().unwrap().node_id, "b");
        assert!(!app.drag.is_dragging());
        assert!(children_of(&app.store, "b").is_empty());
    }

    #[test]
    fn click_on_child_label_keeps_sibling_order() {
        let mut h = harness(vec![
            seq("p", &["a", "b", "c"]),
            seq("a", &[]),
            seq("b", &[]),
            seq("c", &[]),
        ]);
        let app = &mut h.app;
        let row = screen_row(app, "a");
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 6, row));
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 6, row));
        assert_eq!(children_of(&app.store, "p"), vec!["a", "b", "c"]);
        assert_eq!(app.selected_row().unwrap().node_id, "a");
        assert!(!app.drag.is_dragging());
    }

    #[test]
    fn wiggle_within_pressed_row_is_not_a_drag() {
        let mut h = harness(vec![seq("p", &["a", "b"]), seq("a", &[]), seq("b", &[])]);
        let app = &mut h.app;
        let row = screen_row(app, "a");
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 6, row));
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 9, row));
        assert!(!app.drag.is_dragging());
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 9, row));
        assert_eq!(children_of(&app.store, "p"), vec!["a", "b"]);
    }

    #[test]
    fn dragging_back_onto_source_offers_no_target() {
        let mut h = harness(vec![
            seq("p", &["a", "b", "c"]),
            seq("a", &[]),
            seq("b", &[]),
            seq("c", &[]),
        ]);
        let app = &mut h.app;
        let a = screen_row(app, "a");
        let b = screen_row(app, "b");
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 6, a));
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 6, b));
        assert!(app.drag.session().unwrap().highlight().is_some());
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 6, a));
        assert!(app.drag.session().unwrap().highlight().is_none());
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 6, a));
        assert_eq!(children_of(&app.store, "p"), vec!["a", "b", "c"]);
    }

    #[test]
    fn key_release_is_ignored() {
        let mut h = harness(vec![seq("a", &[])]);
        let mut release = key(KeyCode::Char('n'));
        release.kind = crossterm::event::KeyEventKind::Release;
        h.app.handle_key(key(KeyCode::Char('n')));
        h.app.handle_key(release);
        assert_eq!(h.app.store.len(), 2);
    }

    #[test]
    fn escape_cancels_drag() {
        let mut h = harness(vec![seq("a", &[]), seq("b", &[])]);
        let app = &mut h.app;
        let from = screen_row(app, "b");
        let to = screen_row(app, "a");
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 5, from));
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 5, to));
        app.handle_key(key(KeyCode::Esc));
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 5, to));
        assert!(children_of(&app.store, "a").is_empty());
    }

    #[test]
    fn dragging_near_bottom_edge_scrolls() {
        let nodes: Vec<AgentNode> = (0..30).map(|i| seq(&format!("n{i:02}"), &[])).collect();
        let mut h = harness(nodes);
        let app = &mut h.app;
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 5, 1));
        // Inner viewport spans rows 1..=10; row 10 is on the bottom edge.
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 5, 10));
        let after_drag = app.scroll_offset;
        assert!(after_drag > 0);
        app.on_tick();
        assert!(app.scroll_offset > after_drag);
        // Releasing stops the ticks from scrolling.
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 5, 10));
        let settled = app.scroll_offset;
        app.on_tick();
        assert_eq!(app.scroll_offset, settled);
    }

    #[test]
    fn new_agent_lands_under_selection() {
        let mut h = harness(vec![seq("a", &[])]);
        h.app.handle_key(key(KeyCode::Char('n')));
        let children = children_of(&h.app.store, "a");
        assert_eq!(children.len(), 1);
        assert_eq!(h.app.selected_row().unwrap().node_id, children[0]);
    }

    #[test]
    fn delete_does_not_cascade() {
        let mut h = harness(vec![seq("a", &["b"]), seq("b", &["c"]), seq("c", &[])]);
        h.app.select_node("b");
        h.app.handle_key(key(KeyCode::Char('d')));
        assert!(!h.app.store.contains("b"));
        assert!(h.app.store.contains("c"));
        assert_eq!(children_of(&h.app.store, "a"), vec!["b"]);
        // c lost its only parent and is now a root.
        assert_eq!(row_names(&h.app), vec!["a", "c"]);
    }

    #[test]
    fn shift_keys_reorder_siblings() {
        let mut h = harness(vec![seq("p", &["a", "b"]), seq("a", &[]), seq("b", &[])]);
        h.app.select_node("a");
        h.app.handle_key(key(KeyCode::Char('J')));
        assert_eq!(children_of(&h.app.store, "p"), vec!["b", "a"]);
        assert_eq!(h.app.selected_row().unwrap().node_id, "a");
    }

    #[test]
    fn prompt_starts_generation() {
        let mut h = harness(vec![]);
        h.app.handle_key(key(KeyCode::Char('a')));
        for c in "writer".chars() {
            h.app.handle_key(key(KeyCode::Char(c)));
        }
        h.app.handle_key(key(KeyCode::Enter));
        assert!(!h.app.prompt_mode);
        assert_eq!(h.app.activity.last().unwrap(), "generating: writer");
    }

    #[test]
    fn settled_generation_is_added_and_selected() {
        let mut h = harness(vec![seq("a", &[])]);
        h.app.on_generation_settled(GenerationSettled {
            token: uuid::Uuid::new_v4(),
            description: "a helper".into(),
            outcome: Ok(generated("helper")),
        });
        assert_eq!(h.app.store.len(), 2);
        assert_eq!(h.app.selected_agent().unwrap().name, "helper");
    }

    #[test]
    fn failed_generation_leaves_store_alone() {
        let mut h = harness(vec![seq("a", &[])]);
        h.app.on_generation_settled(GenerationSettled {
            token: uuid::Uuid::new_v4(),
            description: "a helper".into(),
            outcome: Err(color_eyre::eyre::eyre!("boom")),
        });
        assert_eq!(h.app.store.len(), 1);
        assert_eq!(h.app.activity.last().unwrap(), "generation failed: a helper");
    }
}
