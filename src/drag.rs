//! Pointer drag-and-drop over the agent tree.
//!
//! The coordinator is input-agnostic: the app hit-tests pointer positions
//! into [`DropCandidate`]s and feeds them in; legality is checked against the
//! live store on every hover.

use tracing::debug;

use crate::agents::AgentId;
use crate::reach::reachable;
use crate::store::AgentStore;
use crate::tree::{attach_child, attach_tool, insert_child_at};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Child,
    Tool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTarget {
    pub target_id: AgentId,
    pub edge: EdgeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertTarget {
    pub parent_id: AgentId,
    pub index: usize,
}

/// What a drop at the current pointer position would do. Holding one of
/// these instead of two optional fields keeps the two kinds exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropCandidate {
    Onto(DropTarget),
    Insert(InsertTarget),
}

impl DropCandidate {
    pub fn child(target_id: impl Into<AgentId>) -> Self {
        DropCandidate::Onto(DropTarget {
            target_id: target_id.into(),
            edge: EdgeKind::Child,
        })
    }

    pub fn tool(target_id: impl Into<AgentId>) -> Self {
        DropCandidate::Onto(DropTarget {
            target_id: target_id.into(),
            edge: EdgeKind::Tool,
        })
    }

    pub fn insert(parent_id: impl Into<AgentId>, index: usize) -> Self {
        DropCandidate::Insert(InsertTarget {
            parent_id: parent_id.into(),
            index,
        })
    }

    /// The node that would gain an edge.
    pub fn receiver(&self) -> &str {
        match self {
            DropCandidate::Onto(t) => &t.target_id,
            DropCandidate::Insert(t) => &t.parent_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub source_id: AgentId,
    highlight: Option<DropCandidate>,
}

impl DragSession {
    pub fn drop_target(&self) -> Option<&DropTarget> {
        match &self.highlight {
            Some(DropCandidate::Onto(t)) => Some(t),
            _ => None,
        }
    }

    pub fn insert_target(&self) -> Option<&InsertTarget> {
        match &self.highlight {
            Some(DropCandidate::Insert(t)) => Some(t),
            _ => None,
        }
    }

    pub fn highlight(&self) -> Option<&DropCandidate> {
        self.highlight.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Applied(DropCandidate),
    /// Nothing highlighted, unknown source, or the engine refused the edit.
    Ignored,
}

#[derive(Debug, Default)]
pub struct DragCoordinator {
    session: Option<DragSession>,
}

impl DragCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idle → Dragging. Replaces any session left over from a lost release.
    pub fn begin(&mut self, source_id: impl Into<AgentId>) {
        let source_id = source_id.into();
        debug!(source = %source_id, "drag started");
        self.session = Some(DragSession {
            source_id,
            highlight: None,
        });
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Offer hover candidates, innermost first. The first legal one claims
    /// the hover and becomes the highlight; illegal ones are passed over so
    /// an enclosing target can claim instead. Returns whether any claimed.
    pub fn hover(&mut self, store: &AgentStore, candidates: &[DropCandidate]) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let claimed = candidates
            .iter()
            .find(|c| is_legal(store, &session.source_id, c))
            .cloned();
        let hit = claimed.is_some();
        session.highlight = claimed;
        hit
    }

    /// Dragging → Idle, applying the highlighted edit if there is one.
    pub fn drop(&mut self, store: &mut AgentStore) -> DropOutcome {
        let Some(session) = self.session.take() else {
            return DropOutcome::Ignored;
        };
        if !store.contains(&session.source_id) {
            return DropOutcome::Ignored;
        }
        let Some(candidate) = session.highlight else {
            return DropOutcome::Ignored;
        };
        let source = session.source_id.as_str();
        let applied = match &candidate {
            DropCandidate::Onto(DropTarget {
                target_id,
                edge: EdgeKind::Child,
            }) => attach_child(store, target_id, source),
            DropCandidate::Onto(DropTarget {
                target_id,
                edge: EdgeKind::Tool,
            }) => attach_tool(store, target_id, source),
            DropCandidate::Insert(InsertTarget { parent_id, index }) => {
                insert_child_at(store, parent_id, source, *index)
            }
        };
        if applied {
            DropOutcome::Applied(candidate)
        } else {
            DropOutcome::Ignored
        }
    }

    /// Drag ended without a drop.
    pub fn cancel(&mut self) {
        if self.session.take().is_some() {
            debug!("drag cancelled");
        }
    }
}

/// A candidate is legal when the receiving node is neither the source nor one
/// of its structural descendants, and can hold the edge at all.
pub fn is_legal(store: &AgentStore, source_id: &str, candidate: &DropCandidate) -> bool {
    let receiver_id = candidate.receiver();
    if reachable(store, source_id, receiver_id) {
        return false;
    }
    let Some(receiver) = store.get(receiver_id) else {
        return false;
    };
    match candidate {
        DropCandidate::Onto(DropTarget {
            edge: EdgeKind::Tool,
            ..
        }) => receiver.can_own_tools() && !receiver.has_agent_tool(source_id),
        _ => receiver.can_own_children(),
    }
}

/// Edge-proximity scrolling while a drag is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoScroll {
    /// Rows from the edge where scrolling kicks in.
    pub margin: u16,
    /// Rows per step when the pointer is on (or past) the edge.
    pub max_speed: u16,
}

impl Default for AutoScroll {
    fn default() -> Self {
        Self {
            margin: 3,
            max_speed: 3,
        }
    }
}

impl AutoScroll {
    /// Signed rows to scroll for a pointer at `row` over a viewport covering
    /// `top..top + height`. Negative scrolls up. Speed grows linearly as the
    /// pointer nears the edge.
    pub fn velocity(&self, row: u16, top: u16, height: u16) -> i32 {
        if self.margin == 0 || height == 0 {
            return 0;
        }
        let bottom = top.saturating_add(height) - 1;
        let from_top = row.saturating_sub(top);
        if from_top < self.margin {
            return -self.speed_at(from_top);
        }
        let from_bottom = bottom.saturating_sub(row);
        if from_bottom < self.margin {
            return self.speed_at(from_bottom);
        }
        0
    }

    fn speed_at(&self, distance: u16) -> i32 {
        let margin = i32::from(self.margin);
        let closeness = margin - i32::from(distance);
        // Ceiling division keeps the outermost row of the margin moving.
        (i32::from(self.max_speed) * closeness + margin - 1) / margin
    }
}

#[cfg(test)]
#[path = "../tests/helpers/mod.rs"]
#[allow(dead_code)]
mod helpers;
