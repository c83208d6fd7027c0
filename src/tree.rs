//! Cycle-guarded structural edits.
//!
//! Every operation either applies fully or leaves the store untouched and
//! returns `false`. Illegal edits are prevented, not reported.

use std::collections::HashSet;

use tracing::debug;

use crate::agents::{AgentId, ToolRef};
use crate::reach::reachable;
use crate::store::AgentStore;

/// Replace a node's child list wholesale.
pub fn set_children(store: &mut AgentStore, parent_id: &str, ids: Vec<AgentId>) -> bool {
    let Some(children) = store.get_mut(parent_id).and_then(|p| p.children_mut()) else {
        return false;
    };
    *children = ids;
    true
}

/// Append `child_id` under `parent_id`, detaching it from any other parent.
/// No-op if the edge would close a cycle (including `child_id == parent_id`).
pub fn attach_child(store: &mut AgentStore, parent_id: &str, child_id: &str) -> bool {
    if !can_attach(store, parent_id, child_id) {
        return false;
    }
    detach_everywhere(store, child_id);
    if let Some(children) = store.get_mut(parent_id).and_then(|p| p.children_mut()) {
        children.push(child_id.to_string());
    }
    debug!(parent = parent_id, child = child_id, "attached child");
    true
}

/// Splice `child_id` into `parent_id`'s children at `index`, clamped to the
/// list length. Same cycle guard and detach rule as [`attach_child`].
///
/// `index` is a position in the list as the caller saw it. When the child
/// moves later within the same parent, removing it first shifts the target
/// left by one, which is compensated here.
pub fn insert_child_at(
    store: &mut AgentStore,
    parent_id: &str,
    child_id: &str,
    index: usize,
) -> bool {
    if !can_attach(store, parent_id, child_id) {
        return false;
    }
    let previous = store
        .get(parent_id)
        .and_then(|p| p.children().iter().position(|c| c == child_id));
    let index = match previous {
        Some(old) if old < index => index - 1,
        _ => index,
    };
    detach_everywhere(store, child_id);
    if let Some(children) = store.get_mut(parent_id).and_then(|p| p.children_mut()) {
        let at = index.min(children.len());
        children.insert(at, child_id.to_string());
        debug!(parent = parent_id, child = child_id, index = at, "inserted child");
    }
    true
}

/// Add `tool_agent_id` to `agent_id`'s tools as an agent reference.
///
/// Tool references are a separate edge type: the structural cycle guard does
/// not apply, only duplicate and direct self-reference checks.
pub fn attach_tool(store: &mut AgentStore, agent_id: &str, tool_agent_id: &str) -> bool {
    if agent_id == tool_agent_id || !store.contains(tool_agent_id) {
        return false;
    }
    let Some(agent) = store.get_mut(agent_id) else {
        return false;
    };
    if agent.has_agent_tool(tool_agent_id) {
        return false;
    }
    let Some(tools) = agent.tools_mut() else {
        return false;
    };
    tools.push(ToolRef::Agent {
        agent_id: tool_agent_id.to_string(),
    });
    debug!(agent = agent_id, tool = tool_agent_id, "attached agent tool");
    true
}

/// Remove the tool entry at `index` from an LLM agent.
pub fn detach_tool(store: &mut AgentStore, agent_id: &str, index: usize) -> bool {
    match store.get_mut(agent_id).and_then(|a| a.tools_mut()) {
        Some(tools) if index < tools.len() => {
            tools.remove(index);
            true
        }
        _ => false,
    }
}

/// Nodes that no other node lists as a child, in store order. Falls back to
/// every node when that set is empty so a fully cyclic store still renders.
pub fn compute_roots(store: &AgentStore) -> Vec<AgentId> {
    let mut referenced: HashSet<&str> = HashSet::new();
    for node in store.list() {
        for child in node.children() {
            if child != &node.id {
                referenced.insert(child);
            }
        }
    }
    let roots: Vec<AgentId> = store
        .ids()
        .filter(|id| !referenced.contains(id.as_str()))
        .cloned()
        .collect();
    if roots.is_empty() {
        store.ids().cloned().collect()
    } else {
        roots
    }
}

/// The first node (in store order) that lists `child_id` as a child.
pub fn structural_parent<'a>(store: &'a AgentStore, child_id: &str) -> Option<&'a AgentId> {
    store
        .list()
        .find(|n| n.children().iter().any(|c| c == child_id))
        .map(|n| &n.id)
}

/// Move a node one or more places among its siblings. Positive `delta`
/// moves it later in the parent's list.
pub fn shift_among_siblings(store: &mut AgentStore, child_id: &str, delta: isize) -> bool {
    let Some(parent_id) = structural_parent(store, child_id).cloned() else {
        return false;
    };
    let mut children = store
        .get(&parent_id)
        .map(|p| p.children().to_vec())
        .unwrap_or_default();
    let Some(old) = children.iter().position(|c| c == child_id) else {
        return false;
    };
    let new = old
        .saturating_add_signed(delta)
        .min(children.len().saturating_sub(1));
    if new == old {
        return false;
    }
    let moved = children.remove(old);
    children.insert(new, moved);
    set_children(store, &parent_id, children)
}

fn can_attach(store: &AgentStore, parent_id: &str, child_id: &str) -> bool {
    let parent_ok = store
        .get(parent_id)
        .is_some_and(|p| p.can_own_children());
    if !parent_ok || !store.contains(child_id) {
        return false;
    }
    if reachable(store, child_id, parent_id) {
        debug!(parent = parent_id, child = child_id, "rejected cycle-creating edge");
        return false;
    }
    true
}

fn detach_everywhere(store: &mut AgentStore, child_id: &str) {
    for node in store.nodes_mut() {
        if let Some(children) = node.children_mut() {
            children.retain(|c| c != child_id);
        }
    }
}

#[cfg(test)]
#[path = "../tests/helpers/mod.rs"]
#[allow(dead_code)]
mod helpers;
