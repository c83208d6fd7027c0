use indexmap::IndexMap;

use crate::agents::{AgentId, AgentNode, AgentPatch};

/// Flat collection of agent records keyed by id, in insertion order.
///
/// The store never repairs references: removing a node leaves other nodes'
/// `sub_agents` and tool entries pointing at it, and readers filter them.
#[derive(Debug, Clone, Default)]
pub struct AgentStore {
    nodes: IndexMap<AgentId, AgentNode>,
}

impl AgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = AgentNode>) -> Self {
        let mut store = Self::new();
        for node in nodes {
            store.upsert(node);
        }
        store
    }

    pub fn list(&self) -> impl Iterator<Item = &AgentNode> {
        self.nodes.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &AgentId> {
        self.nodes.keys()
    }

    pub fn get(&self, id: &str) -> Option<&AgentNode> {
        self.nodes.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut AgentNode> {
        self.nodes.get_mut(id)
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut AgentNode> {
        self.nodes.values_mut()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Insert a new record, or replace an existing one in place (keeping its
    /// position in the listing order).
    pub fn upsert(&mut self, node: AgentNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Apply a partial update. Returns false (and does nothing) if the id is absent.
    pub fn patch(&mut self, id: &str, patch: AgentPatch) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                patch.apply(node);
                true
            }
            None => false,
        }
    }

    /// Remove a record. Does not cascade.
    pub fn remove(&mut self, id: &str) -> Option<AgentNode> {
        self.nodes.shift_remove(id)
    }

    /// First node whose name matches exactly, in listing order.
    pub fn find_by_name(&self, name: &str) -> Option<&AgentNode> {
        self.nodes.values().find(|n| n.name == name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
