//! Reachability over structural (`sub_agents`) edges.
//!
//! The stored graph may already contain cycles, so every traversal keeps an
//! explicit visited set and never revisits a node. Tool-agent references are
//! not edges here.

use std::collections::{HashMap, HashSet};

use crate::store::AgentStore;

/// Snapshot of the child edges of a store. Borrowing the store means a
/// mutation cannot happen while an index is alive, so an index is never stale.
pub struct ReachIndex<'a> {
    edges: HashMap<&'a str, &'a [String]>,
}

impl<'a> ReachIndex<'a> {
    pub fn build(store: &'a AgentStore) -> Self {
        let edges = store
            .list()
            .map(|node| (node.id.as_str(), node.children()))
            .collect();
        Self { edges }
    }

    /// True iff `to == from` or `to` can be reached from `from` by following
    /// zero or more child edges. Runs in O(V + E) on any graph shape.
    pub fn reachable(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = vec![from];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(children) = self.edges.get(current) else {
                continue;
            };
            for child in children.iter() {
                if child == to {
                    return true;
                }
                if !visited.contains(child.as_str()) {
                    stack.push(child);
                }
            }
        }
        false
    }

    /// Every id reachable from `from` (including `from`), in discovery order.
    /// Dangling ids are included only if some edge names them.
    pub fn descendants(&self, from: &str) -> Vec<&'a str> {
        let mut out = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = vec![from];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let Some((&key, children)) = self.edges.get_key_value(current) {
                out.push(key);
                for child in children.iter().rev() {
                    if !visited.contains(child.as_str()) {
                        stack.push(child);
                    }
                }
            }
        }
        out
    }
}

/// Recompute-on-check convenience over a live store.
pub fn reachable(store: &AgentStore, from: &str, to: &str) -> bool {
    ReachIndex::build(store).reachable(from, to)
}

#[cfg(test)]
#[path = "../tests/helpers/mod.rs"]
#[allow(dead_code)]
mod helpers;
