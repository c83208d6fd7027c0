use tracing::debug;

use crate::agents::{AgentId, AgentKind, AgentNode, LlmAgent, McpToolset, ToolRef};
use crate::project::ToolRegistry;
use crate::store::AgentStore;

use super::{GeneratedConfig, GeneratedMcp};

/// Turn a generated config into a new LLM agent, resolving every reference
/// against the current store and registry. Unresolvable entries are dropped.
///
/// Returns the node (with no children yet) and the resolved sub-agent ids,
/// which the caller attaches through the tree engine so they keep a single
/// structural parent.
pub fn materialize(
    config: &GeneratedConfig,
    store: &AgentStore,
    registry: &ToolRegistry,
) -> (AgentNode, Vec<AgentId>) {
    let mut tools = Vec::new();

    for name in &config.tools.builtin {
        tools.push(ToolRef::Builtin { name: name.clone() });
    }
    for entry in &config.tools.mcp {
        match resolve_mcp(entry, registry) {
            Some(set) => tools.push(ToolRef::Mcp(set)),
            None => debug!(server = %entry.server, "dropping unresolved mcp toolset"),
        }
    }
    for name in &config.tools.custom {
        if registry.custom(name).is_some() {
            tools.push(ToolRef::Custom { name: name.clone() });
        } else {
            debug!(tool = %name, "dropping unknown custom tool");
        }
    }
    for reference in &config.tools.agents {
        match resolve_agent(reference, store) {
            Some(agent_id) => {
                let tool = ToolRef::Agent { agent_id };
                if !tools.contains(&tool) {
                    tools.push(tool);
                }
            }
            None => debug!(agent = %reference, "dropping unknown agent tool"),
        }
    }

    let mut sub_agents: Vec<AgentId> = Vec::new();
    for reference in &config.sub_agents {
        if let Some(id) = resolve_agent(reference, store) {
            if !sub_agents.contains(&id) {
                sub_agents.push(id);
            }
        }
    }

    let name = if config.name.is_empty() {
        "generated_agent".to_string()
    } else {
        config.name.clone()
    };
    let mut node = AgentNode::new(
        name,
        AgentKind::Llm(LlmAgent {
            instruction: config.instruction.clone(),
            output_key: config.output_key.clone().filter(|k| !k.is_empty()),
            tools,
            ..LlmAgent::new()
        }),
    );
    node.description = config.description.clone();
    (node, sub_agents)
}

/// Resolve by id first, then by name when exactly one node carries it.
fn resolve_agent(reference: &str, store: &AgentStore) -> Option<AgentId> {
    if store.contains(reference) {
        return Some(reference.to_string());
    }
    let mut matches = store.list().filter(|n| n.name == reference);
    match (matches.next(), matches.next()) {
        (Some(node), None) => Some(node.id.clone()),
        _ => None,
    }
}

/// Keep the requested tools the server advertises. A server that advertises
/// nothing accepts whatever was requested.
fn resolve_mcp(entry: &GeneratedMcp, registry: &ToolRegistry) -> Option<McpToolset> {
    let server = registry.mcp(&entry.server)?;
    let tools: Vec<String> = if server.tools.is_empty() {
        entry.tools.clone()
    } else {
        entry
            .tools
            .iter()
            .filter(|t| server.tools.contains(t))
            .cloned()
            .collect()
    };
    if !entry.tools.is_empty() && tools.is_empty() {
        return None;
    }
    Some(McpToolset {
        server: server.name.clone(),
        tools,
    })
}

#[cfg(test)]
#[path = "../../tests/helpers/mod.rs"]
#[allow(dead_code)]
mod helpers;
