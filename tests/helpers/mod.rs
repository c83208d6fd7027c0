use crate::agents::{AgentNode, ToolRef};
use crate::generation::{GeneratedConfig, GeneratedTools};
use crate::project::{CustomToolDef, McpServerConfig, ToolRegistry};
use crate::store::AgentStore;

/// Create a sequential agent whose id and name are both `id`.
pub fn seq(id: &str, children: &[&str]) -> AgentNode {
    AgentNode::sequential(id)
        .with_id(id)
        .with_children(children.iter().map(|c| c.to_string()).collect())
}

/// Create an LLM agent with no children or tools.
pub fn llm(id: &str) -> AgentNode {
    AgentNode::llm(id).with_id(id)
}

/// Create an LLM agent with sub-agents.
pub fn llm_with_children(id: &str, children: &[&str]) -> AgentNode {
    llm(id).with_children(children.iter().map(|c| c.to_string()).collect())
}

/// Create an LLM agent that references `target` as an agent tool.
pub fn llm_with_agent_tool(id: &str, target: &str) -> AgentNode {
    let mut node = llm(id);
    if let Some(tools) = node.tools_mut() {
        tools.push(ToolRef::Agent {
            agent_id: target.to_string(),
        });
    }
    node
}

/// Create a remote (leaf-style) agent.
pub fn remote(id: &str) -> AgentNode {
    AgentNode::remote(id, format!("https://agents.test/{id}")).with_id(id)
}

pub fn store_of(nodes: Vec<AgentNode>) -> AgentStore {
    AgentStore::from_nodes(nodes)
}

/// Child ids of `id` as owned strings, for easy comparison.
pub fn children_of(store: &AgentStore, id: &str) -> Vec<String> {
    store
        .get(id)
        .map(|n| n.children().to_vec())
        .unwrap_or_default()
}

/// Ids of every node that lists `id` among its children.
pub fn parents_of(store: &AgentStore, id: &str) -> Vec<String> {
    store
        .list()
        .filter(|n| n.children().iter().any(|c| c == id))
        .map(|n| n.id.clone())
        .collect()
}

/// A registry with one MCP server ("files": read, write) and one custom tool ("lookup").
pub fn registry() -> ToolRegistry {
    ToolRegistry::new(
        vec![McpServerConfig {
            name: "files".to_string(),
            command: "mcp-files".to_string(),
            args: Vec::new(),
            tools: vec!["read".to_string(), "write".to_string()],
        }],
        vec![CustomToolDef {
            name: "lookup".to_string(),
            description: "look things up".to_string(),
        }],
    )
}

/// A generated config with the given name and no tools.
pub fn generated(name: &str) -> GeneratedConfig {
    GeneratedConfig {
        name: name.to_string(),
        description: format!("generated {name}"),
        instruction: format!("You are {name}."),
        output_key: None,
        sub_agents: Vec::new(),
        tools: GeneratedTools::default(),
    }
}
