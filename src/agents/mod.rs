use std::fmt;

use serde::{Deserialize, Serialize};

pub mod patch;

pub use patch::AgentPatch;

pub type AgentId = String;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// One configured agent. Relationships to other agents are plain ids, never
/// owning links, so the store tolerates cyclic and dangling references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentNode {
    pub id: AgentId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub kind: AgentKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentKind {
    Llm(LlmAgent),
    Sequential(WorkflowAgent),
    Parallel(WorkflowAgent),
    Loop(LoopAgent),
    /// Leaf-style agent hosted elsewhere; owns no children.
    Remote(RemoteAgent),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LlmAgent {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_key: Option<String>,
    #[serde(default)]
    pub sub_agents: Vec<AgentId>,
    #[serde(default)]
    pub tools: Vec<ToolRef>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowAgent {
    #[serde(default)]
    pub sub_agents: Vec<AgentId>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoopAgent {
    #[serde(default)]
    pub sub_agents: Vec<AgentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RemoteAgent {
    #[serde(default)]
    pub agent_card_url: String,
}

/// A tool attached to an LLM agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolRef {
    Builtin { name: String },
    Mcp(McpToolset),
    Custom { name: String },
    /// Another agent invoked as a callable tool. Independent of `sub_agents`.
    Agent { agent_id: AgentId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpToolset {
    pub server: String,
    #[serde(default)]
    pub tools: Vec<String>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl LlmAgent {
    pub fn new() -> Self {
        Self {
            model: default_model(),
            ..Self::default()
        }
    }
}

impl AgentNode {
    /// Mint a fresh identifier. Ids are never reused.
    pub fn new_id() -> AgentId {
        uuid::Uuid::new_v4().simple().to_string()
    }

    pub fn new(name: impl Into<String>, kind: AgentKind) -> Self {
        Self {
            id: Self::new_id(),
            name: name.into(),
            description: String::new(),
            kind,
        }
    }

    pub fn llm(name: impl Into<String>) -> Self {
        Self::new(name, AgentKind::Llm(LlmAgent::new()))
    }

    pub fn sequential(name: impl Into<String>) -> Self {
        Self::new(name, AgentKind::Sequential(WorkflowAgent::default()))
    }

    pub fn parallel(name: impl Into<String>) -> Self {
        Self::new(name, AgentKind::Parallel(WorkflowAgent::default()))
    }

    pub fn looping(name: impl Into<String>, max_iterations: Option<u32>) -> Self {
        Self::new(
            name,
            AgentKind::Loop(LoopAgent {
                sub_agents: Vec::new(),
                max_iterations,
            }),
        )
    }

    pub fn remote(name: impl Into<String>, agent_card_url: impl Into<String>) -> Self {
        Self::new(
            name,
            AgentKind::Remote(RemoteAgent {
                agent_card_url: agent_card_url.into(),
            }),
        )
    }

    pub fn with_id(mut self, id: impl Into<AgentId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_children(mut self, children: Vec<AgentId>) -> Self {
        if let Some(list) = self.children_mut() {
            *list = children;
        }
        self
    }

    /// Structural children in execution order. Empty for leaf kinds.
    pub fn children(&self) -> &[AgentId] {
        match &self.kind {
            AgentKind::Llm(a) => &a.sub_agents,
            AgentKind::Sequential(w) | AgentKind::Parallel(w) => &w.sub_agents,
            AgentKind::Loop(l) => &l.sub_agents,
            AgentKind::Remote(_) => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<AgentId>> {
        match &mut self.kind {
            AgentKind::Llm(a) => Some(&mut a.sub_agents),
            AgentKind::Sequential(w) | AgentKind::Parallel(w) => Some(&mut w.sub_agents),
            AgentKind::Loop(l) => Some(&mut l.sub_agents),
            AgentKind::Remote(_) => None,
        }
    }

    pub fn can_own_children(&self) -> bool {
        !matches!(self.kind, AgentKind::Remote(_))
    }

    pub fn can_own_tools(&self) -> bool {
        matches!(self.kind, AgentKind::Llm(_))
    }

    pub fn tools(&self) -> &[ToolRef] {
        match &self.kind {
            AgentKind::Llm(a) => &a.tools,
            _ => &[],
        }
    }

    pub fn tools_mut(&mut self) -> Option<&mut Vec<ToolRef>> {
        match &mut self.kind {
            AgentKind::Llm(a) => Some(&mut a.tools),
            _ => None,
        }
    }

    pub fn has_agent_tool(&self, agent_id: &str) -> bool {
        self.tools()
            .iter()
            .any(|t| matches!(t, ToolRef::Agent { agent_id: id } if id == agent_id))
    }

    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            AgentKind::Llm(_) => "llm",
            AgentKind::Sequential(_) => "seq",
            AgentKind::Parallel(_) => "par",
            AgentKind::Loop(_) => "loop",
            AgentKind::Remote(_) => "remote",
        }
    }
}

impl fmt::Display for ToolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolRef::Builtin { name } => write!(f, "builtin:{name}"),
            ToolRef::Mcp(set) if set.tools.is_empty() => write!(f, "mcp:{}", set.server),
            ToolRef::Mcp(set) => write!(f, "mcp:{}[{}]", set.server, set.tools.join(",")),
            ToolRef::Custom { name } => write!(f, "custom:{name}"),
            ToolRef::Agent { agent_id } => write!(f, "agent:{agent_id}"),
        }
    }
}
