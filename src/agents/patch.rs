use super::{AgentKind, AgentNode};

/// Partial-field update for an agent. `None` leaves the field untouched.
/// Kind-specific fields only land on nodes whose kind carries them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub model: Option<String>,
    pub instruction: Option<String>,
    pub output_key: Option<Option<String>>,
    pub max_iterations: Option<Option<u32>>,
    pub agent_card_url: Option<String>,
}

impl AgentPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn apply(self, node: &mut AgentNode) {
        if let Some(name) = self.name {
            node.name = name;
        }
        if let Some(description) = self.description {
            node.description = description;
        }
        match &mut node.kind {
            AgentKind::Llm(llm) => {
                if let Some(model) = self.model {
                    llm.model = model;
                }
                if let Some(instruction) = self.instruction {
                    llm.instruction = instruction;
                }
                if let Some(output_key) = self.output_key {
                    llm.output_key = output_key;
                }
            }
            AgentKind::Loop(l) => {
                if let Some(max) = self.max_iterations {
                    l.max_iterations = max;
                }
            }
            AgentKind::Remote(r) => {
                if let Some(url) = self.agent_card_url {
                    r.agent_card_url = url;
                }
            }
            AgentKind::Sequential(_) | AgentKind::Parallel(_) => {}
        }
    }
}
