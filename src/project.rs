//! Seed project loading and the read-only tool registry.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::agents::{AgentNode, ToolRef};

/// On-disk project description consumed at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectFile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub agents: Vec<AgentNode>,
    #[serde(default)]
    pub mcp_servers: Vec<McpServerConfig>,
    #[serde(default)]
    pub custom_tools: Vec<CustomToolDef>,
}

/// An external tool server the surrounding application knows how to launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerConfig {
    pub name: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Tool names the server advertises. Empty means "unknown, accept any".
    #[serde(default)]
    pub tools: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomToolDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Lookup tables for resolving tool names, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    mcp_servers: IndexMap<String, McpServerConfig>,
    custom_tools: IndexMap<String, CustomToolDef>,
}

impl ToolRegistry {
    pub fn new(
        mcp_servers: impl IntoIterator<Item = McpServerConfig>,
        custom_tools: impl IntoIterator<Item = CustomToolDef>,
    ) -> Self {
        Self {
            mcp_servers: mcp_servers.into_iter().map(|s| (s.name.clone(), s)).collect(),
            custom_tools: custom_tools.into_iter().map(|t| (t.name.clone(), t)).collect(),
        }
    }

    pub fn from_project(project: &ProjectFile) -> Self {
        Self::new(project.mcp_servers.clone(), project.custom_tools.clone())
    }

    pub fn mcp(&self, name: &str) -> Option<&McpServerConfig> {
        self.mcp_servers.get(name)
    }

    pub fn custom(&self, name: &str) -> Option<&CustomToolDef> {
        self.custom_tools.get(name)
    }

    pub fn mcp_count(&self) -> usize {
        self.mcp_servers.len()
    }

    pub fn custom_count(&self) -> usize {
        self.custom_tools.len()
    }
}

pub fn load_project(path: &Path) -> Result<ProjectFile> {
    let data = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read project file: {}", path.display()))?;
    let mut project: ProjectFile = serde_json::from_str(&data)
        .wrap_err_with(|| format!("Failed to parse project file: {}", path.display()))?;
    if project.name.is_empty() {
        project.name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("project")
            .to_string();
    }
    Ok(project)
}

/// Small built-in project used when no file is given.
pub fn sample_project() -> ProjectFile {
    let researcher = {
        let mut node = AgentNode::llm("researcher").with_id("researcher");
        node.description = "Gathers sources".to_string();
        if let Some(tools) = node.tools_mut() {
            tools.push(ToolRef::Builtin {
                name: "google_search".to_string(),
            });
        }
        node
    };
    let writer = AgentNode::llm("writer").with_id("writer");
    let critic = AgentNode::llm("critic").with_id("critic");
    let refine = AgentNode::looping("refine", Some(3))
        .with_id("refine")
        .with_children(vec!["writer".into(), "critic".into()]);
    let pipeline = AgentNode::sequential("pipeline")
        .with_id("pipeline")
        .with_children(vec!["researcher".into(), "refine".into()]);

    ProjectFile {
        name: "sample".to_string(),
        agents: vec![pipeline, researcher, refine, writer, critic],
        mcp_servers: vec![McpServerConfig {
            name: "filesystem".to_string(),
            command: "npx".to_string(),
            args: vec!["@modelcontextprotocol/server-filesystem".to_string()],
            tools: vec!["read_file".to_string(), "write_file".to_string()],
        }],
        custom_tools: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_project_defaults_name_from_file_stem() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"{{"agents":[{{"id":"a","name":"a","type":"llm"}}],"custom_tools":[{{"name":"lookup"}}]}}"#
        )
        .unwrap();
        tmp.flush().unwrap();

        let project = load_project(tmp.path()).unwrap();
        assert!(!project.name.is_empty());
        assert_eq!(project.agents.len(), 1);
        let registry = ToolRegistry::from_project(&project);
        assert!(registry.custom("lookup").is_some());
        assert!(registry.mcp("lookup").is_none());
    }

    #[test]
    fn load_project_reports_parse_errors() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "not json").unwrap();
        tmp.flush().unwrap();

        let err = load_project(tmp.path()).unwrap_err();
        assert!(format!("{err}").contains("Failed to parse project file"));
    }

    #[test]
    fn sample_project_is_a_single_tree() {
        let project = sample_project();
        let store = crate::store::AgentStore::from_nodes(project.agents);
        assert_eq!(crate::tree::compute_roots(&store), vec!["pipeline"]);
    }
}
