//! Background agent generation.
//!
//! Each request runs as its own task on the tokio runtime. The tracker only
//! knows which tokens are in flight; finished work is handed back to the
//! interaction thread as an [`AppEvent::GenerationSettled`] and applied there.

pub mod command;
pub mod materialize;

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use color_eyre::eyre::{eyre, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tracing::{error, info};
use uuid::Uuid;

use crate::agents::AgentId;
use crate::events::AppEvent;
use crate::project::ToolRegistry;
use crate::store::AgentStore;
use crate::tree::attach_child;

pub use command::{CommandGenerator, UnconfiguredGenerator};
pub use materialize::materialize;

/// Ephemeral id of one in-flight generation. Never persisted or reused.
pub type Token = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    #[serde(rename = "contextId")]
    pub context_id: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<GeneratedConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeneratedConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub output_key: Option<String>,
    #[serde(default)]
    pub sub_agents: Vec<String>,
    #[serde(default)]
    pub tools: GeneratedTools,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeneratedTools {
    #[serde(default)]
    pub builtin: Vec<String>,
    #[serde(default)]
    pub mcp: Vec<GeneratedMcp>,
    #[serde(default)]
    pub custom: Vec<String>,
    #[serde(default)]
    pub agents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeneratedMcp {
    pub server: String,
    #[serde(default)]
    pub tools: Vec<String>,
}

/// The external generation call. An `Err` models a client-side failure
/// (transport, process, decoding); a response with `success: false` models a
/// failure reported by the generator itself.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse>;
}

/// Where generation failures go. Must not block.
pub trait FailureReporter {
    fn report(&self, token: Token, description: &str, error: &color_eyre::Report);
}

pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(&self, token: Token, description: &str, err: &color_eyre::Report) {
        error!(%token, description, error = %format!("{err:#}"), "agent generation failed");
    }
}

/// A finished generation, successful or not.
#[derive(Debug)]
pub struct GenerationSettled {
    pub token: Token,
    pub description: String,
    pub outcome: Result<GeneratedConfig>,
}

type RunningSet = Arc<Mutex<IndexMap<Token, String>>>;

pub struct GenerationTracker {
    generator: Arc<dyn Generator>,
    runtime: Handle,
    events: Sender<AppEvent>,
    context_id: String,
    running: RunningSet,
}

impl GenerationTracker {
    pub fn new(
        generator: Arc<dyn Generator>,
        runtime: Handle,
        events: Sender<AppEvent>,
        context_id: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            runtime,
            events,
            context_id: context_id.into(),
            running: Arc::new(Mutex::new(IndexMap::new())),
        }
    }

    /// Register a new request and dispatch it without waiting for it.
    pub fn start(&self, description: impl Into<String>) -> Token {
        let token = Uuid::new_v4();
        let description = description.into();
        lock(&self.running).insert(token, description.clone());
        info!(%token, description = %description, "agent generation started");

        let guard = RunningGuard {
            running: Arc::clone(&self.running),
            token,
        };
        let generator = Arc::clone(&self.generator);
        let events = self.events.clone();
        let request = GenerationRequest {
            context_id: self.context_id.clone(),
            description: description.clone(),
        };

        let runtime = self.runtime.clone();
        self.runtime.spawn(async move {
            let response = {
                // Released on every exit from this block, including the task
                // being dropped unpolled.
                let _guard = guard;
                // The call runs as its own task so a panic comes back as a
                // JoinError and still settles.
                let call = runtime.spawn(async move { generator.generate(request).await });
                match call.await {
                    Ok(response) => response,
                    Err(join) if join.is_panic() => Err(eyre!("generator panicked")),
                    Err(join) => Err(eyre!("generator task aborted: {join}")),
                }
            };
            let outcome = response.and_then(into_config);
            let _ = events.send(AppEvent::GenerationSettled(GenerationSettled {
                token,
                description,
                outcome,
            }));
        });

        token
    }

    /// In-flight requests in start order.
    pub fn running(&self) -> Vec<(Token, String)> {
        lock(&self.running)
            .iter()
            .map(|(t, d)| (*t, d.clone()))
            .collect()
    }

    pub fn is_running(&self, token: Token) -> bool {
        lock(&self.running).contains_key(&token)
    }

    pub fn len(&self) -> usize {
        lock(&self.running).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.running).is_empty()
    }
}

/// Apply a settled generation to the store. Returns the new node's id on
/// success; failures go to `reporter` and leave the store untouched.
pub fn apply_settled(
    settled: GenerationSettled,
    store: &mut AgentStore,
    registry: &ToolRegistry,
    reporter: &dyn FailureReporter,
) -> Option<AgentId> {
    match settled.outcome {
        Ok(config) => {
            let (node, sub_agents) = materialize(&config, store, registry);
            let id = node.id.clone();
            store.upsert(node);
            for child in sub_agents {
                attach_child(store, &id, &child);
            }
            info!(token = %settled.token, agent = %id, "generated agent added");
            Some(id)
        }
        Err(err) => {
            reporter.report(settled.token, &settled.description, &err);
            None
        }
    }
}

fn into_config(response: GenerationResponse) -> Result<GeneratedConfig> {
    match response {
        GenerationResponse {
            success: true,
            config: Some(config),
            ..
        } => Ok(config),
        GenerationResponse { success: true, .. } => {
            Err(eyre!("generator reported success without a config"))
        }
        GenerationResponse { error, .. } => Err(eyre!(
            "{}",
            error.unwrap_or_else(|| "generation failed".to_string())
        )),
    }
}

struct RunningGuard {
    running: RunningSet,
    token: Token,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        lock(&self.running).shift_remove(&self.token);
    }
}

fn lock(running: &RunningSet) -> MutexGuard<'_, IndexMap<Token, String>> {
    running.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "../../tests/helpers/mod.rs"]
#[allow(dead_code)]
mod helpers;
