use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use color_eyre::eyre::{bail, eyre, Result, WrapErr};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{GenerationRequest, GenerationResponse, Generator};

/// Runs an external program per request: the request JSON goes to its stdin
/// and a response JSON is read back from its stdout.
pub struct CommandGenerator {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl Generator for CommandGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        let payload = serde_json::to_vec(&request)?;
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .wrap_err_with(|| format!("Failed to start generator {}", self.program.display()))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| eyre!("generator stdin unavailable"))?;
        stdin.write_all(&payload).await?;
        drop(stdin);

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "generator exited with {}: {}",
                output.status,
                stderr.trim()
            );
        }
        serde_json::from_slice(&output.stdout).wrap_err("Generator printed an invalid response")
    }
}

/// Stand-in used when no generator program is configured.
pub struct UnconfiguredGenerator;

#[async_trait]
impl Generator for UnconfiguredGenerator {
    async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse> {
        Err(eyre!("no generator configured (pass --generator)"))
    }
}
