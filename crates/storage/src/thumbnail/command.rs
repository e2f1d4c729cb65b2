//! Resizer that shells out to an external resize-to-height executable.

use super::Resizer;
use crate::error::{DeriveError, DeriveResult};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Runs `program` with `{input}`, `{output}` and `{height}` substituted in `args`.
#[derive(Debug, Clone)]
pub struct CommandResizer {
    program: String,
    args: Vec<String>,
}

impl CommandResizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn expand_args(&self, input: &Path, output: &Path, height: u32) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        let height = height.to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{input}", &input)
                    .replace("{output}", &output)
                    .replace("{height}", &height)
            })
            .collect()
    }
}

#[async_trait]
impl Resizer for CommandResizer {
    async fn resize_to_height(
        &self,
        input: &Path,
        output: &Path,
        height: u32,
    ) -> DeriveResult<()> {
        let args = self.expand_args(input, output, height);
        tracing::debug!(program = %self.program, ?args, "Running resize command");

        // kill_on_drop reaps the child when the caller's timeout fires
        let result = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| DeriveError::Failed(format!("failed to run {}: {e}", self.program)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(DeriveError::Failed(format!(
                "{} exited with {}: {}",
                self.program,
                result.status,
                stderr.trim()
            )));
        }

        if !tokio::fs::try_exists(output).await? {
            return Err(DeriveError::Failed(format!(
                "{} produced no output file",
                self.program
            )));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "command"
    }
}
