//! Optional text-to-speech output for analysis results.
//!
//! Narration sits outside the analysis pipeline: handlers call it after a
//! result is produced, only when a narrator is configured and the client asked
//! for it. A narration failure never fails the analysis.

use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("Failed to start narrator '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Narrator exited with status {status:?}: {stderr}")]
    Failed { status: Option<i32>, stderr: String },
}

#[async_trait]
pub trait Narrator: Send + Sync {
    async fn speak(&self, text: &str) -> Result<(), NarrationError>;
}

/// Runs an external text-to-speech program (e.g. `espeak`) with the text as
/// its final argument and waits for it to finish.
#[derive(Debug, Clone)]
pub struct CommandNarrator {
    program: String,
    args: Vec<String>,
}

impl CommandNarrator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parses a whitespace-separated command line such as `"espeak -s 150"`.
    /// Returns `None` for a blank line.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl Narrator for CommandNarrator {
    async fn speak(&self, text: &str) -> Result<(), NarrationError> {
        debug!("Narrating {} chars via {}", text.len(), self.program);

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| NarrationError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(NarrationError::Failed {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}
