//! Script execution
//!
//! Scripts are run one at a time with a timeout and never retried. Their
//! stdout is JSON; an `{"error": true, ...}` envelope is surfaced verbatim as
//! [`Error::ExternalApi`].

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::env::{DevOpsEnv, PAT_VAR};
use crate::query::ScriptQuery;
use crate::{Error, Result};

/// One process to run
#[derive(Clone)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment, values are never logged
    pub env: Vec<(String, String)>,
    pub timeout: Duration,
}

impl std::fmt::Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<&str> = self.env.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("Invocation")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("env", &keys)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// What a finished process left behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Runs a script process; substituted in tests
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    /// Run to completion or fail with [`Error::Timeout`]
    async fn execute(&self, invocation: &Invocation) -> Result<ScriptOutput>;
}

/// Runs scripts as child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

#[async_trait]
impl ScriptExecutor for ProcessExecutor {
    async fn execute(&self, invocation: &Invocation) -> Result<ScriptOutput> {
        let script = invocation
            .args
            .first()
            .cloned()
            .unwrap_or_else(|| invocation.program.clone());

        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Spawn(format!("{} {}: {}", invocation.program, script, e)))?;

        let output = tokio::time::timeout(invocation.timeout, child.wait_with_output())
            .await
            .map_err(|_| Error::Timeout {
                script,
                seconds: invocation.timeout.as_secs(),
            })??;

        Ok(ScriptOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// Runs Azure DevOps script queries
#[derive(Debug, Clone)]
pub struct ScriptRunner<E = ProcessExecutor> {
    env: DevOpsEnv,
    python: String,
    scripts_dir: PathBuf,
    timeout: Duration,
    executor: E,
}

impl ScriptRunner<ProcessExecutor> {
    /// Runner with default interpreter, script location and 30s timeout
    pub fn new(env: DevOpsEnv) -> Self {
        Self::with_executor(env, ProcessExecutor)
    }
}

impl<E: ScriptExecutor> ScriptRunner<E> {
    /// Runner using a custom executor
    pub fn with_executor(env: DevOpsEnv, executor: E) -> Self {
        Self {
            env,
            python: "python3".to_string(),
            scripts_dir: PathBuf::from(".github/skills/azure-devops-api/scripts"),
            timeout: Duration::from_secs(30),
            executor,
        }
    }

    /// Set the interpreter
    pub fn python(mut self, python: impl Into<String>) -> Self {
        self.python = python.into();
        self
    }

    /// Set the scripts directory
    pub fn scripts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scripts_dir = dir.into();
        self
    }

    /// Set the per-call timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the process invocation for a query
    pub fn invocation<Q: ScriptQuery>(&self, query: &Q) -> Result<Invocation> {
        let script = self.scripts_dir.join(query.script());
        let mut args = vec![
            script.to_string_lossy().to_string(),
            "--org".to_string(),
            self.env.org.clone(),
            "--project".to_string(),
            self.env.project.clone(),
        ];
        args.extend(query.args(&self.env)?);

        Ok(Invocation {
            program: self.python.clone(),
            args,
            env: vec![(PAT_VAR.to_string(), self.env.pat().to_string())],
            timeout: self.timeout,
        })
    }

    /// Run a query and decode its output
    pub async fn run<Q: ScriptQuery>(&self, query: &Q) -> Result<Q::Output> {
        let invocation = self.invocation(query)?;
        let flags = &invocation.args[1..];
        tracing::debug!(
            script = query.script(),
            args = ?flags,
            "Running Azure DevOps script"
        );

        let output = self.executor.execute(&invocation).await?;
        tracing::debug!(
            script = query.script(),
            exit_code = output.exit_code,
            "Script finished"
        );

        decode(query.script(), output)
    }
}

fn decode<T: serde::de::DeserializeOwned>(script: &str, output: ScriptOutput) -> Result<T> {
    let value: Option<serde_json::Value> = serde_json::from_str(output.stdout.trim()).ok();

    if let Some(ref value) = value {
        if let Ok(envelope) = ErrorEnvelope::deserialize(value) {
            if envelope.error {
                return Err(Error::ExternalApi {
                    status: envelope.status.unwrap_or(0),
                    message: envelope.message.unwrap_or_default(),
                    details: envelope.details.unwrap_or_default(),
                });
            }
        }
    }

    if output.exit_code != 0 {
        return Err(Error::ExternalApi {
            status: 0,
            message: format!("{} exited with code {}", script, output.exit_code),
            details: output.stderr.trim().to_string(),
        });
    }

    let value = value.ok_or_else(|| Error::Parse(format!("{} did not print JSON", script)))?;
    serde_json::from_value(value)
        .map_err(|e| Error::Parse(format!("Unexpected {} output: {}", script, e)))
}
