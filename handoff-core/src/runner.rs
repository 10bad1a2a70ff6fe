//! Build and test collaborator invocation
//!
//! The build and test toolchain is external. Each call is awaited on its own
//! with a timeout and never retried; the exit code is the contract (0 is
//! success, anything else is a hard block).

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;

use crate::config::{Config, ToolConfig};
use crate::workflow::{GateSignals, TestCounts};
use crate::{Error, Result};

/// An external command with its time limit
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl ToolCommand {
    /// Create a command with a 10 minute timeout
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(600),
        }
    }

    /// Append arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<&ToolConfig> for ToolCommand {
    fn from(config: &ToolConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout: config.timeout,
        }
    }
}

/// Result of the build collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    pub exit_code: i32,
    pub duration_ms: u64,
    /// Combined stdout and stderr
    pub output: String,
}

impl BuildOutcome {
    /// Exit code 0
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Result of the test collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct TestOutcome {
    pub exit_code: i32,
    pub counts: TestCounts,
    pub duration_ms: u64,
    /// Combined stdout and stderr
    pub output: String,
}

struct RawOutput {
    exit_code: i32,
    stdout: String,
    stderr: String,
    duration_ms: u64,
}

/// Runs the configured build and test commands in a working tree
#[derive(Debug, Clone)]
pub struct CollaboratorRunner {
    workdir: PathBuf,
    build: ToolCommand,
    test: ToolCommand,
}

impl CollaboratorRunner {
    /// Create a runner using the commands from `config`
    pub fn new(workdir: impl Into<PathBuf>, config: &Config) -> Self {
        Self {
            workdir: workdir.into(),
            build: ToolCommand::from(&config.build),
            test: ToolCommand::from(&config.test),
        }
    }

    /// Override the build command
    pub fn with_build(mut self, build: ToolCommand) -> Self {
        self.build = build;
        self
    }

    /// Override the test command
    pub fn with_test(mut self, test: ToolCommand) -> Self {
        self.test = test;
        self
    }

    /// Run the build
    pub async fn run_build(&self) -> Result<BuildOutcome> {
        let raw = self.run(&self.build).await?;
        Ok(BuildOutcome {
            exit_code: raw.exit_code,
            duration_ms: raw.duration_ms,
            output: combine(&raw.stdout, &raw.stderr),
        })
    }

    /// Run the tests and parse the summary counts
    pub async fn run_tests(&self) -> Result<TestOutcome> {
        let raw = self.run(&self.test).await?;

        let mut counts = parse_test_summary(&raw.stdout, &raw.stderr).unwrap_or_default();
        // A failed run is a failure even when every parsed summary passed
        if raw.exit_code != 0 && counts.failed == 0 {
            tracing::warn!(
                exit_code = raw.exit_code,
                passed = counts.passed,
                "Test command failed without reporting failed tests"
            );
            counts.failed = 1;
        }

        Ok(TestOutcome {
            exit_code: raw.exit_code,
            counts,
            duration_ms: raw.duration_ms,
            output: combine(&raw.stdout, &raw.stderr),
        })
    }

    async fn run(&self, tool: &ToolCommand) -> Result<RawOutput> {
        let command_line = tool.display();
        tracing::debug!(command = %command_line, workdir = %self.workdir.display(), "Running collaborator");

        let child = Command::new(&tool.program)
            .args(&tool.args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::Collaborator(format!("'{}' not found. Is it installed?", tool.program))
                } else {
                    Error::Collaborator(format!("Failed to run '{}': {}", command_line, e))
                }
            })?;

        let start = Instant::now();
        let output = tokio::time::timeout(tool.timeout, child.wait_with_output())
            .await
            .map_err(|_| Error::Timeout {
                what: command_line.clone(),
                seconds: tool.timeout.as_secs(),
            })?
            .map_err(Error::Io)?;
        let duration_ms = start.elapsed().as_millis() as u64;

        // Killed by a signal has no code
        let exit_code = output.status.code().unwrap_or(-1);
        tracing::debug!(command = %command_line, exit_code, duration_ms, "Collaborator finished");

        Ok(RawOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms,
        })
    }
}

/// Combine build and test outcomes into gate signals
pub fn signals(build: &BuildOutcome, tests: &TestOutcome) -> GateSignals {
    GateSignals {
        build_exit_code: Some(build.exit_code),
        tests: Some(tests.counts),
        ..GateSignals::default()
    }
}

fn combine(stdout: &str, stderr: &str) -> String {
    if stderr.is_empty() {
        stdout.to_string()
    } else {
        format!("{}\n{}", stdout, stderr)
    }
}

/// Parse test counts from `dotnet test` or `cargo test` output
///
/// Returns None when no summary line is found. Counts from several test
/// projects are summed.
pub fn parse_test_summary(stdout: &str, stderr: &str) -> Option<TestCounts> {
    parse_dotnet_output(stdout, stderr).or_else(|| parse_cargo_output(stdout, stderr))
}

/// Parse "Passed!  - Failed: 0, Passed: 10, Skipped: 0, Total: 10, Duration: ..."
fn parse_dotnet_output(stdout: &str, stderr: &str) -> Option<TestCounts> {
    let mut counts = TestCounts::default();
    let mut found = false;

    for line in stdout.lines().chain(stderr.lines()) {
        let line = line.trim();
        let is_summary = ["Passed!", "Failed!", "Skipped!"]
            .iter()
            .any(|p| line.starts_with(p));
        if !is_summary {
            continue;
        }
        let Some((_, rest)) = line.split_once(" - ") else {
            continue;
        };

        found = true;
        for part in rest.split(',') {
            let Some((key, value)) = part.split_once(':') else {
                continue;
            };
            let value: u32 = value.trim().parse().unwrap_or(0);
            match key.trim() {
                "Passed" => counts.passed += value,
                "Failed" => counts.failed += value,
                "Skipped" => counts.skipped += value,
                _ => {}
            }
        }
    }

    found.then_some(counts)
}

/// Parse "test result: ok. 5 passed; 0 failed; 1 ignored"
fn parse_cargo_output(stdout: &str, stderr: &str) -> Option<TestCounts> {
    let mut counts = TestCounts::default();
    let mut found = false;

    for line in stdout.lines().chain(stderr.lines()) {
        let Some(rest) = line.trim().strip_prefix("test result:") else {
            continue;
        };
        found = true;
        for part in rest.split(';') {
            let words: Vec<&str> = part.split_whitespace().collect();
            for (i, word) in words.iter().enumerate().skip(1) {
                let n = words[i - 1].parse::<u32>().unwrap_or(0);
                match *word {
                    "passed" => counts.passed += n,
                    "failed" => counts.failed += n,
                    "ignored" => counts.skipped += n,
                    _ => {}
                }
            }
        }
    }

    found.then_some(counts)
}
