//! Gate signal flags shared by gate, advance, send-back and verify

use clap::Args;
use handoff_core::verify::checklist_coverage;
use handoff_core::workflow::TestCounts;
use handoff_core::{CollaboratorRunner, GateSignals, StageTracker};

use super::Workspace;

/// Raw signals, supplied as flags or collected by running the toolchain
#[derive(Args, Debug, Clone, Default)]
pub struct SignalArgs {
    /// Run the configured build and test commands
    #[arg(long)]
    pub run: bool,

    /// Build exit code
    #[arg(long, value_name = "CODE", allow_negative_numbers = true)]
    pub build_exit: Option<i32>,

    /// Tests passed
    #[arg(long)]
    pub passed: Option<u32>,

    /// Tests failed
    #[arg(long)]
    pub failed: Option<u32>,

    /// Tests skipped
    #[arg(long)]
    pub skipped: Option<u32>,

    /// Line coverage percentage
    #[arg(long, value_name = "PERCENT")]
    pub coverage: Option<f64>,

    /// Whether documentation is complete
    #[arg(long, value_name = "BOOL")]
    pub documentation: Option<bool>,

    /// Proposed commit message
    #[arg(long)]
    pub commit_message: Option<String>,
}

impl SignalArgs {
    fn test_counts(&self) -> Option<TestCounts> {
        if self.passed.is_none() && self.failed.is_none() && self.skipped.is_none() {
            return None;
        }
        Some(TestCounts::new(
            self.passed.unwrap_or(0),
            self.failed.unwrap_or(0),
            self.skipped.unwrap_or(0),
        ))
    }

    /// Collect signals for the tracker's work item
    ///
    /// Flags override anything gathered with `--run`. The checklist is
    /// derived from the registered plan with the verifier's per-item check.
    pub async fn collect(&self, ws: &Workspace, tracker: &StageTracker) -> anyhow::Result<GateSignals> {
        let mut signals = if self.run {
            run_toolchain(ws).await?
        } else {
            GateSignals::default()
        };

        if let Some(code) = self.build_exit {
            signals.build_exit_code = Some(code);
        }
        if let Some(counts) = self.test_counts() {
            signals.tests = Some(counts);
        }
        if let Some(pct) = self.coverage {
            signals.coverage_percent = Some(pct);
        }
        if let Some(done) = self.documentation {
            signals.documentation_complete = Some(done);
        }
        if let Some(ref message) = self.commit_message {
            signals.commit_message = Some(message.clone());
        }

        signals.work_item_id = Some(tracker.work_item().id);
        if let Some(plan) = ws.try_load_plan(tracker)? {
            signals.checklist = checklist_coverage(&plan);
        }

        Ok(signals)
    }
}

/// Run build, then tests when the build succeeded
async fn run_toolchain(ws: &Workspace) -> anyhow::Result<GateSignals> {
    let runner = CollaboratorRunner::new(&ws.workdir, &ws.config);

    println!("Running build: {}", ws.config.build.command_line());
    let build = runner.run_build().await?;
    println!("  exit code {} ({} ms)", build.exit_code, build.duration_ms);

    if !build.succeeded() {
        tracing::warn!(exit_code = build.exit_code, "Build failed; skipping tests");
        return Ok(GateSignals {
            build_exit_code: Some(build.exit_code),
            ..GateSignals::default()
        });
    }

    println!("Running tests: {}", ws.config.test.command_line());
    let tests = runner.run_tests().await?;
    println!("  {} ({} ms)", tests.counts, tests.duration_ms);

    Ok(handoff_core::runner::signals(&build, &tests))
}

#[cfg(test)]
mod tests {
    use super::*;
    use handoff_core::config::ToolConfig;
    use handoff_core::{Config, GateEvaluator, GateStatus, Stage};
    use std::time::Duration;

    #[test]
    fn test_counts_only_when_given() {
        assert_eq!(SignalArgs::default().test_counts(), None);
        let args = SignalArgs {
            passed: Some(10),
            ..Default::default()
        };
        assert_eq!(args.test_counts(), Some(TestCounts::new(10, 0, 0)));
    }

    #[cfg(unix)]
    fn sh(script: &str) -> ToolConfig {
        ToolConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            timeout: Duration::from_secs(30),
        }
    }

    #[cfg(unix)]
    fn workspace(build: &str, test: &str) -> Workspace {
        let mut config = Config::default();
        config.build = sh(build);
        config.test = sh(test);
        Workspace::new(".", config)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_toolchain_failing_test_exit_blocks() {
        let ws = workspace(
            "exit 0",
            "echo 'test result: ok. 5 passed; 0 failed; 0 ignored'; exit 101",
        );
        let signals = run_toolchain(&ws).await.unwrap();
        assert_eq!(signals.build_exit_code, Some(0));
        assert_eq!(signals.tests, Some(TestCounts::new(5, 1, 0)));

        let gate = GateEvaluator::new(ws.config.gates.clone()).evaluate(Stage::Coder, &signals);
        assert_eq!(gate.verdict, GateStatus::Fail);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_toolchain_skips_tests_after_failed_build() {
        let ws = workspace("exit 1", "echo should-not-run; exit 0");
        let signals = run_toolchain(&ws).await.unwrap();
        assert_eq!(signals.build_exit_code, Some(1));
        assert_eq!(signals.tests, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_toolchain_green() {
        let ws = workspace(
            "exit 0",
            "echo 'Passed!  - Failed: 0, Passed: 10, Skipped: 0, Total: 10'",
        );
        let signals = run_toolchain(&ws).await.unwrap();
        assert_eq!(signals.tests, Some(TestCounts::new(10, 0, 0)));
    }
}
