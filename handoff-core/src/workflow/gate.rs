//! Quality gates evaluated at stage boundaries
//!
//! Criteria are split into hard blocks (build, tests) and soft checks
//! (documentation, coverage, checklist). Verdict policy:
//! - any hard criterion FAIL → FAIL, whatever the soft criteria say
//! - otherwise any soft criterion WARN → WARN
//! - otherwise PASS

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Stage;
use crate::config::GateConfig;

/// Status of a criterion, also used as the overall verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateStatus {
    /// Criterion met
    Pass,
    /// Soft criterion not met; progress continues
    Warn,
    /// Criterion failed
    Fail,
}

impl GateStatus {
    /// Whether the pipeline may move forward on this verdict
    pub fn allows_progress(&self) -> bool {
        !matches!(self, GateStatus::Fail)
    }
}

impl fmt::Display for GateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateStatus::Pass => write!(f, "PASS"),
            GateStatus::Warn => write!(f, "WARN"),
            GateStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// Whether a criterion blocks the pipeline when it fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriterionKind {
    /// Failure halts forward transition unconditionally
    Hard,
    /// Failure is reported as a warning
    Soft,
}

/// One evaluated criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    /// Short kebab-case name
    pub name: String,
    /// Hard or soft
    pub kind: CriterionKind,
    /// Outcome
    pub status: GateStatus,
    /// Human-readable explanation
    pub detail: String,
}

impl Criterion {
    fn hard(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            kind: CriterionKind::Hard,
            status: if passed { GateStatus::Pass } else { GateStatus::Fail },
            detail: detail.into(),
        }
    }

    fn soft(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            kind: CriterionKind::Soft,
            status: if passed { GateStatus::Pass } else { GateStatus::Warn },
            detail: detail.into(),
        }
    }

    /// Whether this is a failing hard block
    pub fn is_hard_failure(&self) -> bool {
        self.kind == CriterionKind::Hard && self.status == GateStatus::Fail
    }
}

/// Test pass/fail/skip counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCounts {
    /// Tests that passed
    pub passed: u32,
    /// Tests that failed
    pub failed: u32,
    /// Tests that were skipped
    pub skipped: u32,
}

impl TestCounts {
    /// Create counts
    pub fn new(passed: u32, failed: u32, skipped: u32) -> Self {
        Self {
            passed,
            failed,
            skipped,
        }
    }

    /// All tests that ran or were skipped
    pub fn total(&self) -> u32 {
        self.passed + self.failed + self.skipped
    }

    /// At least one test passed and none failed
    pub fn is_green(&self) -> bool {
        self.failed == 0 && self.passed > 0
    }
}

impl fmt::Display for TestCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} skipped",
            self.passed, self.failed, self.skipped
        )
    }
}

/// Raw signals a gate is evaluated against
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateSignals {
    /// Exit code of the build collaborator
    pub build_exit_code: Option<i32>,
    /// Test outcome counts
    pub tests: Option<TestCounts>,
    /// Coverage per plan checklist item (code and tests present)
    pub checklist: Vec<bool>,
    /// Whether documentation was updated
    pub documentation_complete: Option<bool>,
    /// Line coverage percentage
    pub coverage_percent: Option<f64>,
    /// Proposed commit message
    pub commit_message: Option<String>,
    /// Work item the signals belong to
    pub work_item_id: Option<u64>,
}

impl GateSignals {
    /// Set the build exit code
    pub fn with_build(mut self, exit_code: i32) -> Self {
        self.build_exit_code = Some(exit_code);
        self
    }

    /// Set the test counts
    pub fn with_tests(mut self, passed: u32, failed: u32, skipped: u32) -> Self {
        self.tests = Some(TestCounts::new(passed, failed, skipped));
        self
    }

    /// Set per-item checklist coverage
    pub fn with_checklist(mut self, checklist: Vec<bool>) -> Self {
        self.checklist = checklist;
        self
    }

    /// Set documentation completeness
    pub fn with_documentation(mut self, complete: bool) -> Self {
        self.documentation_complete = Some(complete);
        self
    }

    /// Set coverage percentage
    pub fn with_coverage(mut self, percent: f64) -> Self {
        self.coverage_percent = Some(percent);
        self
    }

    /// Set the commit message
    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = Some(message.into());
        self
    }

    /// Set the work item id
    pub fn with_work_item(mut self, id: u64) -> Self {
        self.work_item_id = Some(id);
        self
    }
}

/// Outcome of evaluating one stage's gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    /// Stage whose exit criteria were checked
    pub stage: Stage,
    /// Criteria in evaluation order
    pub criteria: Vec<Criterion>,
    /// Overall verdict
    pub verdict: GateStatus,
    /// When the gate was evaluated
    pub evaluated_at: DateTime<Utc>,
}

impl GateResult {
    /// Build a result and derive its verdict
    pub fn new(stage: Stage, criteria: Vec<Criterion>) -> Self {
        let verdict = verdict_for(&criteria);
        Self {
            stage,
            criteria,
            verdict,
            evaluated_at: Utc::now(),
        }
    }

    /// Failing hard criteria
    pub fn hard_failures(&self) -> Vec<&Criterion> {
        self.criteria.iter().filter(|c| c.is_hard_failure()).collect()
    }

    /// Soft criteria that were not met
    pub fn warnings(&self) -> Vec<&Criterion> {
        self.criteria
            .iter()
            .filter(|c| c.status == GateStatus::Warn)
            .collect()
    }

    /// Whether any hard block failed
    pub fn is_blocking(&self) -> bool {
        self.criteria.iter().any(Criterion::is_hard_failure)
    }

    /// One line per criterion, for terminal output
    pub fn summary(&self) -> String {
        let mut lines = vec![format!("{} gate: {}", self.stage, self.verdict)];
        for c in &self.criteria {
            let kind = match c.kind {
                CriterionKind::Hard => "hard",
                CriterionKind::Soft => "soft",
            };
            lines.push(format!("  [{}] {} ({}): {}", c.status, c.name, kind, c.detail));
        }
        lines.join("\n")
    }
}

/// Derive the overall verdict from evaluated criteria
pub fn verdict_for(criteria: &[Criterion]) -> GateStatus {
    if criteria.iter().any(Criterion::is_hard_failure) {
        return GateStatus::Fail;
    }
    if criteria.iter().any(|c| c.status != GateStatus::Pass) {
        return GateStatus::Warn;
    }
    GateStatus::Pass
}

/// Evaluates stage exit criteria against supplied signals
#[derive(Debug, Clone, Default)]
pub struct GateEvaluator {
    config: GateConfig,
}

impl GateEvaluator {
    /// Create an evaluator with the given thresholds
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    /// Evaluate the exit criteria of `stage`
    pub fn evaluate(&self, stage: Stage, signals: &GateSignals) -> GateResult {
        let criteria = match stage {
            Stage::Orchestrator | Stage::Complete => Vec::new(),
            Stage::WorkItemPickup => vec![work_item_selected(signals)],
            Stage::Planner => vec![checklist_defined(signals)],
            Stage::Coder => vec![
                build_criterion(signals),
                tests_criterion(signals),
                checklist_coverage(signals),
                documentation(signals),
            ],
            Stage::Reviewer => vec![
                build_criterion(signals),
                tests_criterion(signals),
                self.coverage(signals),
                documentation(signals),
            ],
            Stage::Committer => vec![
                build_criterion(signals),
                tests_criterion(signals),
                commit_message(signals),
            ],
            Stage::PrCreator => vec![build_criterion(signals), tests_criterion(signals)],
        };

        let result = GateResult::new(stage, criteria);

        for warning in result.warnings() {
            tracing::warn!(stage = %stage, criterion = %warning.name, detail = %warning.detail, "Soft criterion not met");
        }
        tracing::debug!(stage = %stage, verdict = %result.verdict, "Gate evaluated");

        result
    }

    fn coverage(&self, signals: &GateSignals) -> Criterion {
        let threshold = self.config.coverage_threshold;
        match signals.coverage_percent {
            Some(pct) => Criterion::soft(
                "coverage",
                pct >= threshold,
                format!("{:.1}% (threshold {:.1}%)", pct, threshold),
            ),
            None => Criterion::soft("coverage", false, "not reported"),
        }
    }
}

fn build_criterion(signals: &GateSignals) -> Criterion {
    match signals.build_exit_code {
        Some(0) => Criterion::hard("build", true, "exit code 0"),
        Some(code) => Criterion::hard("build", false, format!("exit code {}", code)),
        None => Criterion::hard("build", false, "not reported"),
    }
}

fn tests_criterion(signals: &GateSignals) -> Criterion {
    match signals.tests {
        Some(counts) if counts.failed > 0 => {
            Criterion::hard("tests", false, counts.to_string())
        }
        Some(counts) if counts.passed == 0 => {
            Criterion::hard("tests", false, format!("no tests passed ({})", counts))
        }
        Some(counts) => Criterion::hard("tests", true, counts.to_string()),
        None => Criterion::hard("tests", false, "not reported"),
    }
}

fn work_item_selected(signals: &GateSignals) -> Criterion {
    match signals.work_item_id {
        Some(id) => Criterion::soft("work-item-selected", true, format!("#{}", id)),
        None => Criterion::soft("work-item-selected", false, "no work item recorded"),
    }
}

fn checklist_defined(signals: &GateSignals) -> Criterion {
    let n = signals.checklist.len();
    Criterion::soft(
        "checklist-defined",
        n > 0,
        format!("{} checklist item(s)", n),
    )
}

fn checklist_coverage(signals: &GateSignals) -> Criterion {
    let total = signals.checklist.len();
    let covered = signals.checklist.iter().filter(|c| **c).count();
    if total == 0 {
        return Criterion::soft("checklist-coverage", false, "no checklist items reported");
    }
    Criterion::soft(
        "checklist-coverage",
        covered == total,
        format!("{}/{} items covered", covered, total),
    )
}

fn documentation(signals: &GateSignals) -> Criterion {
    match signals.documentation_complete {
        Some(true) => Criterion::soft("documentation", true, "complete"),
        Some(false) => Criterion::soft("documentation", false, "incomplete"),
        None => Criterion::soft("documentation", false, "not reported"),
    }
}

fn commit_message(signals: &GateSignals) -> Criterion {
    let Some(ref message) = signals.commit_message else {
        return Criterion::soft("commit-message", false, "not reported");
    };
    let Some(id) = signals.work_item_id else {
        return Criterion::soft("commit-message", false, "no work item to reference");
    };

    let linked = references_work_item(message, id);
    Criterion::soft(
        "commit-message",
        linked,
        if linked {
            format!("references #{}", id)
        } else {
            format!("does not reference AB#{}", id)
        },
    )
}

/// Whether a commit message links the work item as `AB#id` or `#id`
pub fn references_work_item(message: &str, id: u64) -> bool {
    let needle = format!("#{}", id);
    message.match_indices(&needle).any(|(pos, _)| {
        let end = pos + needle.len();
        // Reject "#123" matching inside "#1234"
        !message[end..].starts_with(|c: char| c.is_ascii_digit())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn green() -> GateSignals {
        GateSignals::default()
            .with_work_item(12345)
            .with_build(0)
            .with_tests(10, 0, 0)
            .with_checklist(vec![true, true, true])
            .with_documentation(true)
            .with_coverage(91.0)
            .with_commit_message("AB#12345 Add IBAN validation")
    }

    #[test]
    fn test_all_green_passes_every_stage() {
        let evaluator = GateEvaluator::default();
        for stage in crate::workflow::PIPELINE {
            let result = evaluator.evaluate(*stage, &green());
            assert_eq!(result.verdict, GateStatus::Pass, "stage {}", stage);
        }
    }

    #[test]
    fn test_build_failure_always_fails() {
        let evaluator = GateEvaluator::default();
        let signals = green().with_build(1);
        for stage in [
            Stage::Coder,
            Stage::Reviewer,
            Stage::Committer,
            Stage::PrCreator,
        ] {
            let result = evaluator.evaluate(stage, &signals);
            assert_eq!(result.verdict, GateStatus::Fail);
            assert_eq!(result.hard_failures()[0].name, "build");
        }
    }

    #[test]
    fn test_hard_failure_wins_over_soft_failures() {
        let signals = GateSignals::default()
            .with_build(2)
            .with_tests(10, 0, 0)
            .with_documentation(false);
        let result = GateEvaluator::default().evaluate(Stage::Coder, &signals);
        assert_eq!(result.verdict, GateStatus::Fail);
        assert!(result.is_blocking());
    }

    #[test]
    fn test_failed_tests_fail() {
        let signals = green().with_tests(9, 1, 0);
        let result = GateEvaluator::default().evaluate(Stage::Coder, &signals);
        assert_eq!(result.verdict, GateStatus::Fail);
        assert_eq!(result.hard_failures()[0].name, "tests");
    }

    #[test]
    fn test_zero_tests_fail() {
        let signals = green().with_tests(0, 0, 4);
        let result = GateEvaluator::default().evaluate(Stage::Coder, &signals);
        assert_eq!(result.verdict, GateStatus::Fail);
    }

    #[test]
    fn test_missing_hard_signal_fails() {
        let signals = GateSignals {
            build_exit_code: None,
            ..green()
        };
        let result = GateEvaluator::default().evaluate(Stage::PrCreator, &signals);
        assert_eq!(result.verdict, GateStatus::Fail);
        assert_eq!(result.hard_failures()[0].detail, "not reported");
    }

    #[test]
    fn test_one_soft_missing_warns() {
        let signals = GateSignals {
            documentation_complete: None,
            ..green()
        };
        let result = GateEvaluator::default().evaluate(Stage::Coder, &signals);
        assert_eq!(result.verdict, GateStatus::Warn);
        assert!(!result.is_blocking());
        assert_eq!(result.warnings().len(), 1);
        assert_eq!(result.warnings()[0].name, "documentation");
    }

    #[test]
    fn test_partial_checklist_warns() {
        let signals = green().with_checklist(vec![true, false, true]);
        let result = GateEvaluator::default().evaluate(Stage::Coder, &signals);
        assert_eq!(result.verdict, GateStatus::Warn);
        assert!(result.warnings()[0].detail.contains("2/3"));
    }

    #[test]
    fn test_coverage_threshold() {
        let evaluator = GateEvaluator::new(GateConfig {
            coverage_threshold: 95.0,
        });
        let result = evaluator.evaluate(Stage::Reviewer, &green());
        assert_eq!(result.verdict, GateStatus::Warn);

        let result = evaluator.evaluate(Stage::Reviewer, &green().with_coverage(95.0));
        assert_eq!(result.verdict, GateStatus::Pass);
    }

    #[test]
    fn test_commit_message_reference() {
        assert!(references_work_item("AB#12345 Add IBAN validation", 12345));
        assert!(references_work_item("Fix rounding (#12345)", 12345));
        assert!(!references_work_item("AB#123456 Unrelated", 12345));
        assert!(!references_work_item("Add IBAN validation", 12345));

        let signals = green().with_commit_message("Add IBAN validation");
        let result = GateEvaluator::default().evaluate(Stage::Committer, &signals);
        assert_eq!(result.verdict, GateStatus::Warn);
    }

    #[test]
    fn test_planner_requires_checklist() {
        let result = GateEvaluator::default().evaluate(Stage::Planner, &GateSignals::default());
        assert_eq!(result.verdict, GateStatus::Warn);
    }

    #[test]
    fn test_orchestrator_has_no_criteria() {
        let result =
            GateEvaluator::default().evaluate(Stage::Orchestrator, &GateSignals::default());
        assert!(result.criteria.is_empty());
        assert_eq!(result.verdict, GateStatus::Pass);
    }

    #[test]
    fn test_status_ordering() {
        assert!(GateStatus::Pass < GateStatus::Warn);
        assert!(GateStatus::Warn < GateStatus::Fail);
        assert!(GateStatus::Warn.allows_progress());
        assert!(!GateStatus::Fail.allows_progress());
    }

    #[test]
    fn test_summary_lists_criteria() {
        let result = GateEvaluator::default().evaluate(Stage::Coder, &green().with_build(1));
        let summary = result.summary();
        assert!(summary.starts_with("coder gate: FAIL"));
        assert!(summary.contains("[FAIL] build (hard): exit code 1"));
    }
}
