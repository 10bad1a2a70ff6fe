//! Stage tracking for a single work item
//!
//! The tracker owns the work item's current stage, the artifacts produced so
//! far and an audit trail of stage entries. It is persisted as
//! `.planning/state.json`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::gate::{GateResult, GateStatus};
use super::router::{route, Route};
use super::work_item::WorkItem;
use super::Stage;
use crate::{Error, Result};

/// Audit record of entering a stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEntry {
    /// Stage entered
    pub stage: Stage,
    /// When it was entered
    pub entered_at: DateTime<Utc>,
    /// Verdict of the gate that led here (None for the initial stage)
    pub verdict: Option<GateStatus>,
}

/// Document artifacts produced for the work item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artifacts {
    /// PLAN.md written by the Planner
    pub plan: Option<PathBuf>,
    /// Report written by the Implementation Verifier
    pub verification_report: Option<PathBuf>,
    /// Findings written by a Spike
    pub spike_findings: Option<PathBuf>,
}

/// Tracks one work item through the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTracker {
    work_item: WorkItem,
    #[serde(default)]
    artifacts: Artifacts,
    #[serde(default)]
    history: Vec<StageEntry>,
    /// Directory relative artifact paths are resolved against
    #[serde(skip)]
    root: Option<PathBuf>,
}

impl StageTracker {
    /// Start tracking a work item at its current stage
    pub fn new(work_item: WorkItem) -> Self {
        let entry = StageEntry {
            stage: work_item.stage,
            entered_at: Utc::now(),
            verdict: None,
        };
        Self {
            work_item,
            artifacts: Artifacts::default(),
            history: vec![entry],
            root: None,
        }
    }

    /// Resolve relative artifact paths against `root` instead of the
    /// current directory
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// The tracked work item
    pub fn work_item(&self) -> &WorkItem {
        &self.work_item
    }

    /// The stage the work item occupies
    pub fn current_stage(&self) -> Stage {
        self.work_item.stage
    }

    /// Artifacts registered so far
    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    /// Audit trail of stage entries, oldest first
    pub fn history(&self) -> &[StageEntry] {
        &self.history
    }

    /// When the current stage was entered
    pub fn entered_current_at(&self) -> Option<DateTime<Utc>> {
        self.history.last().map(|e| e.entered_at)
    }

    /// Record that PLAN.md exists at `path`
    pub fn register_plan(&mut self, path: impl Into<PathBuf>) {
        self.artifacts.plan = Some(path.into());
    }

    /// Record the verification report location
    pub fn register_verification_report(&mut self, path: impl Into<PathBuf>) {
        self.artifacts.verification_report = Some(path.into());
    }

    /// Record the spike findings location
    pub fn register_spike_findings(&mut self, path: impl Into<PathBuf>) {
        self.artifacts.spike_findings = Some(path.into());
    }

    /// Path of the registered plan.
    ///
    /// Fails with [`Error::PlanMissing`] until the Planner has produced one.
    pub fn plan_path(&self) -> Result<&Path> {
        self.artifacts
            .plan
            .as_deref()
            .ok_or(Error::PlanMissing(self.work_item.id))
    }

    /// Move the work item forward according to `gate`.
    ///
    /// Fails with [`Error::BlockedTransition`] when any hard criterion failed;
    /// the work item stays where it is.
    pub fn advance(&mut self, gate: &GateResult) -> Result<Stage> {
        let current = self.check_gate_stage(gate)?;

        if current.is_terminal() {
            return Err(Error::InvalidTransition(format!(
                "Work item #{} is already complete",
                self.work_item.id
            )));
        }

        if gate.is_blocking() {
            let failed: Vec<String> = gate.hard_failures().iter().map(|c| c.name.clone()).collect();
            let return_to = current.producer();
            tracing::warn!(
                work_item = self.work_item.id,
                stage = %current,
                failed = ?failed,
                return_to = %return_to,
                "Transition blocked"
            );
            return Err(Error::BlockedTransition {
                stage: current,
                failed,
                return_to,
            });
        }

        let next = match route(current, gate.verdict) {
            Route::Forward(next) => next,
            other => {
                return Err(Error::InvalidTransition(format!(
                    "Unexpected route {:?} from {}",
                    other, current
                )))
            }
        };

        if next == Stage::Coder {
            self.require_plan_on_disk()?;
        }

        self.enter(next, gate.verdict);
        Ok(next)
    }

    /// Hand a failed gate back to the stage that produced the work
    pub fn send_back(&mut self, gate: &GateResult) -> Result<Stage> {
        let current = self.check_gate_stage(gate)?;

        if !gate.is_blocking() {
            return Err(Error::InvalidTransition(format!(
                "{} gate did not fail ({}); nothing to send back",
                current, gate.verdict
            )));
        }

        let target = route(current, gate.verdict)
            .target()
            .unwrap_or(current.producer());
        if target == Stage::Coder {
            self.require_plan_on_disk()?;
        }
        self.enter(target, gate.verdict);
        Ok(target)
    }

    /// The Coder never starts without a readable plan
    fn require_plan_on_disk(&self) -> Result<()> {
        let registered = self.plan_path()?;
        let path = match self.root {
            Some(ref root) if registered.is_relative() => root.join(registered),
            _ => registered.to_path_buf(),
        };
        if !path.is_file() {
            tracing::warn!(
                work_item = self.work_item.id,
                plan = %path.display(),
                "Registered plan not found"
            );
            return Err(Error::PlanMissing(self.work_item.id));
        }
        Ok(())
    }

    fn check_gate_stage(&self, gate: &GateResult) -> Result<Stage> {
        let current = self.work_item.stage;
        if gate.stage != current {
            return Err(Error::StageMismatch {
                current,
                gate: gate.stage,
            });
        }
        Ok(current)
    }

    fn enter(&mut self, stage: Stage, verdict: GateStatus) {
        tracing::info!(
            work_item = self.work_item.id,
            from = %self.work_item.stage,
            to = %stage,
            verdict = %verdict,
            "Stage transition"
        );
        self.work_item.stage = stage;
        self.history.push(StageEntry {
            stage,
            entered_at: Utc::now(),
            verdict: Some(verdict),
        });
    }

    /// Load tracker state from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save tracker state as JSON, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{GateEvaluator, GateSignals};
    use tempfile::TempDir;

    fn tracker_at(stage: Stage) -> StageTracker {
        StageTracker::new(WorkItem::new(12345, "Add IBAN validation").with_stage(stage))
    }

    /// Tracker rooted in a temp dir holding `.planning/PLAN.md`
    fn tracker_with_plan(stage: Stage) -> (TempDir, StageTracker) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".planning")).unwrap();
        std::fs::write(dir.path().join(".planning/PLAN.md"), "# Plan: Add IBAN validation\n")
            .unwrap();
        let mut tracker = tracker_at(stage).with_root(dir.path());
        tracker.register_plan(".planning/PLAN.md");
        (dir, tracker)
    }

    fn coder_signals(build: i32) -> GateSignals {
        GateSignals::default()
            .with_work_item(12345)
            .with_build(build)
            .with_tests(10, 0, 0)
            .with_checklist(vec![true, true, true])
            .with_documentation(true)
    }

    #[test]
    fn test_new_records_initial_entry() {
        let tracker = tracker_at(Stage::Orchestrator);
        assert_eq!(tracker.history().len(), 1);
        assert_eq!(tracker.history()[0].stage, Stage::Orchestrator);
        assert_eq!(tracker.history()[0].verdict, None);
    }

    #[test]
    fn test_coder_to_reviewer_on_pass() {
        let mut tracker = tracker_at(Stage::Coder);
        tracker.register_plan(".planning/PLAN.md");

        let gate = GateEvaluator::default().evaluate(Stage::Coder, &coder_signals(0));
        assert_eq!(gate.verdict, GateStatus::Pass);

        let next = tracker.advance(&gate).unwrap();
        assert_eq!(next, Stage::Reviewer);
        assert_eq!(tracker.current_stage(), Stage::Reviewer);
        assert_eq!(tracker.history().len(), 2);
        assert_eq!(tracker.history()[1].verdict, Some(GateStatus::Pass));
    }

    #[test]
    fn test_build_failure_blocks_and_stays() {
        let mut tracker = tracker_at(Stage::Coder);
        tracker.register_plan(".planning/PLAN.md");

        let gate = GateEvaluator::default().evaluate(Stage::Coder, &coder_signals(1));
        assert_eq!(gate.verdict, GateStatus::Fail);

        let err = tracker.advance(&gate).unwrap_err();
        match err {
            Error::BlockedTransition {
                stage,
                failed,
                return_to,
            } => {
                assert_eq!(stage, Stage::Coder);
                assert_eq!(failed, vec!["build".to_string()]);
                assert_eq!(return_to, Stage::Coder);
            }
            other => panic!("expected BlockedTransition, got {:?}", other),
        }
        assert_eq!(tracker.current_stage(), Stage::Coder);
        assert_eq!(tracker.history().len(), 1);
    }

    #[test]
    fn test_warn_moves_forward() {
        let mut tracker = tracker_at(Stage::Coder);
        tracker.register_plan(".planning/PLAN.md");

        let signals = GateSignals {
            documentation_complete: None,
            ..coder_signals(0)
        };
        let gate = GateEvaluator::default().evaluate(Stage::Coder, &signals);
        assert_eq!(gate.verdict, GateStatus::Warn);
        assert_eq!(tracker.advance(&gate).unwrap(), Stage::Reviewer);
    }

    #[test]
    fn test_coder_requires_plan() {
        let dir = TempDir::new().unwrap();
        let mut tracker = tracker_at(Stage::Planner).with_root(dir.path());
        let signals = GateSignals::default().with_checklist(vec![false, false]);
        let gate = GateEvaluator::default().evaluate(Stage::Planner, &signals);

        let err = tracker.advance(&gate).unwrap_err();
        assert!(matches!(err, Error::PlanMissing(12345)));
        assert_eq!(tracker.current_stage(), Stage::Planner);
        assert!(tracker.plan_path().is_err());

        // Registered but never written
        tracker.register_plan(".planning/PLAN.md");
        let err = tracker.advance(&gate).unwrap_err();
        assert!(matches!(err, Error::PlanMissing(12345)));
        assert_eq!(tracker.current_stage(), Stage::Planner);

        std::fs::create_dir_all(dir.path().join(".planning")).unwrap();
        std::fs::write(dir.path().join(".planning/PLAN.md"), "# Plan: x\n").unwrap();
        assert_eq!(tracker.advance(&gate).unwrap(), Stage::Coder);
        assert_eq!(tracker.plan_path().unwrap(), Path::new(".planning/PLAN.md"));
    }

    #[test]
    fn test_send_back_to_coder_requires_plan_on_disk() {
        let dir = TempDir::new().unwrap();
        let mut tracker = tracker_at(Stage::Reviewer).with_root(dir.path());
        tracker.register_plan(".planning/PLAN.md");
        let signals = GateSignals::default().with_build(1).with_tests(8, 0, 0);
        let gate = GateEvaluator::default().evaluate(Stage::Reviewer, &signals);

        let err = tracker.send_back(&gate).unwrap_err();
        assert!(matches!(err, Error::PlanMissing(12345)));
        assert_eq!(tracker.current_stage(), Stage::Reviewer);
        assert_eq!(tracker.history().len(), 1);
    }

    #[test]
    fn test_stage_mismatch() {
        let mut tracker = tracker_at(Stage::Reviewer);
        let gate = GateEvaluator::default().evaluate(Stage::Coder, &coder_signals(0));
        let err = tracker.advance(&gate).unwrap_err();
        assert!(matches!(
            err,
            Error::StageMismatch {
                current: Stage::Reviewer,
                gate: Stage::Coder
            }
        ));
    }

    #[test]
    fn test_complete_cannot_advance() {
        let mut tracker = tracker_at(Stage::Complete);
        let gate = GateEvaluator::default().evaluate(Stage::Complete, &GateSignals::default());
        assert!(matches!(
            tracker.advance(&gate),
            Err(Error::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_send_back_from_reviewer() {
        let (_dir, mut tracker) = tracker_with_plan(Stage::Reviewer);
        let signals = GateSignals::default().with_build(0).with_tests(8, 2, 0);
        let gate = GateEvaluator::default().evaluate(Stage::Reviewer, &signals);

        assert!(tracker.advance(&gate).is_err());
        assert_eq!(tracker.send_back(&gate).unwrap(), Stage::Coder);
        assert_eq!(tracker.current_stage(), Stage::Coder);
        assert_eq!(tracker.history().last().unwrap().verdict, Some(GateStatus::Fail));
    }

    #[test]
    fn test_send_back_requires_failure() {
        let mut tracker = tracker_at(Stage::Coder);
        let gate = GateEvaluator::default().evaluate(Stage::Coder, &coder_signals(0));
        assert!(matches!(
            tracker.send_back(&gate),
            Err(Error::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_full_pipeline_walk() {
        let evaluator = GateEvaluator::default();
        let (_dir, mut tracker) = tracker_with_plan(Stage::Orchestrator);

        let signals = coder_signals(0)
            .with_coverage(90.0)
            .with_commit_message("AB#12345 Add IBAN validation");

        while !tracker.current_stage().is_terminal() {
            let gate = evaluator.evaluate(tracker.current_stage(), &signals);
            tracker.advance(&gate).unwrap();
        }

        let visited: Vec<Stage> = tracker.history().iter().map(|e| e.stage).collect();
        assert_eq!(visited, crate::workflow::PIPELINE.to_vec());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".planning").join("state.json");

        let mut tracker = tracker_at(Stage::Planner);
        tracker.register_plan(dir.path().join(".planning").join("PLAN.md"));
        tracker.save(&path).unwrap();

        let loaded = StageTracker::load(&path).unwrap();
        assert_eq!(loaded, tracker);
    }
}
