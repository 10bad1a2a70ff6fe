//! Implementation verification
//!
//! The Implementation Verifier is invoked by the Coder before it hands off.
//! It checks each plan item for code and tests, records the build and test
//! outcome, and writes a recommendation to `.planning/VERIFICATION.md`.

use std::fmt::{self, Write as _};
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::plan::{ChecklistItem, Plan};
use crate::workflow::TestCounts;
use crate::Result;

/// Overall verdict of a verification run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Recommendation {
    /// Every item has code and tests, build and tests are green
    Ready,
    /// Code is in place but some items lack tests
    MinorGaps,
    /// Build or tests fail, or items have no code
    Incomplete,
}

impl Recommendation {
    /// Whether the Coder may hand off to the Reviewer
    pub fn is_ready(&self) -> bool {
        matches!(self, Recommendation::Ready)
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Ready => write!(f, "Ready"),
            Recommendation::MinorGaps => write!(f, "Minor gaps"),
            Recommendation::Incomplete => write!(f, "Incomplete"),
        }
    }
}

/// What was found for one plan item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemEvidence {
    /// Implementation exists
    pub code_present: bool,
    /// Tests exist
    pub tests_present: bool,
}

impl ItemEvidence {
    /// Evidence as recorded in the plan itself: a checked item counts as
    /// implemented, and as tested when it names at least one test scenario.
    pub fn from_item(item: &ChecklistItem) -> Self {
        Self {
            code_present: item.completed,
            tests_present: item.completed && !item.test_scenarios.is_empty(),
        }
    }
}

/// Per-item line of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemVerification {
    /// 1-based position in the plan
    pub index: usize,
    pub description: String,
    pub code_present: bool,
    pub tests_present: bool,
}

impl ItemVerification {
    /// Code and tests are both present
    pub fn is_covered(&self) -> bool {
        self.code_present && self.tests_present
    }
}

/// Verification report for one work item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub work_item_id: u64,
    pub build_exit_code: i32,
    pub tests: TestCounts,
    pub items: Vec<ItemVerification>,
    pub recommendation: Recommendation,
    pub generated_at: DateTime<Utc>,
}

impl VerificationReport {
    /// Verify a plan against build/test outcomes and per-item evidence.
    ///
    /// Items without an entry in `evidence` fall back to
    /// [`ItemEvidence::from_item`]. A run where no test passed is never
    /// better than Incomplete, matching the gate's `tests` criterion.
    pub fn verify(
        plan: &Plan,
        build_exit_code: i32,
        tests: TestCounts,
        evidence: &[ItemEvidence],
    ) -> Self {
        let items = verify_items(plan, evidence);

        let recommendation = if build_exit_code != 0
            || tests.failed > 0
            || tests.passed == 0
            || items.iter().any(|i| !i.code_present)
        {
            Recommendation::Incomplete
        } else if items.iter().any(|i| !i.tests_present) {
            Recommendation::MinorGaps
        } else {
            Recommendation::Ready
        };

        tracing::debug!(
            work_item = plan.work_item_id,
            items = items.len(),
            recommendation = %recommendation,
            "Verification complete"
        );

        Self {
            work_item_id: plan.work_item_id,
            build_exit_code,
            tests,
            items,
            recommendation,
            generated_at: Utc::now(),
        }
    }

    /// Per-item coverage, in plan order, for `GateSignals::checklist`
    pub fn coverage(&self) -> Vec<bool> {
        self.items.iter().map(ItemVerification::is_covered).collect()
    }

    /// Number of items with both code and tests
    pub fn covered_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_covered()).count()
    }

    /// Render as Markdown
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Verification Report: Work Item #{}", self.work_item_id);
        out.push('\n');
        let _ = writeln!(
            out,
            "**Generated:** {}",
            self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        out.push('\n');

        out.push_str("## Build and Tests\n\n");
        out.push_str("| Check | Result |\n|-------|--------|\n");
        let _ = writeln!(
            out,
            "| Build | {} exit code {} |",
            mark(self.build_exit_code == 0),
            self.build_exit_code
        );
        let _ = writeln!(
            out,
            "| Tests | {} {} |",
            mark(self.tests.failed == 0 && self.tests.passed > 0),
            self.tests
        );
        out.push('\n');

        out.push_str("## Plan Items\n\n");
        out.push_str("| # | Item | Code | Tests |\n|---|------|------|-------|\n");
        for item in &self.items {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} |",
                item.index,
                item.description.replace('|', "\\|"),
                mark(item.code_present),
                mark(item.tests_present)
            );
        }
        out.push('\n');

        let _ = writeln!(out, "## Recommendation: {}", self.recommendation);
        out
    }

    /// Write the Markdown report, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_markdown())?;
        Ok(())
    }
}

/// Check each plan item against `evidence`, falling back to the plan itself
pub fn verify_items(plan: &Plan, evidence: &[ItemEvidence]) -> Vec<ItemVerification> {
    plan.items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let ev = evidence
                .get(i)
                .copied()
                .unwrap_or_else(|| ItemEvidence::from_item(item));
            ItemVerification {
                index: i + 1,
                description: item.description.clone(),
                code_present: ev.code_present,
                tests_present: ev.tests_present,
            }
        })
        .collect()
}

/// Checklist coverage for gate signals, from the same per-item check the
/// verifier uses
pub fn checklist_coverage(plan: &Plan) -> Vec<bool> {
    verify_items(plan, &[])
        .iter()
        .map(ItemVerification::is_covered)
        .collect()
}

fn mark(ok: bool) -> &'static str {
    if ok {
        "✅"
    } else {
        "❌"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn plan() -> Plan {
        let mut plan = Plan::new(12345, "Add IBAN validation")
            .with_item(ChecklistItem::new("Add IbanValidator").with_test("RejectsBadChecksum"))
            .with_item(ChecklistItem::new("Wire into TransferService").with_test("CallsValidator"))
            .with_item(ChecklistItem::new("Surface errors in API"));
        plan.complete(0).unwrap();
        plan.complete(1).unwrap();
        plan.complete(2).unwrap();
        plan
    }

    fn all_present(n: usize) -> Vec<ItemEvidence> {
        vec![
            ItemEvidence {
                code_present: true,
                tests_present: true
            };
            n
        ]
    }

    #[test]
    fn test_ready_when_everything_present() {
        let report =
            VerificationReport::verify(&plan(), 0, TestCounts::new(10, 0, 0), &all_present(3));
        assert_eq!(report.recommendation, Recommendation::Ready);
        assert_eq!(report.coverage(), vec![true, true, true]);
    }

    #[test]
    fn test_evidence_derived_from_plan() {
        // Item 3 is checked but names no test scenario
        let report = VerificationReport::verify(&plan(), 0, TestCounts::new(10, 0, 0), &[]);
        assert_eq!(report.recommendation, Recommendation::MinorGaps);
        assert_eq!(report.coverage(), vec![true, true, false]);
    }

    #[test]
    fn test_build_failure_is_incomplete() {
        let report =
            VerificationReport::verify(&plan(), 1, TestCounts::new(10, 0, 0), &all_present(3));
        assert_eq!(report.recommendation, Recommendation::Incomplete);
    }

    #[test]
    fn test_failing_tests_are_incomplete() {
        let report =
            VerificationReport::verify(&plan(), 0, TestCounts::new(9, 1, 0), &all_present(3));
        assert_eq!(report.recommendation, Recommendation::Incomplete);
    }

    #[test]
    fn test_missing_code_is_incomplete() {
        let mut plan = plan();
        plan.reopen(1).unwrap();
        let report = VerificationReport::verify(&plan, 0, TestCounts::new(10, 0, 0), &[]);
        assert_eq!(report.recommendation, Recommendation::Incomplete);
        assert!(!report.items[1].code_present);
    }

    #[test]
    fn test_no_passing_tests_is_incomplete() {
        let report =
            VerificationReport::verify(&plan(), 0, TestCounts::new(0, 0, 4), &all_present(3));
        assert_eq!(report.recommendation, Recommendation::Incomplete);
    }

    #[test]
    fn test_checklist_coverage_matches_report() {
        let plan = plan();
        let report = VerificationReport::verify(&plan, 0, TestCounts::new(10, 0, 0), &[]);
        assert_eq!(checklist_coverage(&plan), report.coverage());
        assert_eq!(report.covered_count(), 2);
    }

    #[test]
    fn test_markdown_tables() {
        let report = VerificationReport::verify(&plan(), 0, TestCounts::new(10, 0, 0), &[]);
        let md = report.to_markdown();
        assert!(md.starts_with("# Verification Report: Work Item #12345"));
        assert!(md.contains("| Build | ✅ exit code 0 |"));
        assert!(md.contains("| 3 | Surface errors in API | ✅ | ❌ |"));
        assert!(md.contains("## Recommendation: Minor gaps"));
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".planning").join("VERIFICATION.md");
        let report = VerificationReport::verify(&plan(), 0, TestCounts::new(1, 0, 0), &[]);
        report.save(&path).unwrap();
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains("Recommendation"));
    }
}
