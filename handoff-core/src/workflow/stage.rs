//! Pipeline stages
//!
//! The pipeline is linear:
//! orchestrator → work-item-pickup → planner → coder → reviewer → committer → pr-creator → complete
//!
//! The Implementation Verifier and Spike agents run out of band and never
//! occupy a stage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One phase of the work-item lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Entry point, decides what to work on
    Orchestrator,
    /// Selects a sprint item and creates its branch
    WorkItemPickup,
    /// Writes `.planning/PLAN.md`
    Planner,
    /// Works through the plan checklist
    Coder,
    /// Reviews the change against conventions
    Reviewer,
    /// Commits with a conforming message
    Committer,
    /// Opens the pull request
    PrCreator,
    /// Terminal stage
    Complete,
}

/// The canonical ordering of stages. Source of truth for `next()`.
pub const PIPELINE: &[Stage] = &[
    Stage::Orchestrator,
    Stage::WorkItemPickup,
    Stage::Planner,
    Stage::Coder,
    Stage::Reviewer,
    Stage::Committer,
    Stage::PrCreator,
    Stage::Complete,
];

impl Stage {
    /// Position in [`PIPELINE`]
    pub fn index(&self) -> usize {
        PIPELINE
            .iter()
            .position(|s| s == self)
            .unwrap_or(PIPELINE.len())
    }

    /// The stage that follows this one, `None` at the end of the pipeline
    pub fn next(&self) -> Option<Stage> {
        PIPELINE.get(self.index() + 1).copied()
    }

    /// The stage whose output is judged at this stage's gate.
    ///
    /// A failed gate routes back here.
    pub fn producer(&self) -> Stage {
        match self {
            Stage::Reviewer | Stage::Committer | Stage::PrCreator => Stage::Coder,
            other => *other,
        }
    }

    /// Whether this is the terminal stage
    pub fn is_terminal(&self) -> bool {
        *self == Stage::Complete
    }

    /// Document artifact the stage produces, if any
    pub fn artifact(&self) -> Option<&'static str> {
        match self {
            Stage::Planner => Some("PLAN.md"),
            Stage::Coder => Some("VERIFICATION.md"),
            Stage::Reviewer => Some("review findings"),
            Stage::Committer => Some("commit"),
            Stage::PrCreator => Some("pull request"),
            _ => None,
        }
    }

    /// Kebab-case name used in files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Orchestrator => "orchestrator",
            Stage::WorkItemPickup => "work-item-pickup",
            Stage::Planner => "planner",
            Stage::Coder => "coder",
            Stage::Reviewer => "reviewer",
            Stage::Committer => "committer",
            Stage::PrCreator => "pr-creator",
            Stage::Complete => "complete",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        PIPELINE
            .iter()
            .find(|stage| stage.as_str() == s.trim().to_lowercase())
            .copied()
            .ok_or_else(|| crate::Error::InvalidTransition(format!("Unknown stage: {}", s)))
    }
}

/// Agents invoked outside the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuxiliaryAgent {
    /// Subagent that checks the plan against the code and writes a verification report
    ImplementationVerifier,
    /// Advisory, time-boxed investigation that writes SPIKE-FINDINGS.md
    Spike,
}

impl AuxiliaryAgent {
    /// Artifact file name under the planning directory
    pub fn artifact(&self) -> &'static str {
        match self {
            AuxiliaryAgent::ImplementationVerifier => "VERIFICATION.md",
            AuxiliaryAgent::Spike => "SPIKE-FINDINGS.md",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_order() {
        assert_eq!(PIPELINE.len(), 8);
        assert_eq!(PIPELINE[0], Stage::Orchestrator);
        assert_eq!(PIPELINE[3], Stage::Coder);
        assert_eq!(PIPELINE[7], Stage::Complete);
    }

    #[test]
    fn test_next() {
        assert_eq!(Stage::Orchestrator.next(), Some(Stage::WorkItemPickup));
        assert_eq!(Stage::Planner.next(), Some(Stage::Coder));
        assert_eq!(Stage::Coder.next(), Some(Stage::Reviewer));
        assert_eq!(Stage::PrCreator.next(), Some(Stage::Complete));
        assert_eq!(Stage::Complete.next(), None);
    }

    #[test]
    fn test_producer() {
        assert_eq!(Stage::Reviewer.producer(), Stage::Coder);
        assert_eq!(Stage::Committer.producer(), Stage::Coder);
        assert_eq!(Stage::PrCreator.producer(), Stage::Coder);
        assert_eq!(Stage::Coder.producer(), Stage::Coder);
        assert_eq!(Stage::Planner.producer(), Stage::Planner);
    }

    #[test]
    fn test_parse_and_display() {
        for stage in PIPELINE {
            let parsed: Stage = stage.to_string().parse().unwrap();
            assert_eq!(parsed, *stage);
        }
        assert_eq!("PR-Creator".parse::<Stage>().unwrap(), Stage::PrCreator);
        assert!("deploy".parse::<Stage>().is_err());
    }

    #[test]
    fn test_serde_kebab_case() {
        let json = serde_json::to_string(&Stage::WorkItemPickup).unwrap();
        assert_eq!(json, "\"work-item-pickup\"");
    }
}
