//! Handoff Core - quality gates and handoffs for an agent development workflow
//!
//! A work item moves through a fixed sequence of agent stages. Each stage
//! boundary is guarded by a gate whose verdict decides whether the item is
//! handed forward or back, and each stage leaves a document artifact behind
//! in the planning directory.

pub mod config;
pub mod error;
pub mod git;
pub mod plan;
pub mod runner;
pub mod spike;
pub mod verify;
pub mod workflow;

pub use config::Config;
pub use error::{Error, Result};
pub use plan::{ChecklistItem, Plan};
pub use runner::{BuildOutcome, CollaboratorRunner, TestOutcome, ToolCommand};
pub use spike::SpikeFindings;
pub use verify::{ItemEvidence, Recommendation, VerificationReport};
pub use workflow::{
    GateEvaluator, GateResult, GateSignals, GateStatus, Stage, StageTracker, WorkItem,
    WorkItemKind,
};
