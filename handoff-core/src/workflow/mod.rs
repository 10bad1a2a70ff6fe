//! Workflow module for moving a work item between agent stages
//!
//! Each stage boundary is guarded by a quality gate. The gate verdict is fed
//! to the router, and the tracker applies the resulting transition.

pub mod gate;
pub mod router;
pub mod stage;
pub mod tracker;
pub mod work_item;

pub use gate::{
    references_work_item, verdict_for, Criterion, CriterionKind, GateEvaluator, GateResult,
    GateSignals, GateStatus, TestCounts,
};
pub use router::{route, Route};
pub use stage::{AuxiliaryAgent, Stage, PIPELINE};
pub use tracker::{Artifacts, StageEntry, StageTracker};
pub use work_item::{branch_name, slugify, WorkItem, WorkItemKind};
