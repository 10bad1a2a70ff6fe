//! Handoff routing between stages
//!
//! A fixed table: PASS and WARN hand the work item forward to the next
//! stage, FAIL hands it back to the stage that produced the work.

use serde::{Deserialize, Serialize};

use super::gate::GateStatus;
use super::Stage;

/// Where a work item goes after a gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    /// Hand off to the next stage
    Forward(Stage),
    /// Hand back to the producing stage for rework
    Return(Stage),
    /// Pipeline is complete
    Finished,
}

impl Route {
    /// Target stage, if any
    pub fn target(&self) -> Option<Stage> {
        match self {
            Route::Forward(stage) | Route::Return(stage) => Some(*stage),
            Route::Finished => None,
        }
    }

    /// Whether this route moves the work item forward
    pub fn is_forward(&self) -> bool {
        matches!(self, Route::Forward(_))
    }
}

/// Decide the next stage from the current stage and the gate verdict
pub fn route(current: Stage, verdict: GateStatus) -> Route {
    match verdict {
        GateStatus::Fail => Route::Return(current.producer()),
        GateStatus::Pass | GateStatus::Warn => match current.next() {
            Some(next) => Route::Forward(next),
            None => Route::Finished,
        },
    }
}
