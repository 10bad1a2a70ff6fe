//! Error types for Handoff

use thiserror::Error;

use crate::workflow::Stage;

/// Result type alias for Handoff operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Handoff operations
#[derive(Error, Debug)]
pub enum Error {
    /// A hard-block gate criterion failed; the work item stays where it is
    #[error(
        "Transition out of {stage} blocked by failing hard criteria: {}; route back to {return_to}",
        failed.join(", ")
    )]
    BlockedTransition {
        /// Stage the work item is held at
        stage: Stage,
        /// Names of the failing hard criteria
        failed: Vec<String>,
        /// Stage that has to redo the work
        return_to: Stage,
    },

    /// Coder cannot start before the Planner has produced PLAN.md
    #[error("No plan registered for work item #{0}; the Planner stage must produce PLAN.md first")]
    PlanMissing(u64),

    /// A gate was evaluated for a different stage than the one the item occupies
    #[error("Gate was evaluated for {gate} but work item is at {current}")]
    StageMismatch {
        /// Stage the work item occupies
        current: Stage,
        /// Stage the gate result belongs to
        gate: Stage,
    },

    /// Transition not allowed by the pipeline
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// PLAN.md could not be parsed
    #[error("Plan error: {0}")]
    Plan(String),

    /// External collaborator exceeded its time limit
    #[error("Timed out after {seconds}s: {what}")]
    Timeout {
        /// Description of the call that timed out
        what: String,
        /// Configured limit
        seconds: u64,
    },

    /// External collaborator could not be run
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// Git error
    #[error("Git error: {0}")]
    Git(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error is a hard-block on the pipeline
    pub fn is_blocked(&self) -> bool {
        matches!(self, Error::BlockedTransition { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_transition_message() {
        let err = Error::BlockedTransition {
            stage: Stage::Reviewer,
            failed: vec!["build".to_string(), "tests".to_string()],
            return_to: Stage::Coder,
        };
        let msg = err.to_string();
        assert!(msg.contains("reviewer"));
        assert!(msg.contains("build, tests"));
        assert!(msg.contains("route back to coder"));
        assert!(err.is_blocked());
    }

    #[test]
    fn test_plan_missing_message() {
        let err = Error::PlanMissing(12345);
        assert!(err.to_string().contains("#12345"));
        assert!(!err.is_blocked());
    }
}
