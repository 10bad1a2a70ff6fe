//! Handoff DevOps - Azure DevOps script collaborators for Handoff
//!
//! The sprint board, team pull requests and pull request diffs are read by
//! running the team's Azure DevOps skill scripts. This crate builds their
//! command lines, runs them with a timeout and decodes their JSON output.

mod env;
mod error;
mod links;
mod models;
mod query;
mod runner;

pub use env::{DevOpsEnv, ORG_VAR, PAT_VAR, PROJECT_VAR, TEAM_VAR};
pub use error::{Error, Result};
pub use links::{pull_request_url, work_item_url};
pub use models::{
    ChangedFile, Commits, DiffSummary, Iteration, PrDetails, PrDiff, Reviewer, SprintWorkItem,
    SprintWorkItems, TeamPullRequest, TeamPullRequests,
};
pub use query::{PrDiffQuery, PrStatus, ScriptQuery, SprintQuery, TeamPrQuery};
pub use runner::{Invocation, ProcessExecutor, ScriptExecutor, ScriptOutput, ScriptRunner};
