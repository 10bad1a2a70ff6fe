//! Git operations for Handoff
//!
//! Repository detection and the per-work-item `backlog/` branches.

mod branch;
mod repo;

pub use branch::BranchStatus;
pub use repo::GitRepo;
