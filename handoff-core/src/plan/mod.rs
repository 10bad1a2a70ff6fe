//! Plan parsing and management
//!
//! This module handles the `.planning/PLAN.md` checklist written by the
//! Planner, checked off by the Coder and read by the Implementation Verifier.

mod model;
mod parser;

pub use model::{ChecklistItem, Plan};
pub use parser::parse_plan;
