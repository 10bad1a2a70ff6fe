//! Plan and checklist types

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::parser::parse_plan;
use crate::{Error, Result};

/// A single planned unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// What gets built
    pub description: String,
    /// Test scenarios that prove it
    pub test_scenarios: Vec<String>,
    /// Conditions for calling it done
    pub done_criteria: Vec<String>,
    /// Whether the Coder has finished it
    pub completed: bool,
}

impl ChecklistItem {
    /// Create an open checklist item
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            test_scenarios: Vec::new(),
            done_criteria: Vec::new(),
            completed: false,
        }
    }

    /// Add a test scenario reference
    pub fn with_test(mut self, scenario: impl Into<String>) -> Self {
        self.test_scenarios.push(scenario.into());
        self
    }

    /// Add a done criterion
    pub fn with_done(mut self, criterion: impl Into<String>) -> Self {
        self.done_criteria.push(criterion.into());
        self
    }
}

/// The plan for one work item, persisted as `.planning/PLAN.md`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Work item the plan belongs to
    pub work_item_id: u64,
    /// Plan title
    pub title: String,
    /// Branch the work happens on
    pub branch: Option<String>,
    /// When the Planner wrote it
    pub created_at: Option<DateTime<Utc>>,
    /// Ordered checklist
    pub items: Vec<ChecklistItem>,
}

impl Plan {
    /// Create an empty plan stamped with the current time
    pub fn new(work_item_id: u64, title: impl Into<String>) -> Self {
        Self {
            work_item_id,
            title: title.into(),
            branch: None,
            created_at: Some(Utc::now()),
            items: Vec::new(),
        }
    }

    /// Set the branch
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Append a checklist item
    pub fn with_item(mut self, item: ChecklistItem) -> Self {
        self.items.push(item);
        self
    }

    /// Mark item `index` (0-based) as completed
    pub fn complete(&mut self, index: usize) -> Result<()> {
        self.set_completed(index, true)
    }

    /// Mark item `index` (0-based) as open again
    pub fn reopen(&mut self, index: usize) -> Result<()> {
        self.set_completed(index, false)
    }

    fn set_completed(&mut self, index: usize, completed: bool) -> Result<()> {
        let len = self.items.len();
        let item = self.items.get_mut(index).ok_or_else(|| {
            Error::Plan(format!(
                "Checklist item {} does not exist (plan has {} items)",
                index + 1,
                len
            ))
        })?;
        item.completed = completed;
        Ok(())
    }

    /// (completed, total)
    pub fn progress(&self) -> (usize, usize) {
        let done = self.items.iter().filter(|i| i.completed).count();
        (done, self.items.len())
    }

    /// True when the checklist is non-empty and every item is done
    pub fn is_complete(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|i| i.completed)
    }

    /// Completion flag per item, in order
    pub fn completion_flags(&self) -> Vec<bool> {
        self.items.iter().map(|i| i.completed).collect()
    }

    /// Render as PLAN.md
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Plan: {}", self.title);
        out.push('\n');
        let _ = writeln!(out, "**Work Item:** #{}", self.work_item_id);
        if let Some(ref branch) = self.branch {
            let _ = writeln!(out, "**Branch:** {}", branch);
        }
        if let Some(created) = self.created_at {
            let _ = writeln!(
                out,
                "**Created:** {}",
                created.to_rfc3339_opts(SecondsFormat::Secs, true)
            );
        }
        out.push('\n');
        out.push_str("## Checklist\n\n");

        for (i, item) in self.items.iter().enumerate() {
            let mark = if item.completed { 'x' } else { ' ' };
            let _ = writeln!(out, "- [{}] {}. {}", mark, i + 1, item.description);
            for scenario in &item.test_scenarios {
                let _ = writeln!(out, "  - Test: {}", scenario);
            }
            for criterion in &item.done_criteria {
                let _ = writeln!(out, "  - Done: {}", criterion);
            }
        }

        out
    }

    /// Read and parse a PLAN.md file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        parse_plan(&content)
    }

    /// Write the plan, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.render())?;
        tracing::debug!(path = %path.display(), items = self.items.len(), "Plan saved");
        Ok(())
    }
}
