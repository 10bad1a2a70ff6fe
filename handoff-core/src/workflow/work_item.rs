//! Work items and their branch naming

use serde::{Deserialize, Serialize};

use super::Stage;

/// Longest slug kept in a branch name
const MAX_SLUG_LEN: usize = 50;

/// Kind of backlog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkItemKind {
    /// Regular product backlog item
    #[default]
    ProductBacklogItem,
    /// Time-boxed investigation
    Spike,
}

impl WorkItemKind {
    /// Azure Boards work item type name
    pub fn board_name(&self) -> &'static str {
        match self {
            WorkItemKind::ProductBacklogItem => "Product Backlog Item",
            WorkItemKind::Spike => "Spike",
        }
    }
}

/// A unit of work moving through the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Backlog identifier
    pub id: u64,
    /// Title from the board
    pub title: String,
    /// Branch the work happens on
    pub branch: String,
    /// Kind of item
    #[serde(default)]
    pub kind: WorkItemKind,
    /// The one stage the item occupies
    pub stage: Stage,
}

impl WorkItem {
    /// Create a work item at the Orchestrator stage with the conventional branch name
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id,
            branch: branch_name(id, &title),
            title,
            kind: WorkItemKind::default(),
            stage: Stage::Orchestrator,
        }
    }

    /// Set the kind
    pub fn with_kind(mut self, kind: WorkItemKind) -> Self {
        self.kind = kind;
        self
    }

    /// Place the item at a specific stage
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }
}

/// Build the `backlog/{id}-{slug}` branch name for a work item
pub fn branch_name(id: u64, title: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        format!("backlog/{}", id)
    } else {
        format!("backlog/{}-{}", id, slug)
    }
}

/// Lowercase ASCII slug; other characters collapse into single dashes
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.len() <= MAX_SLUG_LEN {
        return slug;
    }

    // Cut at the last word boundary that fits
    let cut = &slug[..MAX_SLUG_LEN];
    match cut.rfind('-') {
        Some(pos) if pos > 0 => cut[..pos].to_string(),
        _ => cut.to_string(),
    }
}
