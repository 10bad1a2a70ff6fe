//! Work item branch management

use git2::build::CheckoutBuilder;
use git2::BranchType;

use super::repo::GitRepo;
use crate::workflow::WorkItem;
use crate::{Error, Result};

/// Whether a branch had to be created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchStatus {
    /// Newly created from HEAD
    Created,
    /// Already existed and was left untouched
    Existing,
}

impl GitRepo {
    /// Whether a local branch exists
    pub fn branch_exists(&self, name: &str) -> bool {
        self.inner().find_branch(name, BranchType::Local).is_ok()
    }

    /// Create a local branch at HEAD unless it already exists
    pub fn create_branch(&self, name: &str) -> Result<BranchStatus> {
        if self.branch_exists(name) {
            tracing::debug!(branch = name, "Branch already exists");
            return Ok(BranchStatus::Existing);
        }

        let head = self
            .inner()
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| Error::Git(format!("Cannot branch from HEAD: {}", e)))?;

        self.inner()
            .branch(name, &head, false)
            .map_err(|e| Error::Git(format!("Failed to create branch '{}': {}", name, e)))?;

        tracing::info!(branch = name, commit = %head.id(), "Created branch");
        Ok(BranchStatus::Created)
    }

    /// Create the `backlog/{id}-{slug}` branch for a work item
    pub fn create_work_item_branch(&self, item: &WorkItem) -> Result<BranchStatus> {
        self.create_branch(&item.branch)
    }

    /// Check out a local branch
    ///
    /// Uses a safe checkout: local modifications that would be overwritten
    /// make this fail instead of being discarded.
    pub fn checkout(&self, name: &str) -> Result<()> {
        let refname = format!("refs/heads/{}", name);
        let repo = self.inner();

        let target = repo
            .revparse_single(&refname)
            .map_err(|e| Error::Git(format!("Branch '{}' not found: {}", name, e)))?;

        repo.checkout_tree(&target, Some(CheckoutBuilder::new().safe()))
            .map_err(|e| Error::Git(format!("Failed to check out '{}': {}", name, e)))?;
        repo.set_head(&refname)
            .map_err(|e| Error::Git(format!("Failed to move HEAD to '{}': {}", name, e)))?;

        tracing::debug!(branch = name, "Checked out branch");
        Ok(())
    }
}
