//! Script queries
//!
//! Each query knows its script and renders only the flags that script
//! documents. Organization and project are added by the runner.

use serde::de::DeserializeOwned;

use crate::env::DevOpsEnv;
use crate::models::{PrDiff, SprintWorkItems, TeamPullRequests};
use crate::{Error, Result};

/// A call to one of the Azure DevOps scripts
pub trait ScriptQuery {
    /// Decoded script output
    type Output: DeserializeOwned;

    /// Script file name inside the scripts directory
    fn script(&self) -> &'static str;

    /// Flags after `--org` and `--project`
    fn args(&self, env: &DevOpsEnv) -> Result<Vec<String>>;
}

/// Query the current sprint board (`get_sprint_work_items.py`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SprintQuery {
    states: Vec<String>,
    unassigned: bool,
    assigned_to: Option<String>,
    types: Vec<String>,
}

impl SprintQuery {
    /// All items of the default types
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a state filter (repeatable)
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.states.push(state.into());
        self
    }

    /// Only unassigned items
    ///
    /// Takes precedence over [`SprintQuery::assigned_to`].
    pub fn unassigned(mut self) -> Self {
        self.unassigned = true;
        self
    }

    /// Only items assigned to a user (email or display name)
    pub fn assigned_to(mut self, user: impl Into<String>) -> Self {
        self.assigned_to = Some(user.into());
        self
    }

    /// Add a work item type (repeatable); defaults to Product Backlog Item and Spike
    pub fn work_item_type(mut self, work_item_type: impl Into<String>) -> Self {
        self.types.push(work_item_type.into());
        self
    }
}

impl ScriptQuery for SprintQuery {
    type Output = SprintWorkItems;

    fn script(&self) -> &'static str {
        "get_sprint_work_items.py"
    }

    fn args(&self, env: &DevOpsEnv) -> Result<Vec<String>> {
        let mut args = vec!["--team".to_string(), env.team.clone()];
        for state in &self.states {
            args.push("--state".to_string());
            args.push(state.clone());
        }
        if self.unassigned {
            args.push("--unassigned".to_string());
        } else if let Some(ref user) = self.assigned_to {
            args.push("--assigned-to".to_string());
            args.push(user.clone());
        }
        for t in &self.types {
            args.push("--type".to_string());
            args.push(t.clone());
        }
        Ok(args)
    }
}

/// Pull request status filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrStatus {
    #[default]
    Active,
    Completed,
    Abandoned,
    All,
}

impl PrStatus {
    /// Flag value
    pub fn as_str(&self) -> &'static str {
        match self {
            PrStatus::Active => "active",
            PrStatus::Completed => "completed",
            PrStatus::Abandoned => "abandoned",
            PrStatus::All => "all",
        }
    }
}

impl std::str::FromStr for PrStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(PrStatus::Active),
            "completed" => Ok(PrStatus::Completed),
            "abandoned" => Ok(PrStatus::Abandoned),
            "all" => Ok(PrStatus::All),
            other => Err(Error::InvalidQuery(format!(
                "Unknown PR status '{}'; expected active, completed, abandoned or all",
                other
            ))),
        }
    }
}

/// Pull requests awaiting the team's review (`get_team_prs.py`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamPrQuery {
    status: PrStatus,
    include_own: bool,
    team_id: Option<String>,
    user_id: Option<String>,
}

impl TeamPrQuery {
    /// Active PRs, excluding the caller's own
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by status
    pub fn status(mut self, status: PrStatus) -> Self {
        self.status = status;
        self
    }

    /// Include PRs authored by the user
    pub fn include_own(mut self) -> Self {
        self.include_own = true;
        self
    }

    /// Team GUID used as reviewer
    pub fn team_id(mut self, id: impl Into<String>) -> Self {
        self.team_id = Some(id.into());
        self
    }

    /// User GUID, for excluding own PRs
    pub fn user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }
}

impl ScriptQuery for TeamPrQuery {
    type Output = TeamPullRequests;

    fn script(&self) -> &'static str {
        "get_team_prs.py"
    }

    /// The script filters by `--reviewer-id` and drops the caller's PRs with
    /// `--exclude-author-id`; team and user ids map onto those.
    fn args(&self, _env: &DevOpsEnv) -> Result<Vec<String>> {
        let reviewer = match self.team_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                return Err(Error::InvalidQuery(
                    "Team id is required to list the team's pull requests".to_string(),
                ))
            }
        };

        let mut args = vec![
            "--reviewer-id".to_string(),
            reviewer,
            "--status".to_string(),
            self.status.as_str().to_string(),
        ];
        if !self.include_own {
            if let Some(ref id) = self.user_id {
                args.push("--exclude-author-id".to_string());
                args.push(id.clone());
            }
        }
        Ok(args)
    }
}

/// Changed files of one pull request (`get_pr_diff.py`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrDiffQuery {
    repository: String,
    pr_id: u64,
    file: Option<String>,
    include_content: bool,
}

impl PrDiffQuery {
    /// Diff of `pr_id` in `repository`
    pub fn new(repository: impl Into<String>, pr_id: u64) -> Self {
        Self {
            repository: repository.into(),
            pr_id,
            file: None,
            include_content: false,
        }
    }

    /// Restrict to one file path, with its content
    pub fn file(mut self, path: impl Into<String>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Include full file content for every file
    pub fn include_content(mut self) -> Self {
        self.include_content = true;
        self
    }
}

impl ScriptQuery for PrDiffQuery {
    type Output = PrDiff;

    fn script(&self) -> &'static str {
        "get_pr_diff.py"
    }

    fn args(&self, _env: &DevOpsEnv) -> Result<Vec<String>> {
        if self.repository.trim().is_empty() {
            return Err(Error::InvalidQuery("Repository name is required".to_string()));
        }
        let mut args = vec![
            "--repo".to_string(),
            self.repository.clone(),
            "--pr-id".to_string(),
            self.pr_id.to_string(),
        ];
        if let Some(ref file) = self.file {
            args.push("--file".to_string());
            args.push(file.clone());
        }
        if self.include_content {
            args.push("--include-content".to_string());
        }
        Ok(args)
    }
}
