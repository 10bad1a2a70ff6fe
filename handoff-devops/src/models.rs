//! Typed script output
//!
//! Field names follow the camelCase JSON the scripts print.

use serde::{Deserialize, Serialize};

/// Sprint iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Iteration {
    pub name: String,
    pub path: String,
}

/// Work item on the sprint board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintWorkItem {
    pub id: u64,
    /// "Product Backlog Item", "Spike", ...
    #[serde(rename = "type")]
    pub work_item_type: String,
    pub title: String,
    pub state: String,
    /// Display name, or "Unassigned"
    pub assigned_to: String,
    pub effort: Option<f64>,
    pub priority: Option<f64>,
    pub days_since_change: Option<i64>,
    pub web_url: String,
}

impl SprintWorkItem {
    /// Nobody has picked the item up
    pub fn is_unassigned(&self) -> bool {
        self.assigned_to == "Unassigned"
    }

    /// Whether the item is a spike
    pub fn is_spike(&self) -> bool {
        self.work_item_type.eq_ignore_ascii_case("spike")
    }
}

/// Output of `get_sprint_work_items.py`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintWorkItems {
    pub iteration: Iteration,
    pub team: String,
    pub area_path: String,
    pub count: usize,
    pub work_items: Vec<SprintWorkItem>,
}

/// Reviewer on a pull request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reviewer {
    pub name: String,
    /// 10 approved, 5 approved with suggestions, 0 no vote,
    /// -5 waiting for author, -10 rejected
    #[serde(default)]
    pub vote: i32,
    #[serde(default)]
    pub is_required: bool,
}

impl Reviewer {
    /// Human readable vote
    pub fn vote_label(&self) -> &'static str {
        match self.vote {
            10 => "approved",
            5 => "approved with suggestions",
            -5 => "waiting for author",
            -10 => "rejected",
            _ => "no vote",
        }
    }
}

/// Pull request awaiting review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPullRequest {
    pub id: u64,
    pub repository: String,
    pub title: String,
    pub author: String,
    pub author_id: Option<String>,
    pub status: String,
    pub source_branch: String,
    pub target_branch: String,
    /// ISO 8601 creation timestamp
    pub created_date: String,
    pub age_days: i64,
    #[serde(default)]
    pub is_draft: bool,
    #[serde(default)]
    pub reviewers: Vec<Reviewer>,
    pub web_url: String,
}

/// Output of `get_team_prs.py`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPullRequests {
    pub count: usize,
    pub pull_requests: Vec<TeamPullRequest>,
}

/// Pull request header in a diff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrDetails {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub author: Option<String>,
    pub source_branch: String,
    pub target_branch: String,
    pub status: Option<String>,
    #[serde(default)]
    pub is_draft: bool,
}

/// Merge commits the diff was computed between
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commits {
    pub source: Option<String>,
    pub target: Option<String>,
}

/// Diff totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub total_files: usize,
    pub additions: u64,
    pub deletions: u64,
}

/// A changed file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedFile {
    pub path: String,
    /// "Added", "Modified", "Deleted", "Renamed", ...
    pub change_type: String,
    pub original_path: Option<String>,
    /// File content at the source commit, when requested
    pub content: Option<String>,
    /// File content at the target commit, for edits and deletes
    pub original_content: Option<String>,
}

/// Output of `get_pr_diff.py`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrDiff {
    pub pull_request: PrDetails,
    pub commits: Commits,
    pub summary: DiffSummary,
    pub changed_files: Vec<ChangedFile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprint_work_items() {
        let json = r#"{
  "iteration": {"name": "Sprint 42", "path": "Payments\\Sprint 42"},
  "team": "Payments Team",
  "areaPath": "Payments\\Payments Team",
  "count": 2,
  "workItems": [
    {"id": 12345, "type": "Product Backlog Item", "title": "Add IBAN validation",
     "state": "Approved", "assignedTo": "Unassigned", "effort": 5.0, "priority": 1999.0,
     "daysSinceChange": 3, "webUrl": "https://dev.azure.com/contoso/Payments/_workitems/edit/12345"},
    {"id": 4242, "type": "Spike", "title": "SEPA batching", "state": "Committed",
     "assignedTo": "Jordan Lee", "effort": null, "priority": null,
     "daysSinceChange": null, "webUrl": "https://dev.azure.com/contoso/Payments/_workitems/edit/4242"}
  ]
}"#;
        let items: SprintWorkItems = serde_json::from_str(json).unwrap();
        assert_eq!(items.iteration.name, "Sprint 42");
        assert_eq!(items.area_path, "Payments\\Payments Team");
        assert_eq!(items.work_items.len(), 2);
        assert!(items.work_items[0].is_unassigned());
        assert!(!items.work_items[0].is_spike());
        assert!(items.work_items[1].is_spike());
        assert_eq!(items.work_items[1].effort, None);
    }

    #[test]
    fn test_team_pull_requests() {
        let json = r#"{
  "count": 1,
  "pullRequests": [
    {"id": 881, "repository": "payments-api", "title": "AB#12345 Add IBAN validation",
     "author": "Sam Park", "authorId": "0b5c", "status": "active",
     "sourceBranch": "backlog/12345-add-iban-validation", "targetBranch": "main",
     "createdDate": "2026-10-17T08:00:00Z", "ageDays": 2, "isDraft": false,
     "reviewers": [{"name": "Payments Team", "vote": 0, "isRequired": true},
                   {"name": "Ana Ruiz", "vote": 10}],
     "webUrl": "https://dev.azure.com/contoso/Payments/_git/payments-api/pullrequest/881"}
  ]
}"#;
        let prs: TeamPullRequests = serde_json::from_str(json).unwrap();
        let pr = &prs.pull_requests[0];
        assert_eq!(pr.source_branch, "backlog/12345-add-iban-validation");
        assert_eq!(pr.reviewers[0].vote_label(), "no vote");
        assert!(pr.reviewers[0].is_required);
        assert_eq!(pr.reviewers[1].vote_label(), "approved");
        assert!(!pr.reviewers[1].is_required);
    }

    #[test]
    fn test_pr_diff() {
        let json = r#"{
  "pullRequest": {"id": 881, "title": "Add IBAN validation", "description": "",
    "author": "Sam Park", "sourceBranch": "backlog/12345-add-iban-validation",
    "targetBranch": "main", "status": "active", "isDraft": false},
  "commits": {"source": "a1b2c3", "target": null},
  "summary": {"totalFiles": 1, "additions": 2, "deletions": 0},
  "changedFiles": [
    {"path": "/src/Payments.Domain/IbanValidator.cs", "changeType": "Added", "originalPath": null}
  ]
}"#;
        let diff: PrDiff = serde_json::from_str(json).unwrap();
        assert_eq!(diff.commits.target, None);
        assert_eq!(diff.summary.total_files, 1);
        assert_eq!(diff.changed_files[0].change_type, "Added");
        assert!(diff.changed_files[0].content.is_none());
    }
}
