//! Pull request commands - team review queue and PR diffs

use clap::Args;
use handoff_devops::{PrDiffQuery, PrStatus, TeamPrQuery};

use super::Workspace;

/// List pull requests awaiting the team's review
#[derive(Args, Debug)]
pub struct PrsArgs {
    /// active, completed, abandoned or all
    #[arg(long, default_value = "active")]
    pub status: PrStatus,

    /// Include PRs you authored (ignores --user-id)
    #[arg(long)]
    pub include_own: bool,

    /// Team GUID, queried as the reviewer
    #[arg(long, env = "AZURE_DEVOPS_TEAM_ID")]
    pub team_id: String,

    /// Your user GUID; your own PRs are left out unless --include-own
    #[arg(long, env = "AZURE_DEVOPS_USER_ID")]
    pub user_id: Option<String>,

    /// Print raw JSON
    #[arg(long)]
    pub json: bool,
}

impl PrsArgs {
    pub async fn execute(&self, ws: &Workspace) -> anyhow::Result<()> {
        let mut query = TeamPrQuery::new()
            .status(self.status)
            .team_id(self.team_id.clone());
        if self.include_own {
            query = query.include_own();
        }
        if let Some(ref id) = self.user_id {
            query = query.user_id(id.clone());
        }

        let prs = ws.devops_runner()?.run(&query).await?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&prs)?);
            return Ok(());
        }

        if prs.pull_requests.is_empty() {
            println!("No pull requests awaiting review.");
            return Ok(());
        }

        println!("{} pull request(s):", prs.count);
        println!();
        for pr in &prs.pull_requests {
            let draft = if pr.is_draft { " [draft]" } else { "" };
            println!("  !{} {}{}", pr.id, pr.title, draft);
            println!(
                "     {} -> {} in {} by {}, {} day(s) old",
                pr.source_branch, pr.target_branch, pr.repository, pr.author, pr.age_days
            );
            for r in &pr.reviewers {
                let required = if r.is_required { " (required)" } else { "" };
                println!("     - {}{}: {}", r.name, required, r.vote_label());
            }
            println!("     {}", pr.web_url);
        }
        Ok(())
    }
}

/// Show the files changed by a pull request
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Pull request id
    pub pr_id: u64,

    /// Repository name
    #[arg(long)]
    pub repo: String,

    /// Only this file, with content
    #[arg(long)]
    pub file: Option<String>,

    /// Include full file content
    #[arg(long)]
    pub include_content: bool,

    /// Print raw JSON
    #[arg(long)]
    pub json: bool,
}

impl DiffArgs {
    pub async fn execute(&self, ws: &Workspace) -> anyhow::Result<()> {
        let mut query = PrDiffQuery::new(self.repo.clone(), self.pr_id);
        if let Some(ref file) = self.file {
            query = query.file(file.clone());
        }
        if self.include_content {
            query = query.include_content();
        }

        let diff = ws.devops_runner()?.run(&query).await?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&diff)?);
            return Ok(());
        }

        let pr = &diff.pull_request;
        println!("!{} {}", pr.id, pr.title);
        println!("  {} -> {}", pr.source_branch, pr.target_branch);
        println!(
            "  {} file(s), +{} -{}",
            diff.summary.total_files, diff.summary.additions, diff.summary.deletions
        );
        println!();
        for file in &diff.changed_files {
            println!("  {:<10} {}", file.change_type, file.path);
            if let Some(ref content) = file.content {
                println!("{}", content);
            }
        }
        Ok(())
    }
}
