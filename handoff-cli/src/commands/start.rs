//! Start command - begin tracking a work item

use clap::{Args, ValueEnum};
use handoff_core::git::{BranchStatus, GitRepo};
use handoff_core::workflow::GateSignals;
use handoff_core::{GateEvaluator, StageTracker, WorkItem, WorkItemKind};
use handoff_devops::{work_item_url, DevOpsEnv};

use super::Workspace;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindArg {
    /// Product Backlog Item
    Pbi,
    /// Time-boxed investigation
    Spike,
}

impl From<KindArg> for WorkItemKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Pbi => WorkItemKind::ProductBacklogItem,
            KindArg::Spike => WorkItemKind::Spike,
        }
    }
}

/// Begin tracking a work item
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Work item id
    pub id: u64,

    /// Work item title
    pub title: String,

    /// Kind of work item
    #[arg(long, value_enum, default_value = "pbi")]
    pub kind: KindArg,

    /// Branch name (defaults to backlog/<id>-<slug>)
    #[arg(long)]
    pub branch: Option<String>,

    /// Create and check out the branch
    #[arg(long)]
    pub create_branch: bool,

    /// Replace an existing state file
    #[arg(long)]
    pub force: bool,
}

impl StartArgs {
    pub async fn execute(&self, ws: &Workspace) -> anyhow::Result<()> {
        if ws.has_tracker() && !self.force {
            anyhow::bail!(
                "A work item is already in progress ({}). Use --force to replace it.",
                ws.state_path().display()
            );
        }

        let mut item = WorkItem::new(self.id, self.title.clone()).with_kind(self.kind.into());
        if let Some(ref branch) = self.branch {
            item.branch = branch.clone();
        }

        if self.create_branch {
            let repo = GitRepo::open(&ws.workdir)?;
            match repo.create_work_item_branch(&item)? {
                BranchStatus::Created => println!("Created branch {}", item.branch),
                BranchStatus::Existing => println!("Using existing branch {}", item.branch),
            }
            repo.checkout(&item.branch)?;
        }

        // The Orchestrator has no exit criteria; hand straight to pickup
        let mut tracker = StageTracker::new(item).with_root(&ws.workdir);
        let gate = GateEvaluator::new(ws.config.gates.clone())
            .evaluate(tracker.current_stage(), &GateSignals::default());
        tracker.advance(&gate)?;
        ws.save_tracker(&tracker)?;

        let item = tracker.work_item();
        println!(
            "Started #{} {} ({})",
            item.id,
            item.title,
            item.kind.board_name()
        );
        println!("  Branch: {}", item.branch);
        println!("  Stage:  {}", tracker.current_stage());
        // Board link is best effort; start works without DevOps credentials
        if let Ok(env) = DevOpsEnv::from_env() {
            if let Ok(url) = work_item_url(&env.org, &env.project, item.id) {
                println!("  Board:  {}", url);
            }
        }
        Ok(())
    }
}
