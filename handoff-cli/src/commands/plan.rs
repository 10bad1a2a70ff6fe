//! Plan management commands

use clap::{Args, Subcommand};
use handoff_core::{ChecklistItem, Plan};

use super::Workspace;

/// Plan management commands
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(subcommand)]
    pub command: PlanCommand,
}

#[derive(Subcommand, Debug)]
pub enum PlanCommand {
    /// Write PLAN.md for the current work item
    New {
        /// Plan title (defaults to the work item title)
        #[arg(long)]
        title: Option<String>,

        /// Checklist item: "description | test: scenario | done: criterion"
        #[arg(short, long = "item", required = true)]
        items: Vec<String>,

        /// Overwrite an existing plan
        #[arg(long)]
        force: bool,
    },

    /// Show the plan and its progress
    Show,

    /// Mark a checklist item done (1-based)
    Check {
        /// Item number
        number: usize,
    },

    /// Mark a checklist item open again (1-based)
    Uncheck {
        /// Item number
        number: usize,
    },
}

impl PlanArgs {
    /// Execute the plan command
    pub async fn execute(&self, ws: &Workspace) -> anyhow::Result<()> {
        match &self.command {
            PlanCommand::New {
                title,
                items,
                force,
            } => new_plan(ws, title.as_deref(), items, *force),
            PlanCommand::Show => show_plan(ws),
            PlanCommand::Check { number } => set_item(ws, *number, true),
            PlanCommand::Uncheck { number } => set_item(ws, *number, false),
        }
    }
}

fn new_plan(ws: &Workspace, title: Option<&str>, items: &[String], force: bool) -> anyhow::Result<()> {
    let mut tracker = ws.load_tracker()?;
    let path = ws.plan_path();
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        );
    }

    let item = tracker.work_item();
    let mut plan = Plan::new(item.id, title.unwrap_or(&item.title)).with_branch(item.branch.clone());
    for spec in items {
        plan = plan.with_item(parse_item_spec(spec)?);
    }

    plan.save(&path)?;
    tracker.register_plan(ws.relative(&path));
    ws.save_tracker(&tracker)?;

    println!("Wrote {} with {} item(s)", path.display(), plan.items.len());
    Ok(())
}

fn show_plan(ws: &Workspace) -> anyhow::Result<()> {
    let tracker = ws.load_tracker()?;
    let plan = ws.load_plan(&tracker)?;
    print!("{}", plan.render());

    let (done, total) = plan.progress();
    println!();
    println!("Progress: {}/{} items done", done, total);
    Ok(())
}

fn set_item(ws: &Workspace, number: usize, completed: bool) -> anyhow::Result<()> {
    if number == 0 {
        anyhow::bail!("Checklist items are numbered from 1");
    }
    let tracker = ws.load_tracker()?;
    let path = ws.resolve(tracker.plan_path()?);
    let mut plan = Plan::load(&path)?;

    if completed {
        plan.complete(number - 1)?;
    } else {
        plan.reopen(number - 1)?;
    }
    plan.save(&path)?;

    let (done, total) = plan.progress();
    let mark = if completed { "x" } else { " " };
    println!(
        "[{}] {}. {} ({}/{} done)",
        mark,
        number,
        plan.items[number - 1].description,
        done,
        total
    );
    Ok(())
}

/// Parse "description | test: scenario | done: criterion"
fn parse_item_spec(spec: &str) -> anyhow::Result<ChecklistItem> {
    let mut parts = spec.split('|').map(str::trim);
    let description = parts.next().unwrap_or_default();
    if description.is_empty() {
        anyhow::bail!("Checklist item needs a description: {:?}", spec);
    }

    let mut item = ChecklistItem::new(description);
    for part in parts {
        let (key, value) = part
            .split_once(':')
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim()))
            .ok_or_else(|| anyhow::anyhow!("Expected 'test: ...' or 'done: ...', got {:?}", part))?;
        match key.as_str() {
            "test" => item = item.with_test(value),
            "done" => item = item.with_done(value),
            other => anyhow::bail!("Unknown checklist field '{}' (use test or done)", other),
        }
    }
    Ok(item)
}
