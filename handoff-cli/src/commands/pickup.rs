//! Pickup command - list sprint work items ready to be picked up

use clap::Args;
use handoff_devops::{SprintQuery, SprintWorkItem};

use super::Workspace;

/// Query the current sprint board
#[derive(Args, Debug)]
pub struct PickupArgs {
    /// Filter by state (repeatable)
    #[arg(long)]
    pub state: Vec<String>,

    /// Only items assigned to this user instead of unassigned ones
    #[arg(long)]
    pub assigned_to: Option<String>,

    /// Work item type (repeatable); defaults to Product Backlog Item and Spike
    #[arg(long = "type")]
    pub types: Vec<String>,

    /// Print raw JSON
    #[arg(long)]
    pub json: bool,
}

impl PickupArgs {
    fn query(&self) -> SprintQuery {
        let mut query = SprintQuery::new();
        for state in &self.state {
            query = query.state(state.clone());
        }
        for t in &self.types {
            query = query.work_item_type(t.clone());
        }
        match self.assigned_to {
            Some(ref user) => query.assigned_to(user.clone()),
            None => query.unassigned(),
        }
    }

    pub async fn execute(&self, ws: &Workspace) -> anyhow::Result<()> {
        let runner = ws.devops_runner()?;
        let sprint = runner.run(&self.query()).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&sprint)?);
            return Ok(());
        }

        println!(
            "{} ({}) - {} item(s)",
            sprint.iteration.name, sprint.team, sprint.count
        );
        println!();
        if sprint.work_items.is_empty() {
            println!("Nothing to pick up.");
            return Ok(());
        }

        for item in &sprint.work_items {
            print_item(item);
        }
        println!();
        println!("Start one with: handoff start <id> \"<title>\"");
        Ok(())
    }
}

fn print_item(item: &SprintWorkItem) {
    let effort = item
        .effort
        .map(|e| format!("{}", e))
        .unwrap_or_else(|| "-".to_string());
    let kind = if item.is_spike() { "spike" } else { "pbi" };
    println!(
        "  #{:<7} {:<6} {:<12} effort {:<4} {}",
        item.id, kind, item.state, effort, item.title
    );
    if let Some(days) = item.days_since_change {
        println!("           {} day(s) since change, {}", days, item.assigned_to);
    }
    println!("           {}", item.web_url);
}
