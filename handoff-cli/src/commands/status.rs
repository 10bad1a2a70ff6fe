//! Status command - show the work item's stage, artifacts and history

use chrono::Utc;
use clap::Args;
use handoff_core::{SpikeFindings, StageTracker};

use super::Workspace;

/// Show where the work item is in the pipeline
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print tracker state as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub async fn execute(&self, ws: &Workspace) -> anyhow::Result<()> {
        let tracker = ws.load_tracker()?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&tracker)?);
            return Ok(());
        }

        print_summary(ws, &tracker)?;
        Ok(())
    }
}

fn print_summary(ws: &Workspace, tracker: &StageTracker) -> anyhow::Result<()> {
    let item = tracker.work_item();
    let now = Utc::now();

    println!("Work item #{}: {}", item.id, item.title);
    println!("  Kind:   {}", item.kind.board_name());
    println!("  Branch: {}", item.branch);
    match tracker.entered_current_at() {
        Some(at) => println!(
            "  Stage:  {} (for {})",
            tracker.current_stage(),
            format_duration((now - at).num_seconds())
        ),
        None => println!("  Stage:  {}", tracker.current_stage()),
    }
    if let Some(next) = tracker.current_stage().next() {
        println!("  Next:   {}", next);
    }

    println!();
    println!("Artifacts:");
    let artifacts = tracker.artifacts();
    match ws.try_load_plan(tracker)? {
        Some(plan) => {
            let (done, total) = plan.progress();
            let path = artifacts.plan.as_deref().map(|p| p.display().to_string());
            println!(
                "  Plan:         {} ({}/{} items done)",
                path.unwrap_or_default(),
                done,
                total
            );
        }
        None => println!("  Plan:         (none)"),
    }
    match artifacts.verification_report {
        Some(ref p) => println!("  Verification: {}", p.display()),
        None => println!("  Verification: (none)"),
    }
    if let Some(ref p) = artifacts.spike_findings {
        println!("  Spike:        {}", p.display());
        if let Ok(spike) = SpikeFindings::load(&ws.spike_state_path()) {
            if spike.overran(now) {
                println!("                ⚠️  time box exceeded");
            }
        }
    }

    println!();
    println!("History:");
    for entry in tracker.history() {
        let verdict = entry
            .verdict
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {}  {:<18} {}",
            entry.entered_at.format("%Y-%m-%d %H:%M:%S"),
            entry.stage.as_str(),
            verdict
        );
    }
    Ok(())
}

/// Format seconds as a short human-readable duration
fn format_duration(secs: i64) -> String {
    if secs < 60 {
        format!("{}s", secs.max(0))
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(-5), "0s");
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(125), "2m");
        assert_eq!(format_duration(3 * 3600 + 15 * 60), "3h 15m");
        assert_eq!(format_duration(2 * 86400 + 5 * 3600), "2d 5h");
    }
}
