//! Spike commands - record a time-boxed investigation

use chrono::Utc;
use clap::{Args, Subcommand};
use handoff_core::spike::parse_time_box;
use handoff_core::SpikeFindings;

use super::Workspace;

/// Spike commands
#[derive(Args, Debug)]
pub struct SpikeArgs {
    #[command(subcommand)]
    pub command: SpikeCommand,
}

#[derive(Subcommand, Debug)]
pub enum SpikeCommand {
    /// Start a spike
    Start {
        /// Question the spike answers
        question: String,

        /// Time box, e.g. 2h or 1d
        #[arg(long, value_parser = parse_time_box_arg)]
        time_box: std::time::Duration,

        /// Work item id (defaults to the tracked work item)
        #[arg(long)]
        work_item: Option<u64>,
    },

    /// Record a finding
    Note {
        /// Finding text
        text: String,
    },

    /// Record the recommendation and close the spike
    Conclude {
        /// Recommendation text
        recommendation: String,
    },
}

fn parse_time_box_arg(s: &str) -> Result<std::time::Duration, String> {
    parse_time_box(s).map_err(|e| e.to_string())
}

impl SpikeArgs {
    pub async fn execute(&self, ws: &Workspace) -> anyhow::Result<()> {
        match &self.command {
            SpikeCommand::Start {
                question,
                time_box,
                work_item,
            } => start(ws, question, *time_box, *work_item),
            SpikeCommand::Note { text } => {
                let mut spike = load(ws)?;
                spike.add_finding(text.clone())?;
                save(ws, &spike)?;
                println!("Recorded finding {}", spike.findings.len());
                warn_overrun(&spike);
                Ok(())
            }
            SpikeCommand::Conclude { recommendation } => {
                let mut spike = load(ws)?;
                spike.conclude(recommendation.clone())?;
                save(ws, &spike)?;
                println!(
                    "Concluded spike for #{} after {}",
                    spike.work_item_id,
                    humanize(spike.elapsed(Utc::now()))
                );
                warn_overrun(&spike);
                println!("Wrote {}", ws.spike_findings_path().display());
                Ok(())
            }
        }
    }
}

fn start(
    ws: &Workspace,
    question: &str,
    time_box: std::time::Duration,
    work_item: Option<u64>,
) -> anyhow::Result<()> {
    let id = match work_item {
        Some(id) => id,
        None => ws.load_tracker()?.work_item().id,
    };

    if let Ok(existing) = SpikeFindings::load(&ws.spike_state_path()) {
        if !existing.is_concluded() {
            anyhow::bail!(
                "A spike for #{} is still open. Conclude it before starting another.",
                existing.work_item_id
            );
        }
    }

    let spike = SpikeFindings::start(id, question, time_box);
    save(ws, &spike)?;
    println!("Started spike for #{} (time box {})", id, humanize(time_box));
    println!("Wrote {}", ws.spike_findings_path().display());
    Ok(())
}

fn load(ws: &Workspace) -> anyhow::Result<SpikeFindings> {
    let path = ws.spike_state_path();
    if !path.exists() {
        anyhow::bail!("No spike in progress. Run 'handoff spike start' first.");
    }
    Ok(SpikeFindings::load(&path)?)
}

/// Save state, rewrite SPIKE-FINDINGS.md and register it with the tracker
fn save(ws: &Workspace, spike: &SpikeFindings) -> anyhow::Result<()> {
    spike.save(&ws.spike_state_path())?;
    let findings = ws.spike_findings_path();
    spike.write_markdown(&findings)?;

    if ws.has_tracker() {
        let mut tracker = ws.load_tracker()?;
        if tracker.work_item().id == spike.work_item_id {
            tracker.register_spike_findings(ws.relative(&findings));
            ws.save_tracker(&tracker)?;
        }
    }
    Ok(())
}

fn warn_overrun(spike: &SpikeFindings) {
    if spike.overran(Utc::now()) {
        println!(
            "⚠️  Time box of {} exceeded",
            humanize(spike.time_box)
        );
    }
}

fn humanize(d: std::time::Duration) -> String {
    // Minute precision is enough for a time box
    let rounded = std::time::Duration::from_secs(d.as_secs() / 60 * 60);
    if rounded.is_zero() {
        return "under a minute".to_string();
    }
    chrono::Duration::from_std(rounded)
        .map(|c| {
            let h = c.num_hours();
            let m = c.num_minutes() % 60;
            match (h, m) {
                (0, m) => format!("{}m", m),
                (h, 0) => format!("{}h", h),
                (h, m) => format!("{}h {}m", h, m),
            }
        })
        .unwrap_or_else(|_| format!("{}s", d.as_secs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_humanize() {
        assert_eq!(humanize(Duration::from_secs(30)), "under a minute");
        assert_eq!(humanize(Duration::from_secs(45 * 60)), "45m");
        assert_eq!(humanize(Duration::from_secs(2 * 3600)), "2h");
        assert_eq!(humanize(Duration::from_secs(2 * 3600 + 5 * 60 + 59)), "2h 5m");
    }

    #[test]
    fn test_time_box_arg() {
        assert_eq!(parse_time_box_arg("2h").unwrap(), Duration::from_secs(7200));
        assert!(parse_time_box_arg("0m").is_err());
    }
}
