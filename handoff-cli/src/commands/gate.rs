//! Gate commands - evaluate, advance and send back

use clap::Args;
use handoff_core::{GateEvaluator, GateResult, GateStatus, StageTracker};

use super::{SignalArgs, Workspace};

/// Evaluate the current stage's gate without moving the work item
#[derive(Args, Debug)]
pub struct GateArgs {
    #[command(flatten)]
    pub signals: SignalArgs,

    /// Print the gate result as JSON
    #[arg(long)]
    pub json: bool,
}

impl GateArgs {
    pub async fn execute(&self, ws: &Workspace) -> anyhow::Result<()> {
        let tracker = ws.load_tracker()?;
        let gate = evaluate(ws, &tracker, &self.signals).await?;
        print_gate(&gate, self.json)?;
        Ok(())
    }
}

/// Evaluate the gate and hand the work item to the next stage
#[derive(Args, Debug)]
pub struct AdvanceArgs {
    #[command(flatten)]
    pub signals: SignalArgs,
}

impl AdvanceArgs {
    pub async fn execute(&self, ws: &Workspace) -> anyhow::Result<()> {
        let mut tracker = ws.load_tracker()?;
        let gate = evaluate(ws, &tracker, &self.signals).await?;
        print_gate(&gate, false)?;
        println!();

        let from = tracker.current_stage();
        let to = tracker.advance(&gate)?;
        ws.save_tracker(&tracker)?;

        if gate.verdict == GateStatus::Warn {
            println!(
                "Handed off {} -> {} with {} warning(s)",
                from,
                to,
                gate.warnings().len()
            );
        } else {
            println!("Handed off {} -> {}", from, to);
        }
        if let Some(artifact) = to.artifact() {
            println!("  {} produces: {}", to, artifact);
        }
        Ok(())
    }
}

/// Route a failed gate back to the stage that produced the work
#[derive(Args, Debug)]
pub struct SendBackArgs {
    #[command(flatten)]
    pub signals: SignalArgs,
}

impl SendBackArgs {
    pub async fn execute(&self, ws: &Workspace) -> anyhow::Result<()> {
        let mut tracker = ws.load_tracker()?;
        let gate = evaluate(ws, &tracker, &self.signals).await?;
        print_gate(&gate, false)?;
        println!();

        let from = tracker.current_stage();
        let to = tracker.send_back(&gate)?;
        ws.save_tracker(&tracker)?;

        let failed: Vec<&str> = gate.hard_failures().iter().map(|c| c.name.as_str()).collect();
        println!("Sent back {} -> {} (failed: {})", from, to, failed.join(", "));
        Ok(())
    }
}

async fn evaluate(
    ws: &Workspace,
    tracker: &StageTracker,
    args: &SignalArgs,
) -> anyhow::Result<GateResult> {
    let signals = args.collect(ws, tracker).await?;
    let evaluator = GateEvaluator::new(ws.config.gates.clone());
    Ok(evaluator.evaluate(tracker.current_stage(), &signals))
}

fn print_gate(gate: &GateResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(gate)?);
    } else {
        println!("{}", gate.summary());
    }
    Ok(())
}
