//! Verify command - run the Implementation Verifier over the plan

use clap::Args;
use handoff_core::VerificationReport;

use super::{SignalArgs, Workspace};

/// Write the verification report for the current plan
#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub signals: SignalArgs,

    /// Print the report instead of only its recommendation
    #[arg(long)]
    pub print: bool,
}

impl VerifyArgs {
    pub async fn execute(&self, ws: &Workspace) -> anyhow::Result<()> {
        let mut tracker = ws.load_tracker()?;
        let plan = ws.load_plan(&tracker)?;
        let signals = self.signals.collect(ws, &tracker).await?;

        let build_exit_code = signals.build_exit_code.ok_or_else(|| {
            anyhow::anyhow!("No build result. Pass --build-exit or --run.")
        })?;
        let tests = signals
            .tests
            .ok_or_else(|| anyhow::anyhow!("No test results. Pass --passed/--failed or --run."))?;

        let report = VerificationReport::verify(&plan, build_exit_code, tests, &[]);
        let path = ws.verification_path();
        report.save(&path)?;
        tracker.register_verification_report(ws.relative(&path));
        ws.save_tracker(&tracker)?;

        if self.print {
            print!("{}", report.to_markdown());
            println!();
        }
        println!("Wrote {}", path.display());
        println!(
            "Items covered: {}/{}",
            report.covered_count(),
            report.items.len()
        );
        println!("Recommendation: {}", report.recommendation);
        Ok(())
    }
}
