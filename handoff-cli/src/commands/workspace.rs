//! Shared access to the working tree, its planning directory and config

use std::path::{Path, PathBuf};

use anyhow::Context;
use handoff_core::workflow::AuxiliaryAgent;
use handoff_core::{Config, Plan, StageTracker};
use handoff_devops::{DevOpsEnv, ScriptRunner};

/// The working tree a command operates on
#[derive(Debug, Clone)]
pub struct Workspace {
    pub workdir: PathBuf,
    pub config: Config,
}

impl Workspace {
    pub fn new(workdir: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            workdir: workdir.into(),
            config,
        }
    }

    pub fn state_path(&self) -> PathBuf {
        self.config.planning.state_path(&self.workdir)
    }

    pub fn plan_path(&self) -> PathBuf {
        self.config.planning.plan_path(&self.workdir)
    }

    pub fn verification_path(&self) -> PathBuf {
        self.config
            .planning
            .artifact_path(&self.workdir, AuxiliaryAgent::ImplementationVerifier.artifact())
    }

    pub fn spike_findings_path(&self) -> PathBuf {
        self.config
            .planning
            .artifact_path(&self.workdir, AuxiliaryAgent::Spike.artifact())
    }

    /// JSON state behind SPIKE-FINDINGS.md
    pub fn spike_state_path(&self) -> PathBuf {
        self.config.planning.artifact_path(&self.workdir, "spike.json")
    }

    pub fn has_tracker(&self) -> bool {
        self.state_path().exists()
    }

    /// Load the stage tracker; fails if no work item was started
    pub fn load_tracker(&self) -> anyhow::Result<StageTracker> {
        let path = self.state_path();
        if !path.exists() {
            anyhow::bail!(
                "No work item in progress ({} not found). Run 'handoff start <id> <title>' first.",
                path.display()
            );
        }
        let tracker = StageTracker::load(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(tracker.with_root(&self.workdir))
    }

    pub fn save_tracker(&self, tracker: &StageTracker) -> anyhow::Result<()> {
        let path = self.state_path();
        tracker
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Load the plan registered with the tracker
    pub fn load_plan(&self, tracker: &StageTracker) -> anyhow::Result<Plan> {
        let path = self.resolve(tracker.plan_path()?);
        Plan::load(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    /// Plan registered with the tracker, if there is one
    pub fn try_load_plan(&self, tracker: &StageTracker) -> anyhow::Result<Option<Plan>> {
        match tracker.plan_path() {
            Ok(_) => self.load_plan(tracker).map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Path relative to the working tree when possible, for state and output
    pub fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.workdir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }

    /// Resolve a stored path against the working tree
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workdir.join(path)
        }
    }

    /// Script runner configured from the environment and config
    pub fn devops_runner(&self) -> anyhow::Result<ScriptRunner> {
        let env = DevOpsEnv::from_env()?;
        let devops = &self.config.devops;
        Ok(ScriptRunner::new(env)
            .python(devops.python.clone())
            .scripts_dir(self.resolve(&devops.scripts_dir))
            .timeout(devops.timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let ws = Workspace::new("/repo", Config::default());
        assert_eq!(ws.state_path(), PathBuf::from("/repo/.planning/state.json"));
        assert_eq!(ws.plan_path(), PathBuf::from("/repo/.planning/PLAN.md"));
        assert_eq!(
            ws.verification_path(),
            PathBuf::from("/repo/.planning/VERIFICATION.md")
        );
        assert_eq!(
            ws.spike_findings_path(),
            PathBuf::from("/repo/.planning/SPIKE-FINDINGS.md")
        );
    }

    #[test]
    fn test_relative_and_resolve() {
        let ws = Workspace::new("/repo", Config::default());
        let rel = ws.relative(Path::new("/repo/.planning/PLAN.md"));
        assert_eq!(rel, PathBuf::from(".planning/PLAN.md"));
        assert_eq!(ws.resolve(&rel), PathBuf::from("/repo/.planning/PLAN.md"));
        assert_eq!(ws.relative(Path::new("/elsewhere/x")), PathBuf::from("/elsewhere/x"));
    }
}
