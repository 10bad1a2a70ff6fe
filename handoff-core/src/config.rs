//! Configuration management for Handoff
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (HANDOFF_*)
//! 3. Config file (~/.config/handoff/config.toml)
//! 4. Default values
//!
//! Azure DevOps credentials are never read from here; they come from the
//! `AZURE_DEVOPS_*` environment variables only.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// An external build or test command
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ToolConfig {
    /// Program to execute
    pub program: String,

    /// Arguments passed to the program
    #[serde(default)]
    pub args: Vec<String>,

    /// Maximum time the command may run
    #[serde(with = "humantime_serde", default = "default_tool_timeout")]
    pub timeout: Duration,
}

fn default_tool_timeout() -> Duration {
    Duration::from_secs(600)
}

impl ToolConfig {
    fn dotnet(subcommand: &str) -> Self {
        Self {
            program: "dotnet".to_string(),
            args: vec![subcommand.to_string()],
            timeout: default_tool_timeout(),
        }
    }

    /// Command line as a single string, for display
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Quality gate thresholds
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GateConfig {
    /// Minimum line coverage before the Reviewer's coverage criterion warns
    pub coverage_threshold: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            coverage_threshold: 80.0,
        }
    }
}

/// Where planning artifacts live
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlanningConfig {
    /// Directory, relative to the working tree, holding PLAN.md and friends
    pub dir: PathBuf,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".planning"),
        }
    }
}

impl PlanningConfig {
    /// Planning directory resolved against a working tree
    pub fn dir_in(&self, workdir: &Path) -> PathBuf {
        workdir.join(&self.dir)
    }

    /// Path of PLAN.md
    pub fn plan_path(&self, workdir: &Path) -> PathBuf {
        self.dir_in(workdir).join("PLAN.md")
    }

    /// Path of the stage tracker state file
    pub fn state_path(&self, workdir: &Path) -> PathBuf {
        self.dir_in(workdir).join("state.json")
    }

    /// Path of an arbitrary artifact in the planning directory
    pub fn artifact_path(&self, workdir: &Path, name: &str) -> PathBuf {
        self.dir_in(workdir).join(name)
    }
}

/// How the Azure DevOps scripts are invoked
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DevOpsConfig {
    /// Python interpreter
    pub python: String,

    /// Directory containing the skill scripts
    pub scripts_dir: PathBuf,

    /// Per-invocation timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for DevOpsConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            scripts_dir: PathBuf::from(".github/skills/azure-devops-api/scripts"),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Build collaborator
    pub build: ToolConfig,

    /// Test collaborator
    pub test: ToolConfig,

    /// Gate thresholds
    pub gates: GateConfig,

    /// Planning artifacts
    pub planning: PlanningConfig,

    /// Azure DevOps scripts
    pub devops: DevOpsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            build: ToolConfig::dotnet("build"),
            test: ToolConfig::dotnet("test"),
            gates: GateConfig::default(),
            planning: PlanningConfig::default(),
            devops: DevOpsConfig::default(),
        }
    }
}

/// CLI flag overrides
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Explicit config file path
    pub config_path: Option<PathBuf>,
    /// Planning directory
    pub planning_dir: Option<PathBuf>,
    /// Scripts directory
    pub scripts_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents).map_err(|e| {
            Error::Config(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/handoff/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("handoff").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - HANDOFF_PLANNING_DIR: Planning directory
    /// - HANDOFF_SCRIPTS_DIR: Azure DevOps scripts directory
    /// - HANDOFF_PYTHON: Python interpreter
    /// - HANDOFF_COVERAGE_THRESHOLD: Reviewer coverage threshold
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(dir) = lookup("HANDOFF_PLANNING_DIR") {
            self.planning.dir = PathBuf::from(dir);
        }

        if let Some(dir) = lookup("HANDOFF_SCRIPTS_DIR") {
            self.devops.scripts_dir = PathBuf::from(dir);
        }

        if let Some(python) = lookup("HANDOFF_PYTHON") {
            self.devops.python = python;
        }

        if let Some(threshold) = lookup("HANDOFF_COVERAGE_THRESHOLD") {
            self.gates.coverage_threshold = threshold.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "HANDOFF_COVERAGE_THRESHOLD must be a number, got {:?}",
                    threshold
                ))
            })?;
        }

        Ok(self)
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, cli: &CliOverrides) -> Self {
        if let Some(ref dir) = cli.planning_dir {
            self.planning.dir = dir.clone();
        }

        if let Some(ref dir) = cli.scripts_dir {
            self.devops.scripts_dir = dir.clone();
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(cli: &CliOverrides) -> Result<Self> {
        let base = match cli.config_path {
            Some(ref path) => Self::load_from_file(path)?,
            None => Self::load()?,
        };
        Ok(base.with_env_overrides()?.with_cli_overrides(cli))
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }
}

/// Parse a human duration such as `2h` or `90m`
pub fn parse_duration(s: &str) -> Result<Duration> {
    humantime_serde::re::humantime::parse_duration(s.trim())
        .map_err(|e| Error::Config(format!("Invalid duration {:?}: {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.build.command_line(), "dotnet build");
        assert_eq!(config.test.command_line(), "dotnet test");
        assert_eq!(config.gates.coverage_threshold, 80.0);
        assert_eq!(config.planning.dir, PathBuf::from(".planning"));
        assert_eq!(config.devops.python, "python3");
        assert_eq!(config.devops.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[build]
program = "dotnet"
args = ["build", "Payments.sln", "-c", "Release"]
timeout = "15m"

[gates]
coverage_threshold = 70.5

[devops]
scripts_dir = "tools/ado"
timeout = "45s"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.build.args.len(), 4);
        assert_eq!(config.build.timeout, Duration::from_secs(900));
        assert_eq!(config.gates.coverage_threshold, 70.5);
        assert_eq!(config.devops.scripts_dir, PathBuf::from("tools/ado"));
        assert_eq!(config.devops.timeout, Duration::from_secs(45));
        assert_eq!(config.devops.python, "python3");
        // Untouched sections keep defaults
        assert_eq!(config.test.command_line(), "dotnet test");
    }

    #[test]
    fn test_tool_timeout_defaults_when_omitted() {
        let config: Config = toml::from_str("[test]\nprogram = \"cargo\"\nargs = [\"test\"]\n").unwrap();
        assert_eq!(config.test.command_line(), "cargo test");
        assert_eq!(config.test.timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("HANDOFF_PLANNING_DIR", "docs/planning"),
            ("HANDOFF_PYTHON", "/usr/bin/python3.12"),
            ("HANDOFF_COVERAGE_THRESHOLD", "65"),
        ]
        .into_iter()
        .collect();

        let config = Config::default()
            .with_overrides_from(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.planning.dir, PathBuf::from("docs/planning"));
        assert_eq!(config.devops.python, "/usr/bin/python3.12");
        assert_eq!(config.gates.coverage_threshold, 65.0);
    }

    #[test]
    fn test_invalid_threshold_env() {
        let result = Config::default().with_overrides_from(|k| {
            (k == "HANDOFF_COVERAGE_THRESHOLD").then(|| "lots".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_cli_overrides_win() {
        let cli = CliOverrides {
            planning_dir: Some(PathBuf::from("cli-planning")),
            ..Default::default()
        };
        let config = Config::default()
            .with_overrides_from(|k| (k == "HANDOFF_PLANNING_DIR").then(|| "env-planning".to_string()))
            .unwrap()
            .with_cli_overrides(&cli);
        assert_eq!(config.planning.dir, PathBuf::from("cli-planning"));
    }

    #[test]
    fn test_load_from_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("handoff.toml");
        std::fs::write(&path, "[planning]\ndir = \"plans\"\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.planning.plan_path(Path::new("/repo")), PathBuf::from("/repo/plans/PLAN.md"));
        assert_eq!(config.planning.state_path(Path::new("/repo")), PathBuf::from("/repo/plans/state.json"));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[gates\ncoverage_threshold = ").unwrap();
        assert!(matches!(Config::load_from_file(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_toml_output_reloads() {
        let config = Config::default();
        let rendered = config.to_toml().unwrap();
        let reloaded: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("90m").unwrap(), Duration::from_secs(5400));
        assert!(parse_duration("soon").is_err());
    }
}
