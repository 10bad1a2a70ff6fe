//! Azure DevOps connection settings
//!
//! Credentials are read from the environment only, never from config files.

use crate::{Error, Result};

/// Organization variable
pub const ORG_VAR: &str = "AZURE_DEVOPS_ORG";
/// Project variable
pub const PROJECT_VAR: &str = "AZURE_DEVOPS_PROJECT";
/// Team variable
pub const TEAM_VAR: &str = "AZURE_DEVOPS_TEAM";
/// Personal access token variable
pub const PAT_VAR: &str = "AZURE_DEVOPS_PAT";

/// Organization, project, team and personal access token
#[derive(Clone, PartialEq, Eq)]
pub struct DevOpsEnv {
    pub org: String,
    pub project: String,
    /// Team name, case-sensitive
    pub team: String,
    pat: String,
}

impl std::fmt::Debug for DevOpsEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevOpsEnv")
            .field("org", &self.org)
            .field("project", &self.project)
            .field("team", &self.team)
            .field("pat", &"<redacted>")
            .finish()
    }
}

impl DevOpsEnv {
    /// Build from explicit values
    pub fn new(
        org: impl Into<String>,
        project: impl Into<String>,
        team: impl Into<String>,
        pat: impl Into<String>,
    ) -> Self {
        Self {
            org: org.into(),
            project: project.into(),
            team: team.into(),
            pat: pat.into(),
        }
    }

    /// Read all four `AZURE_DEVOPS_*` variables
    ///
    /// Fails on the first one that is unset or blank, before anything is run.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| -> Result<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::ConfigurationMissing(key.to_string()))
        };

        Ok(Self {
            org: get(ORG_VAR)?,
            project: get(PROJECT_VAR)?,
            team: get(TEAM_VAR)?,
            pat: get(PAT_VAR)?,
        })
    }

    /// The personal access token
    pub fn pat(&self) -> &str {
        &self.pat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_lookup() {
        let env = vars(&[
            (ORG_VAR, "contoso"),
            (PROJECT_VAR, "Payments"),
            (TEAM_VAR, "Payments Team"),
            (PAT_VAR, " secret-token\n"),
        ]);
        let devops = DevOpsEnv::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(devops.org, "contoso");
        assert_eq!(devops.team, "Payments Team");
        assert_eq!(devops.pat(), "secret-token");
    }

    #[test]
    fn test_missing_pat() {
        let env = vars(&[
            (ORG_VAR, "contoso"),
            (PROJECT_VAR, "Payments"),
            (TEAM_VAR, "Payments Team"),
        ]);
        let err = DevOpsEnv::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, Error::ConfigurationMissing(ref v) if v == PAT_VAR));
    }

    #[test]
    fn test_blank_counts_as_missing() {
        let env = vars(&[(ORG_VAR, "  ")]);
        let err = DevOpsEnv::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, Error::ConfigurationMissing(ref v) if v == ORG_VAR));
    }

    #[test]
    fn test_debug_redacts_pat() {
        let devops = DevOpsEnv::new("contoso", "Payments", "Team", "super-secret");
        let debug = format!("{:?}", devops);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
