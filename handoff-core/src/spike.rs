//! Spike findings
//!
//! A spike is an advisory, time-boxed investigation. The time box is a
//! convention: nothing stops the spike when it runs out, but an overrun is
//! reported when findings are recorded or concluded.

use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Findings of one spike
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikeFindings {
    pub work_item_id: u64,
    /// Question the spike answers
    pub question: String,
    /// Agreed time box
    #[serde(with = "humantime_serde")]
    pub time_box: Duration,
    pub started_at: DateTime<Utc>,
    pub concluded_at: Option<DateTime<Utc>>,
    /// Findings in the order they were recorded
    #[serde(default)]
    pub findings: Vec<String>,
    pub recommendation: Option<String>,
}

impl SpikeFindings {
    /// Start a spike now
    pub fn start(work_item_id: u64, question: impl Into<String>, time_box: Duration) -> Self {
        Self::start_at(work_item_id, question, time_box, Utc::now())
    }

    /// Start a spike at a given instant
    pub fn start_at(
        work_item_id: u64,
        question: impl Into<String>,
        time_box: Duration,
        started_at: DateTime<Utc>,
    ) -> Self {
        let question = question.into();
        tracing::info!(
            work_item = work_item_id,
            question = %question,
            time_box = %humantime_serde::re::humantime::format_duration(time_box),
            "Spike started"
        );
        Self {
            work_item_id,
            question,
            time_box,
            started_at,
            concluded_at: None,
            findings: Vec::new(),
            recommendation: None,
        }
    }

    /// Whether a recommendation has been recorded
    pub fn is_concluded(&self) -> bool {
        self.concluded_at.is_some()
    }

    /// Record a finding
    pub fn add_finding(&mut self, finding: impl Into<String>) -> Result<()> {
        if self.is_concluded() {
            return Err(Error::InvalidTransition(format!(
                "Spike for work item #{} is already concluded",
                self.work_item_id
            )));
        }
        self.findings.push(finding.into());
        self.warn_if_overran(Utc::now());
        Ok(())
    }

    /// Record the recommendation and close the spike
    pub fn conclude(&mut self, recommendation: impl Into<String>) -> Result<()> {
        self.conclude_at(recommendation, Utc::now())
    }

    /// Close the spike at a given instant
    pub fn conclude_at(
        &mut self,
        recommendation: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        if self.is_concluded() {
            return Err(Error::InvalidTransition(format!(
                "Spike for work item #{} is already concluded",
                self.work_item_id
            )));
        }
        self.recommendation = Some(recommendation.into());
        self.concluded_at = Some(at);
        self.warn_if_overran(at);
        Ok(())
    }

    /// Time spent, up to the conclusion or `now`
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        let end = self.concluded_at.unwrap_or(now);
        (end - self.started_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether the spike ran past its time box
    pub fn overran(&self, now: DateTime<Utc>) -> bool {
        self.elapsed(now) > self.time_box
    }

    fn warn_if_overran(&self, now: DateTime<Utc>) {
        if self.overran(now) {
            tracing::warn!(
                work_item = self.work_item_id,
                elapsed_mins = self.elapsed(now).as_secs() / 60,
                time_box_mins = self.time_box.as_secs() / 60,
                "Spike exceeded its time box"
            );
        }
    }

    /// Render as SPIKE-FINDINGS.md
    pub fn to_markdown(&self) -> String {
        let fmt_ts = |ts: DateTime<Utc>| ts.to_rfc3339_opts(SecondsFormat::Secs, true);
        let time_box = humantime_serde::re::humantime::format_duration(self.time_box);

        let mut out = String::new();
        let _ = writeln!(out, "# Spike Findings: Work Item #{}", self.work_item_id);
        out.push('\n');
        let _ = writeln!(out, "**Question:** {}", self.question);
        let _ = writeln!(out, "**Time box:** {}", time_box);
        let _ = writeln!(out, "**Started:** {}", fmt_ts(self.started_at));
        match self.concluded_at {
            Some(at) => {
                let _ = writeln!(out, "**Concluded:** {}", fmt_ts(at));
                if self.overran(at) {
                    let spent = Duration::from_secs(self.elapsed(at).as_secs());
                    let _ = writeln!(
                        out,
                        "\n> ⚠️ Time box exceeded: took {}",
                        humantime_serde::re::humantime::format_duration(spent)
                    );
                }
            }
            None => {
                let _ = writeln!(out, "**Concluded:** in progress");
            }
        }
        out.push('\n');

        out.push_str("## Findings\n\n");
        if self.findings.is_empty() {
            out.push_str("_None recorded._\n");
        }
        for finding in &self.findings {
            let _ = writeln!(out, "- {}", finding);
        }
        out.push('\n');

        out.push_str("## Recommendation\n\n");
        match self.recommendation {
            Some(ref rec) => {
                let _ = writeln!(out, "{}", rec);
            }
            None => out.push_str("_Pending._\n"),
        }
        out
    }

    /// Load spike state from JSON
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save spike state as JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Write the Markdown findings document
    pub fn write_markdown(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_markdown())?;
        Ok(())
    }
}

/// Parse a time box such as `2h` or `1d`; zero is rejected
pub fn parse_time_box(s: &str) -> Result<Duration> {
    let duration = crate::config::parse_duration(s)?;
    if duration.is_zero() {
        return Err(Error::Config("Spike time box must be greater than zero".to_string()));
    }
    Ok(duration)
}
