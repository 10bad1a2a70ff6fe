//! PLAN.md parser

use chrono::{DateTime, Utc};

use super::model::{ChecklistItem, Plan};
use crate::{Error, Result};

/// Parse a PLAN.md file
///
/// Unknown lines are ignored so hand-edited plans with extra notes still load.
pub fn parse_plan(content: &str) -> Result<Plan> {
    let mut title: Option<String> = None;
    let mut work_item_id: Option<u64> = None;
    let mut branch: Option<String> = None;
    let mut created_at: Option<DateTime<Utc>> = None;
    let mut items: Vec<ChecklistItem> = Vec::new();
    let mut in_checklist = false;

    for raw in content.lines() {
        let line = raw.trim();

        // Title (first # header)
        if let Some(rest) = line.strip_prefix("# ") {
            if title.is_none() {
                let rest = rest.trim();
                title = Some(rest.strip_prefix("Plan:").unwrap_or(rest).trim().to_string());
            }
            continue;
        }

        // Metadata lines: **Key:** value
        if let Some(rest) = line.strip_prefix("**Work Item:**") {
            let id = rest.trim().trim_start_matches('#');
            work_item_id = Some(
                id.parse()
                    .map_err(|_| Error::Plan(format!("Invalid work item id: {}", rest.trim())))?,
            );
            continue;
        }
        if let Some(rest) = line.strip_prefix("**Branch:**") {
            branch = Some(rest.trim().to_string());
            continue;
        }
        if let Some(rest) = line.strip_prefix("**Created:**") {
            created_at = DateTime::parse_from_rfc3339(rest.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .ok();
            continue;
        }

        // Section headers switch the checklist on and off
        if let Some(section) = line.strip_prefix("## ") {
            in_checklist = section.trim().eq_ignore_ascii_case("checklist");
            continue;
        }

        if !in_checklist {
            continue;
        }

        // Top-level item: "- [ ] 1. Description" (not indented)
        if raw.starts_with("- [") {
            if let Some(item) = parse_item_line(line) {
                items.push(item);
            }
            continue;
        }

        // Item details: "  - Test: ..." / "  - Done: ..."
        if let Some(item) = items.last_mut() {
            if let Some(rest) = line.strip_prefix("- Test:") {
                item.test_scenarios.push(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix("- Done:") {
                item.done_criteria.push(rest.trim().to_string());
            }
        }
    }

    let work_item_id = work_item_id
        .ok_or_else(|| Error::Plan("Missing **Work Item:** line".to_string()))?;

    Ok(Plan {
        work_item_id,
        title: title.unwrap_or_default(),
        branch,
        created_at,
        items,
    })
}

/// Parse "- [x] 3. Description"
fn parse_item_line(line: &str) -> Option<ChecklistItem> {
    let rest = line.strip_prefix("- [")?;
    let mut chars = rest.chars();
    let mark = chars.next()?;
    let rest = chars.as_str().strip_prefix(']')?.trim();

    let completed = match mark {
        'x' | 'X' => true,
        ' ' => false,
        _ => return None,
    };

    // Drop the "N." ordinal if present; a bare "N." is an empty description
    let is_ordinal = |num: &str| !num.is_empty() && num.chars().all(|c| c.is_ascii_digit());
    let description = match rest.split_once(". ") {
        Some((num, desc)) if is_ordinal(num) => desc,
        _ => match rest.strip_suffix('.') {
            Some(num) if is_ordinal(num) => "",
            _ => rest,
        },
    };

    Some(ChecklistItem {
        description: description.trim().to_string(),
        test_scenarios: Vec::new(),
        done_criteria: Vec::new(),
        completed,
    })
}
