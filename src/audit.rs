use log::{info, warn};
use serde::Serialize;

use crate::engine::trust_pressure::{GAUGE_MAX, GAUGE_MIN};
use crate::scenario::{Difficulty, Scenario};
use crate::validate::validate;

/// Easy scenarios are meant to be played in about thirty seconds.
pub const EASY_CHOICE_BUDGET: usize = 6;

pub const MIN_TEACHING_POINTS: usize = 2;
pub const MAX_TEACHING_POINTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathInfo {
    pub reachable_steps: usize,
    pub terminal_steps: usize,
    pub orphaned_steps: usize,
    pub has_debrief: bool,
}

/// Everything wrong (or worth a look) with one scenario document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub scenario_id: String,
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_info: Option<PathInfo>,
}

impl AuditReport {
    /// Report for a document that never made it to a `Scenario`.
    pub fn unreadable(scenario_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            scenario_id: scenario_id.into(),
            valid: false,
            errors: vec![error.into()],
            warnings: Vec::new(),
            path_info: None,
        }
    }
}

fn debrief_errors(scenario: &Scenario) -> Vec<String> {
    let debrief = &scenario.debrief;
    let mut errors = Vec::new();

    if debrief.red_flag_primary.trim().is_empty() {
        errors.push("Missing debrief.redFlagPrimary".to_string());
    }

    let points = debrief.teaching_points.len();
    if !(MIN_TEACHING_POINTS..=MAX_TEACHING_POINTS).contains(&points) {
        errors.push(format!(
            "debrief.teachingPoints must have {MIN_TEACHING_POINTS}-{MAX_TEACHING_POINTS} items, found {points}"
        ));
    }

    match debrief.target_trust_range.as_slice() {
        [min, max] if GAUGE_MIN <= *min && min <= max && *max <= GAUGE_MAX => {}
        [min, max] => errors.push(format!(
            "debrief.targetTrustRange [{min}, {max}] must satisfy 0 <= min <= max <= 100"
        )),
        _ => errors.push("debrief.targetTrustRange must be [min, max] tuple".to_string()),
    }

    errors
}

/// Validate the graph and the debrief of one scenario.
pub fn audit(scenario: &Scenario) -> AuditReport {
    let mut errors = debrief_errors(scenario);
    let mut warnings = Vec::new();
    let mut path_info = None;

    match validate(scenario) {
        Ok(validation) => {
            if !validation.orphaned_steps.is_empty() {
                warnings.push(format!(
                    "Orphaned steps: {}",
                    validation.orphaned_steps.join(", ")
                ));
            }
            path_info = Some(PathInfo {
                reachable_steps: validation.reachable_steps.len(),
                terminal_steps: validation.terminal_steps.len(),
                orphaned_steps: validation.orphaned_steps.len(),
                has_debrief: validation.has_debrief,
            });
        }
        Err(failure) => errors.extend(failure.errors.iter().map(ToString::to_string)),
    }

    if scenario.difficulty == Difficulty::Easy {
        let total = scenario.total_choices();
        if total > EASY_CHOICE_BUDGET {
            warnings.push(format!(
                "Easy scenario has {total} total choices - may exceed 30-second target"
            ));
        }
    }

    for w in &warnings {
        warn!("{}: {}", scenario.id, w);
    }

    AuditReport {
        scenario_id: scenario.id.clone(),
        valid: errors.is_empty(),
        errors,
        warnings,
        path_info,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    pub total: usize,
    pub passed: usize,
    /// Percent of documents that passed.
    pub reliability_score: f64,
    pub results: Vec<AuditReport>,
}

impl AuditSummary {
    pub fn from_reports(results: Vec<AuditReport>) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.valid).count();
        let reliability_score = if total > 0 {
            passed as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        info!("Audit: {passed}/{total} scenarios passed ({reliability_score:.1}%)");
        Self {
            total,
            passed,
            reliability_score,
            results,
        }
    }

    pub fn passes(&self, threshold: f64) -> bool {
        self.reliability_score >= threshold
    }
}

pub fn audit_corpus(scenarios: &[Scenario]) -> AuditSummary {
    AuditSummary::from_reports(scenarios.iter().map(audit).collect())
}
