//! Structural gate for authored scenarios.
//!
//! `validate` runs every check, collects every defect and only then decides:
//! authors get the complete list in one pass instead of fixing one error per
//! run. The depth-first walk that computes reachability is also the one that
//! guards against cycles, so a scenario that loops forever is rejected rather
//! than explored indefinitely.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde::Serialize;

use crate::engine::trust_pressure::{MAX_PRESSURE_DELTA, MIN_PRESSURE_DELTA};
use crate::error::{StructuralError, ValidationFailure};
use crate::scenario::{Scenario, Step, StepKind};

/// Longest path, counted in hops from the entry step, explored before a
/// path is treated as a probable cycle.
pub const MAX_PATH_DEPTH: usize = 20;

/// Snapshot of the graph as seen from the entry step. Recomputed on every
/// call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathValidation {
    /// In discovery order.
    pub reachable_steps: Vec<String>,
    pub terminal_steps: Vec<String>,
    /// In scenario order.
    pub orphaned_steps: Vec<String>,
    pub has_debrief: bool,
}

// ---------------------------------------------------------------------------
// Upfront checks
// ---------------------------------------------------------------------------

pub fn check_choice_targets(scenario: &Scenario) -> Vec<StructuralError> {
    let ids: HashSet<&str> = scenario.step_ids().collect();
    let mut errors = Vec::new();

    for step in &scenario.steps {
        for choice in &step.choices {
            if !ids.contains(choice.next_step_id.as_str()) {
                errors.push(StructuralError::MissingChoiceTarget {
                    step_id: step.id.clone(),
                    choice_id: choice.id.clone(),
                    target: choice.next_step_id.clone(),
                });
            }
        }
        if let Some(next) = &step.next {
            if !ids.contains(next.as_str()) {
                errors.push(StructuralError::MissingNextTarget {
                    step_id: step.id.clone(),
                    target: next.clone(),
                });
            }
        }
    }

    errors
}

/// Unique step ids and an entry step that exists.
pub fn check_step_ids(scenario: &Scenario) -> Vec<StructuralError> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut errors = Vec::new();

    for id in scenario.step_ids() {
        if !seen.insert(id) && reported.insert(id) {
            errors.push(StructuralError::DuplicateStep(id.to_string()));
        }
    }
    if !seen.contains(scenario.entry_step_id.as_str()) {
        errors.push(StructuralError::MissingEntry(scenario.entry_step_id.clone()));
    }

    errors
}

pub fn check_difficulty_constraints(scenario: &Scenario) -> Vec<StructuralError> {
    let limit = scenario.difficulty.max_choices();
    scenario
        .steps
        .iter()
        .filter(|step| step.choices.len() > limit)
        .map(|step| StructuralError::TooManyChoices {
            step_id: step.id.clone(),
            count: step.choices.len(),
            difficulty: scenario.difficulty,
            limit,
        })
        .collect()
}

pub fn check_pressure_deltas(scenario: &Scenario) -> Vec<StructuralError> {
    let range = MIN_PRESSURE_DELTA..=MAX_PRESSURE_DELTA;
    scenario
        .steps
        .iter()
        .flat_map(|step| step.choices.iter().map(move |choice| (step, choice)))
        .filter(|(_, choice)| !range.contains(&choice.pressure_delta))
        .map(|(step, choice)| StructuralError::DeltaOutOfRange {
            step_id: step.id.clone(),
            choice_id: choice.id.clone(),
            delta: choice.pressure_delta,
        })
        .collect()
}

pub fn check_step_shapes(scenario: &Scenario) -> Vec<StructuralError> {
    scenario
        .steps
        .iter()
        .filter(|step| step.kind() == StepKind::Ambiguous)
        .map(|step| StructuralError::AmbiguousShape(step.id.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Depth-first walk
// ---------------------------------------------------------------------------

struct PathWalker<'a> {
    index: HashMap<&'a str, &'a Step>,
    /// (step, depth) pairs already expanded. Everything below a step depends
    /// only on the step and how many hops remain, so a second arrival at the
    /// same depth has nothing new to find.
    expanded: HashSet<(&'a str, usize)>,
    /// Steps visited by the depth-free sweep that runs after an overflow.
    swept: HashSet<&'a str>,
    reachable: Vec<&'a str>,
    reachable_set: HashSet<&'a str>,
    terminal: Vec<&'a str>,
    terminal_set: HashSet<&'a str>,
    dead_ends: HashSet<&'a str>,
    errors: Vec<StructuralError>,
    /// Set once a path blows the depth ceiling; only the first one is
    /// reported.
    overflowed: bool,
}

impl<'a> PathWalker<'a> {
    fn new(scenario: &'a Scenario) -> Self {
        Self {
            index: scenario.step_index(),
            expanded: HashSet::new(),
            swept: HashSet::new(),
            reachable: Vec::new(),
            reachable_set: HashSet::new(),
            terminal: Vec::new(),
            terminal_set: HashSet::new(),
            dead_ends: HashSet::new(),
            errors: Vec::new(),
            overflowed: false,
        }
    }

    fn walk(&mut self, step_id: &'a str, path: &mut Vec<&'a str>) {
        let depth = path.len();
        if depth > MAX_PATH_DEPTH {
            if !self.overflowed {
                let mut offending: Vec<String> = path.iter().map(|s| s.to_string()).collect();
                offending.push(step_id.to_string());
                warn!("Path exceeds {MAX_PATH_DEPTH} hops, treating as a cycle: {offending:?}");
                self.errors.push(StructuralError::PathTooDeep {
                    path: offending,
                    limit: MAX_PATH_DEPTH,
                });
                self.overflowed = true;
            }
            // Past the ceiling only reachability is left to finish.
            self.sweep(step_id);
            return;
        }
        if !self.expanded.insert((step_id, depth)) {
            return;
        }
        let Some(step) = self.visit(step_id) else {
            return;
        };

        path.push(step_id);
        for next in step.targets() {
            self.walk(next, path);
        }
        path.pop();
    }

    fn sweep(&mut self, step_id: &'a str) {
        if !self.swept.insert(step_id) {
            return;
        }
        let Some(step) = self.visit(step_id) else {
            return;
        };
        for next in step.targets() {
            self.sweep(next);
        }
    }

    /// Record `step_id` as reachable and classify it. Returns the step so the
    /// caller can follow its edges.
    fn visit(&mut self, step_id: &'a str) -> Option<&'a Step> {
        // Dangling targets are reported by `check_choice_targets`.
        let step = self.index.get(step_id).copied()?;
        if self.reachable_set.insert(step_id) {
            self.reachable.push(step_id);
        }

        match step.kind() {
            StepKind::Terminal => {
                if self.terminal_set.insert(step_id) {
                    self.terminal.push(step_id);
                }
            }
            StepKind::DeadEnd => {
                if self.dead_ends.insert(step_id) {
                    self.errors
                        .push(StructuralError::DeadEnd(step_id.to_string()));
                }
            }
            // Ambiguous steps are reported by `check_step_shapes`; every edge
            // is still followed so reachability stays complete.
            StepKind::Branch(_) | StepKind::Linear(_) | StepKind::Ambiguous => {}
        }
        Some(step)
    }
}

/// Walk every path from the entry step. Returns the reachability snapshot and
/// the structural errors found along the way, including `NoTerminal`.
pub fn walk_paths(scenario: &Scenario) -> (PathValidation, Vec<StructuralError>) {
    let mut walker = PathWalker::new(scenario);
    let mut path = Vec::new();
    walker.walk(&scenario.entry_step_id, &mut path);

    let orphaned_steps: Vec<String> = scenario
        .step_ids()
        .filter(|id| !walker.reachable_set.contains(id))
        .map(str::to_string)
        .collect();

    let has_debrief = !walker.terminal.is_empty();
    let mut errors = walker.errors;
    if !has_debrief {
        errors.push(StructuralError::NoTerminal);
    }

    let validation = PathValidation {
        reachable_steps: walker.reachable.iter().map(|s| s.to_string()).collect(),
        terminal_steps: walker.terminal.iter().map(|s| s.to_string()).collect(),
        orphaned_steps,
        has_debrief,
    };
    (validation, errors)
}

/// Run every structural check on `scenario`. Fails with all defects at once;
/// never returns a partial result.
pub fn validate(scenario: &Scenario) -> Result<PathValidation, ValidationFailure> {
    let mut errors = check_choice_targets(scenario);
    errors.extend(check_step_ids(scenario));
    errors.extend(check_difficulty_constraints(scenario));
    errors.extend(check_pressure_deltas(scenario));
    errors.extend(check_step_shapes(scenario));

    let (validation, walk_errors) = walk_paths(scenario);
    errors.extend(walk_errors);

    if !errors.is_empty() {
        debug!("{}: {} structural errors", scenario.id, errors.len());
        return Err(ValidationFailure {
            scenario_id: scenario.id.clone(),
            errors,
        });
    }

    if !validation.orphaned_steps.is_empty() {
        warn!(
            "{}: orphaned steps: {}",
            scenario.id,
            validation.orphaned_steps.join(", ")
        );
    }

    Ok(validation)
}
