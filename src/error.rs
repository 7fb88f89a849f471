//! Error types for scenario validation and path replay.

use thiserror::Error;

use crate::scenario::Difficulty;

/// One structural defect in an authored scenario. The validator collects all
/// of them before failing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("Choice {choice_id} in step {step_id} references non-existent step: {target}")]
    MissingChoiceTarget {
        step_id: String,
        choice_id: String,
        target: String,
    },

    #[error("Step {step_id} next reference points to non-existent step: {target}")]
    MissingNextTarget { step_id: String, target: String },

    #[error("Entry step \"{0}\" not found in steps")]
    MissingEntry(String),

    #[error("Step id {0} is defined more than once")]
    DuplicateStep(String),

    #[error("Step {0} has no choices or next but not marked terminal")]
    DeadEnd(String),

    #[error("Step {0} mixes choices, next and terminal; exactly one is allowed")]
    AmbiguousShape(String),

    #[error("Step {step_id} has {count} choices, exceeds {difficulty} limit of {limit}")]
    TooManyChoices {
        step_id: String,
        count: usize,
        difficulty: Difficulty,
        limit: usize,
    },

    #[error("Choice {choice_id} in step {step_id} has pressureDelta {delta}, must be -15 to +15")]
    DeltaOutOfRange {
        step_id: String,
        choice_id: String,
        delta: i32,
    },

    #[error("Path too deep (>{limit} steps), possible cycle: {}", .path.join(" -> "))]
    PathTooDeep { path: Vec<String>, limit: usize },

    #[error("No terminal steps found - scenario has no clear ending")]
    NoTerminal,
}

/// Every structural defect found in one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Path validation failed for {scenario_id}:\n{}", render(.errors))]
pub struct ValidationFailure {
    pub scenario_id: String,
    pub errors: Vec<StructuralError>,
}

fn render(errors: &[StructuralError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A recorded path (or a player's move) that does not line up with the graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("Step not found: {0}")]
    UnknownStep(String),

    #[error("No choice leads from {from} to {to}")]
    NoConnectingChoice { from: String, to: String },

    #[error("Cannot transition from {from} to {to}")]
    NoConnectingEdge { from: String, to: String },

    #[error("Step {step_id} has no choice {choice_id}")]
    UnknownChoice { step_id: String, choice_id: String },

    #[error("Step {0} has no linear continuation")]
    NotLinear(String),

    #[error("Conversation already completed at {0}")]
    AlreadyCompleted(String),

    #[error("Path is empty")]
    EmptyPath,
}
