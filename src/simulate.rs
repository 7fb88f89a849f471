//! Automated player that enumerates paths through a scenario and replays the
//! trust/pressure transition along each one.
//!
//! Enumeration is bounded twice: paths longer than [`MAX_PATH_DEPTH`] hops
//! are dropped, and only the first [`MAX_SIMULATED_PATHS`] paths (in
//! depth-first order) are replayed. On wide graphs the replayed set is a
//! sample, not an exhaustive check; `SimulationResult::sampling` says when
//! that happened.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Serialize, Serializer};

use crate::engine::debrief::{analyze_pressure_resistance, analyze_trust_performance, TrustCategory};
use crate::engine::trust_pressure::TrustPressureTrace;
use crate::engine::ConversationState;
use crate::error::ReplayError;
use crate::scenario::{Scenario, StepKind};
use crate::validate::MAX_PATH_DEPTH;

/// Paths replayed per scenario.
pub const MAX_SIMULATED_PATHS: usize = 50;

/// Corpus release gate, in percent of scenarios with at least one completed
/// path.
pub const REQUIRED_SUCCESS_RATE: f64 = 95.0;

/// Scenarios whose completed/total path ratio falls below this are listed in
/// the corpus report.
pub const LOW_COMPLETION_RATIO: f64 = 0.8;

fn as_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}

// ---------------------------------------------------------------------------
// Path enumeration
// ---------------------------------------------------------------------------

/// Emitted when enumeration had to drop paths. Not a failure by itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingNotice {
    /// Paths kept for replay.
    pub sampled_paths: usize,
    /// Enumeration stopped at `MAX_SIMULATED_PATHS` with paths left over.
    /// How many is never computed.
    pub capped: bool,
    /// Branches abandoned for exceeding the depth ceiling. Each (step, depth)
    /// pair is counted once, so this is a lower bound.
    pub depth_truncated: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathEnumeration {
    /// At most `MAX_SIMULATED_PATHS` step-id sequences, depth-first order.
    pub paths: Vec<Vec<String>>,
    pub capped: bool,
    pub depth_truncated: usize,
}

impl PathEnumeration {
    pub fn sampling_notice(&self) -> Option<SamplingNotice> {
        if self.capped || self.depth_truncated > 0 {
            Some(SamplingNotice {
                sampled_paths: self.paths.len(),
                capped: self.capped,
                depth_truncated: self.depth_truncated,
            })
        } else {
            None
        }
    }
}

struct PathCollector<'a> {
    scenario: &'a Scenario,
    /// (step, depth) pairs whose subtree finished no path. What lies below a
    /// step depends only on the step and the hops left, so they are skipped
    /// on every later arrival.
    barren: HashSet<(&'a str, usize)>,
    out: PathEnumeration,
}

impl<'a> PathCollector<'a> {
    fn explore(&mut self, step_id: &'a str, path: &mut Vec<&'a str>) {
        if self.out.capped {
            return;
        }
        let depth = path.len();
        if depth > MAX_PATH_DEPTH {
            self.out.depth_truncated += 1;
            return;
        }
        if self.barren.contains(&(step_id, depth)) {
            return;
        }

        let scenario = self.scenario;
        let found = self.out.paths.len();
        path.push(step_id);
        match scenario.get(step_id) {
            // A dangling edge still produces a path so replay can report it.
            None => self.finish(path),
            Some(step) if step.terminal => self.finish(path),
            Some(step) => match step.kind() {
                StepKind::Terminal | StepKind::DeadEnd => self.finish(path),
                StepKind::Branch(_) | StepKind::Linear(_) | StepKind::Ambiguous => {
                    // Two edges to the same step from one prefix are one path.
                    let mut seen = HashSet::new();
                    for next in step.targets() {
                        if seen.insert(next) {
                            self.explore(next, path);
                        }
                    }
                }
            },
        }
        path.pop();

        if !self.out.capped && self.out.paths.len() == found {
            self.barren.insert((step_id, depth));
        }
    }

    fn finish(&mut self, path: &[&str]) {
        if self.out.paths.len() == MAX_SIMULATED_PATHS {
            self.out.capped = true;
            return;
        }
        self.out.paths.push(path.iter().map(|s| s.to_string()).collect());
    }
}

/// Distinct step sequences from the entry step to a leaf, following each
/// choice as its own branch and `next` edges linearly. Stops as soon as a
/// path beyond `MAX_SIMULATED_PATHS` turns up, so wide graphs cost no more
/// than the sample they yield.
pub fn enumerate_paths(scenario: &Scenario) -> PathEnumeration {
    let mut collector = PathCollector {
        scenario,
        barren: HashSet::new(),
        out: PathEnumeration::default(),
    };
    let mut path = Vec::new();
    collector.explore(&scenario.entry_step_id, &mut path);
    collector.out
}

// ---------------------------------------------------------------------------
// Path replay
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathResult {
    pub path_id: String,
    pub steps: Vec<String>,
    pub choices: Vec<String>,
    pub final_trust: i32,
    pub final_pressure: i32,
    pub completed_successfully: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub trust_category: TrustCategory,
    pub resistance_score: f64,
    pub traces: Vec<TrustPressureTrace>,
}

fn walk_recorded_path(
    scenario: &Scenario,
    steps: &[String],
    state: &mut ConversationState,
) -> Result<(), ReplayError> {
    let first = steps.first().ok_or(ReplayError::EmptyPath)?;
    if *first != state.current_step_id {
        return Err(ReplayError::NoConnectingEdge {
            from: state.current_step_id.clone(),
            to: first.clone(),
        });
    }
    for next in &steps[1..] {
        state.step_to(scenario, next)?;
    }
    if scenario.get(&state.current_step_id).is_none() {
        return Err(ReplayError::UnknownStep(state.current_step_id.clone()));
    }
    Ok(())
}

/// Replay `steps` from the initial gauges. A path that does not line up with
/// the graph is reported in `PathResult::error`, never as a panic or `Err`.
pub fn replay_path(scenario: &Scenario, steps: &[String]) -> PathResult {
    let mut state = ConversationState::start(scenario);
    let outcome = walk_recorded_path(scenario, steps, &mut state);

    let completed_successfully = outcome.is_ok() && state.is_completed;
    let error = outcome.err().map(|e| format!("Path simulation failed: {e}"));
    if let Some(e) = &error {
        debug!("{}: {}", scenario.id, e);
    }

    PathResult {
        path_id: steps.join("-"),
        steps: steps.to_vec(),
        choices: state.choices.iter().map(|c| c.choice_id.clone()).collect(),
        final_trust: state.trust,
        final_pressure: state.pressure,
        completed_successfully,
        error,
        trust_category: analyze_trust_performance(state.trust).category,
        resistance_score: analyze_pressure_resistance(&state.traces).resistance_score,
        traces: state.traces,
    }
}

// ---------------------------------------------------------------------------
// Scenario simulation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub scenario_id: String,
    /// At least one replayed path completed.
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub paths: Vec<PathResult>,
    /// Paths replayed, at most `MAX_SIMULATED_PATHS`. Everything derived
    /// from it (`reliability_ratio`, `average_steps`) describes the replayed
    /// sample; when `sampling.capped` is set the scenario has more paths than
    /// were checked.
    pub total_paths: usize,
    pub completed_paths: usize,
    pub average_steps: f64,
    #[serde(rename = "executionTimeMs", serialize_with = "as_millis")]
    pub execution_time: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<SamplingNotice>,
}

impl SimulationResult {
    /// Result for a scenario that could not be simulated at all, e.g. a
    /// document that failed to load.
    pub fn failed(scenario_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            scenario_id: scenario_id.into(),
            success: false,
            error: Some(error.into()),
            paths: Vec::new(),
            total_paths: 0,
            completed_paths: 0,
            average_steps: 0.0,
            execution_time: Duration::ZERO,
            sampling: None,
        }
    }

    /// completed / replayed paths, 0 when nothing was replayed.
    pub fn reliability_ratio(&self) -> f64 {
        if self.total_paths == 0 {
            0.0
        } else {
            self.completed_paths as f64 / self.total_paths as f64
        }
    }
}

pub fn simulate(scenario: &Scenario) -> SimulationResult {
    let started = Instant::now();

    if scenario.entry_step().is_none() {
        let mut result = SimulationResult::failed(
            &scenario.id,
            format!(
                "Simulation failed: entry step \"{}\" not found",
                scenario.entry_step_id
            ),
        );
        result.execution_time = started.elapsed();
        return result;
    }

    let enumeration = enumerate_paths(scenario);
    let sampling = enumeration.sampling_notice();
    if let Some(notice) = &sampling {
        let scope = if notice.capped { "first" } else { "all" };
        warn!(
            "{}: replaying {} {} paths ({} branches over {} hops dropped)",
            scenario.id,
            scope,
            notice.sampled_paths,
            notice.depth_truncated,
            MAX_PATH_DEPTH
        );
    }

    let paths: Vec<PathResult> = enumeration
        .paths
        .iter()
        .map(|p| replay_path(scenario, p))
        .collect();

    let total_paths = paths.len();
    let completed_paths = paths.iter().filter(|p| p.completed_successfully).count();
    let average_steps = if total_paths > 0 {
        paths.iter().map(|p| p.steps.len()).sum::<usize>() as f64 / total_paths as f64
    } else {
        0.0
    };
    let error = (completed_paths == 0).then(|| {
        if total_paths == 0 {
            "Simulation failed: no complete paths within the depth ceiling".to_string()
        } else {
            format!("Simulation failed: none of {total_paths} paths reached a terminal step")
        }
    });

    info!(
        "{}: {}/{} paths completed, {:.1} steps on average",
        scenario.id, completed_paths, total_paths, average_steps
    );

    SimulationResult {
        scenario_id: scenario.id.clone(),
        success: completed_paths > 0,
        error,
        paths,
        total_paths,
        completed_paths,
        average_steps,
        execution_time: started.elapsed(),
        sampling,
    }
}

// ---------------------------------------------------------------------------
// Corpus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusReport {
    pub results: Vec<SimulationResult>,
    pub total_scenarios: usize,
    pub successful_scenarios: usize,
    /// Percent of scenarios with `success == true`.
    pub success_rate: f64,
    pub total_completed_paths: usize,
    /// Mean of the per-scenario path lengths.
    pub average_steps: f64,
    /// Successful scenarios whose reliability ratio is under
    /// `LOW_COMPLETION_RATIO`.
    pub low_completion: Vec<String>,
    #[serde(rename = "executionTimeMs", serialize_with = "as_millis")]
    pub execution_time: Duration,
}

impl CorpusReport {
    pub fn from_results(results: Vec<SimulationResult>) -> Self {
        let total_scenarios = results.len();
        let successful_scenarios = results.iter().filter(|r| r.success).count();
        let success_rate = if total_scenarios > 0 {
            successful_scenarios as f64 / total_scenarios as f64 * 100.0
        } else {
            0.0
        };
        let average_steps = if total_scenarios > 0 {
            results.iter().map(|r| r.average_steps).sum::<f64>() / total_scenarios as f64
        } else {
            0.0
        };
        let low_completion = results
            .iter()
            .filter(|r| r.success && r.total_paths > 0 && r.reliability_ratio() < LOW_COMPLETION_RATIO)
            .map(|r| r.scenario_id.clone())
            .collect();

        Self {
            total_scenarios,
            successful_scenarios,
            success_rate,
            total_completed_paths: results.iter().map(|r| r.completed_paths).sum(),
            average_steps,
            low_completion,
            execution_time: results.iter().map(|r| r.execution_time).sum(),
            results,
        }
    }

    /// Whether the corpus clears `threshold` percent.
    pub fn passes(&self, threshold: f64) -> bool {
        self.success_rate >= threshold
    }

    pub fn failures(&self) -> impl Iterator<Item = &SimulationResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

/// Simulate every scenario independently, in parallel. Results keep the
/// input order.
pub fn simulate_corpus(scenarios: &[Scenario]) -> CorpusReport {
    let results = scenarios.par_iter().map(simulate).collect();
    CorpusReport::from_results(results)
}
