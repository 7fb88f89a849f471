use serde::Serialize;

use crate::scenario::{Choice, TrustHint};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Trust band a well-calibrated player stays inside.
pub const TARGET_TRUST_RANGE: (i32, i32) = (40, 60);

pub const INITIAL_TRUST: i32 = 50;
pub const INITIAL_PRESSURE: i32 = 0;

pub const GAUGE_MIN: i32 = 0;
pub const GAUGE_MAX: i32 = 100;

pub const MIN_PRESSURE_DELTA: i32 = -15;
pub const MAX_PRESSURE_DELTA: i32 = 15;

/// Over-trusting is penalized harder than over-caution.
pub const TOO_TRUSTING_STEP: i32 = 12;
pub const TOO_SKEPTICAL_STEP: i32 = 8;
pub const APPROPRIATE_NUDGE: i32 = 3;

/// Minimum actual pressure rise that fires a haptic pulse.
pub const HAPTIC_PRESSURE_RISE: i32 = 5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Gauges {
    pub trust: i32,
    pub pressure: i32,
}

impl Default for Gauges {
    fn default() -> Self {
        Self {
            trust: INITIAL_TRUST,
            pressure: INITIAL_PRESSURE,
        }
    }
}

/// The part of a choice that moves the gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effect {
    pub pressure_delta: i32,
    pub trust_hint: TrustHint,
}

impl From<&Choice> for Effect {
    fn from(choice: &Choice) -> Self {
        Self {
            pressure_delta: choice.pressure_delta,
            trust_hint: choice.trust_hint,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustZone {
    TooLow,
    Optimal,
    TooHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureZone {
    Safe,
    Caution,
    Danger,
    Critical,
}

/// Outcome of applying one choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustPressureUpdate {
    pub trust: i32,
    pub pressure: i32,
    pub trust_zone: TrustZone,
    pub pressure_zone: PressureZone,
    pub trust_feedback: String,
    pub pressure_feedback: String,
    pub should_trigger_haptic: bool,
}

impl TrustPressureUpdate {
    pub fn gauges(&self) -> Gauges {
        Gauges {
            trust: self.trust,
            pressure: self.pressure,
        }
    }
}

/// Before/after gauges for one step + choice pair. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustPressureTrace {
    pub step_id: String,
    pub choice_id: String,
    pub trust_before: i32,
    pub trust_after: i32,
    pub pressure_before: i32,
    pub pressure_after: i32,
    /// Position of this entry in its playthrough, starting at 0.
    pub sequence: usize,
}

impl TrustPressureTrace {
    pub fn new(
        step_id: impl Into<String>,
        choice_id: impl Into<String>,
        before: Gauges,
        after: Gauges,
        sequence: usize,
    ) -> Self {
        Self {
            step_id: step_id.into(),
            choice_id: choice_id.into(),
            trust_before: before.trust,
            trust_after: after.trust,
            pressure_before: before.pressure,
            pressure_after: after.pressure,
            sequence,
        }
    }

    pub fn pressure_change(&self) -> i32 {
        self.pressure_after - self.pressure_before
    }
}

// ---------------------------------------------------------------------------
// Transition function
// ---------------------------------------------------------------------------

pub fn clamp_pressure_delta(delta: i32) -> i32 {
    delta.clamp(MIN_PRESSURE_DELTA, MAX_PRESSURE_DELTA)
}

pub fn trust_zone(trust: i32) -> TrustZone {
    let (min, max) = TARGET_TRUST_RANGE;
    if trust < min {
        TrustZone::TooLow
    } else if trust > max {
        TrustZone::TooHigh
    } else {
        TrustZone::Optimal
    }
}

pub fn pressure_zone(pressure: i32) -> PressureZone {
    match pressure {
        p if p <= 30 => PressureZone::Safe,
        p if p <= 60 => PressureZone::Caution,
        p if p <= 80 => PressureZone::Danger,
        _ => PressureZone::Critical,
    }
}

fn next_trust(trust: i32, hint: TrustHint) -> i32 {
    let (min, max) = TARGET_TRUST_RANGE;
    match hint {
        TrustHint::TooTrusting => (trust + TOO_TRUSTING_STEP).min(GAUGE_MAX),
        TrustHint::TooSkeptical => (trust - TOO_SKEPTICAL_STEP).max(GAUGE_MIN),
        // Nudge toward the target band without overshooting its far edge.
        TrustHint::Appropriate if trust < min => (trust + APPROPRIATE_NUDGE).min(max),
        TrustHint::Appropriate if trust > max => (trust - APPROPRIATE_NUDGE).max(min),
        TrustHint::Appropriate => trust,
    }
}

/// Apply one choice to the current gauges. Total over its input domain.
pub fn apply_choice(state: Gauges, effect: Effect) -> TrustPressureUpdate {
    let delta = clamp_pressure_delta(effect.pressure_delta);
    let pressure = (state.pressure + delta).clamp(GAUGE_MIN, GAUGE_MAX);
    let trust = next_trust(state.trust, effect.trust_hint);

    let trust_zone = trust_zone(trust);
    let pressure_zone = pressure_zone(pressure);

    TrustPressureUpdate {
        trust,
        pressure,
        trust_zone,
        pressure_zone,
        trust_feedback: trust_feedback(trust, trust_zone, effect.trust_hint),
        pressure_feedback: pressure_feedback(pressure, pressure_zone, delta),
        // A delta swallowed by the 0/100 clamp is not a rise.
        should_trigger_haptic: pressure - state.pressure >= HAPTIC_PRESSURE_RISE,
    }
}

// ---------------------------------------------------------------------------
// Feedback text
// ---------------------------------------------------------------------------

fn trust_feedback(trust: i32, zone: TrustZone, hint: TrustHint) -> String {
    match (zone, hint) {
        (TrustZone::TooHigh, TrustHint::TooTrusting) => "You're trusting too easily".into(),
        (TrustZone::TooHigh, _) => format!("Trust level high ({trust}%)"),
        (TrustZone::TooLow, TrustHint::TooSkeptical) => "Healthy skepticism".into(),
        (TrustZone::TooLow, _) => format!("Trust level low ({trust}%)"),
        (TrustZone::Optimal, TrustHint::Appropriate) => "Good judgment".into(),
        (TrustZone::Optimal, _) => format!("On target ({trust}%)"),
    }
}

/// Large swings are reported as such; otherwise the zone picks the wording.
fn pressure_feedback(pressure: i32, zone: PressureZone, delta: i32) -> String {
    if delta >= HAPTIC_PRESSURE_RISE {
        return format!("Pressure spike: {pressure}% (+{delta})");
    }
    if delta <= -HAPTIC_PRESSURE_RISE {
        return format!("Pressure reduced: {pressure}% ({delta})");
    }
    match zone {
        PressureZone::Critical => format!("High pressure: {pressure}%"),
        PressureZone::Danger => format!("Pressure building: {pressure}%"),
        PressureZone::Caution => format!("Moderate pressure: {pressure}%"),
        PressureZone::Safe => format!("Low pressure: {pressure}%"),
    }
}
