pub mod debrief;
pub mod trust_pressure;

use log::{debug, trace};
use serde::Serialize;

use crate::error::ReplayError;
use crate::scenario::{Scenario, Step, StepKind};
use trust_pressure::{apply_choice, Effect, Gauges, TrustPressureTrace, TrustPressureUpdate};

// ---------------------------------------------------------------------------
// Conversation state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceRecord {
    pub step_id: String,
    pub choice_id: String,
}

/// One playthrough of a scenario. Owned by whoever drives the conversation;
/// nothing here is shared between playthroughs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    pub scenario_id: String,
    pub current_step_id: String,
    /// Every step entered so far in order, entry step first and the current
    /// step last. A step entered twice appears twice.
    pub visited_steps: Vec<String>,
    pub trust: i32,
    pub pressure: i32,
    pub choices: Vec<ChoiceRecord>,
    pub is_completed: bool,
    pub debrief_ready: bool,
    pub traces: Vec<TrustPressureTrace>,
}

impl ConversationState {
    pub fn start(scenario: &Scenario) -> Self {
        let initial = Gauges::default();
        let mut state = Self {
            scenario_id: scenario.id.clone(),
            current_step_id: scenario.entry_step_id.clone(),
            visited_steps: vec![scenario.entry_step_id.clone()],
            trust: initial.trust,
            pressure: initial.pressure,
            choices: Vec::new(),
            is_completed: false,
            debrief_ready: false,
            traces: Vec::new(),
        };
        state.mark_if_terminal(scenario);
        state
    }

    pub fn gauges(&self) -> Gauges {
        Gauges {
            trust: self.trust,
            pressure: self.pressure,
        }
    }

    pub fn current_step<'a>(&self, scenario: &'a Scenario) -> Result<&'a Step, ReplayError> {
        scenario
            .get(&self.current_step_id)
            .ok_or_else(|| ReplayError::UnknownStep(self.current_step_id.clone()))
    }

    /// Apply the choice `choice_id` of the current step and move to its target.
    pub fn choose(
        &mut self,
        scenario: &Scenario,
        choice_id: &str,
    ) -> Result<TrustPressureUpdate, ReplayError> {
        self.ensure_open()?;
        let step = self.current_step(scenario)?;
        let choice = step.choice(choice_id).ok_or_else(|| ReplayError::UnknownChoice {
            step_id: step.id.clone(),
            choice_id: choice_id.to_string(),
        })?;

        let before = self.gauges();
        let update = apply_choice(before, Effect::from(choice));
        trace!(
            "{}: {} via {} -> trust {} -> {}, pressure {} -> {}",
            self.scenario_id,
            step.id,
            choice.id,
            before.trust,
            update.trust,
            before.pressure,
            update.pressure
        );

        self.traces.push(TrustPressureTrace::new(
            &step.id,
            &choice.id,
            before,
            update.gauges(),
            self.traces.len(),
        ));
        self.choices.push(ChoiceRecord {
            step_id: step.id.clone(),
            choice_id: choice.id.clone(),
        });
        self.trust = update.trust;
        self.pressure = update.pressure;
        self.enter(scenario, &choice.next_step_id);

        Ok(update)
    }

    /// Follow the linear `next` pointer of the current step.
    pub fn advance(&mut self, scenario: &Scenario) -> Result<(), ReplayError> {
        self.ensure_open()?;
        let step = self.current_step(scenario)?;
        match step.kind() {
            StepKind::Linear(next) => {
                self.enter(scenario, next);
                Ok(())
            }
            _ => Err(ReplayError::NotLinear(step.id.clone())),
        }
    }

    /// Take whichever edge of the current step leads to `next_step_id`: the
    /// first matching choice on a branching step, or `next` on a linear one.
    /// Returns the gauge update when a choice was applied.
    pub fn step_to(
        &mut self,
        scenario: &Scenario,
        next_step_id: &str,
    ) -> Result<Option<TrustPressureUpdate>, ReplayError> {
        self.ensure_open()?;
        let step = self.current_step(scenario)?;

        if !step.choices.is_empty() {
            let choice = step
                .choice_to(next_step_id)
                .ok_or_else(|| ReplayError::NoConnectingChoice {
                    from: step.id.clone(),
                    to: next_step_id.to_string(),
                })?;
            let choice_id = choice.id.clone();
            return self.choose(scenario, &choice_id).map(Some);
        }

        if step.next.as_deref() == Some(next_step_id) {
            self.enter(scenario, next_step_id);
            return Ok(None);
        }

        Err(ReplayError::NoConnectingEdge {
            from: step.id.clone(),
            to: next_step_id.to_string(),
        })
    }

    fn ensure_open(&self) -> Result<(), ReplayError> {
        if self.is_completed {
            return Err(ReplayError::AlreadyCompleted(self.current_step_id.clone()));
        }
        Ok(())
    }

    fn enter(&mut self, scenario: &Scenario, step_id: &str) {
        debug!("{}: {} -> {}", self.scenario_id, self.current_step_id, step_id);
        self.current_step_id = step_id.to_string();
        self.visited_steps.push(step_id.to_string());
        self.mark_if_terminal(scenario);
    }

    fn mark_if_terminal(&mut self, scenario: &Scenario) {
        if scenario.get(&self.current_step_id).is_some_and(|s| s.terminal) {
            self.is_completed = true;
            self.debrief_ready = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::tree::fixtures::*;
    use crate::scenario::{Difficulty, TrustHint};

    #[test]
    fn test_start_state() {
        let s = two_endings();
        let state = ConversationState::start(&s);
        assert_eq!(state.trust, 50);
        assert_eq!(state.pressure, 0);
        assert_eq!(state.current_step_id, "s1");
        assert!(!state.is_completed);
    }

    #[test]
    fn test_choose_applies_transition_and_completes() {
        let s = two_endings();
        let mut state = ConversationState::start(&s);
        let update = state.choose(&s, "c1").unwrap();

        assert_eq!((update.trust, update.pressure), (62, 5));
        assert!(update.should_trigger_haptic);
        assert_eq!(state.current_step_id, "s2");
        assert!(state.is_completed && state.debrief_ready);
        assert_eq!(state.visited_steps, vec!["s1", "s2"]);
        assert_eq!(state.traces.len(), 1);
        assert_eq!(state.choices[0].choice_id, "c1");

        assert_eq!(
            state.choose(&s, "c1"),
            Err(ReplayError::AlreadyCompleted("s2".into()))
        );
    }

    #[test]
    fn test_unknown_choice_is_rejected() {
        let s = two_endings();
        let mut state = ConversationState::start(&s);
        assert!(matches!(
            state.choose(&s, "nope"),
            Err(ReplayError::UnknownChoice { .. })
        ));
        assert_eq!(state.trust, 50);
    }

    #[test]
    fn test_advance_follows_linear_next() {
        let s = scenario(
            Difficulty::Easy,
            vec![
                linear("intro", "ask"),
                branch("ask", vec![choice("c1", "end", 3, TrustHint::Appropriate)]),
                terminal("end"),
            ],
        );
        let mut state = ConversationState::start(&s);
        assert_eq!(state.visited_steps, vec!["intro"]);
        state.advance(&s).unwrap();
        assert_eq!(state.current_step_id, "ask");
        assert_eq!(state.visited_steps, vec!["intro", "ask"]);
        assert!(matches!(state.advance(&s), Err(ReplayError::NotLinear(_))));
        assert_eq!(state.visited_steps, vec!["intro", "ask"]);

        assert!(state.step_to(&s, "end").unwrap().is_some());
        assert!(state.is_completed);
        assert_eq!(state.pressure, 3);
        assert_eq!(state.visited_steps.last().map(String::as_str), Some("end"));
    }

    #[test]
    fn test_step_to_rejects_unconnected_target() {
        let s = two_endings();
        let mut state = ConversationState::start(&s);
        assert_eq!(
            state.step_to(&s, "s1"),
            Err(ReplayError::NoConnectingChoice {
                from: "s1".into(),
                to: "s1".into()
            })
        );
    }
}
