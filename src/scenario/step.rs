use serde::{Deserialize, Serialize};

/// Who is speaking in a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    Scammer,
    Ally,
    System,
}

/// Direction a choice pushes the player's trust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustHint {
    TooTrusting,
    Appropriate,
    TooSkeptical,
}

/// A single edge out of a branching step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub id: String,
    /// Button text shown to the player.
    pub label: String,
    /// Authored in -15..=15; the validator rejects anything outside that.
    pub pressure_delta: i32,
    pub trust_hint: TrustHint,
    /// ID of an existing step.
    pub next_step_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
}

/// A single node in the scenario graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Unique identifier for this step (e.g. "s1", "bank_call", "debrief").
    pub id: String,
    pub actor: Actor,
    /// The message displayed when the conversation reaches this step.
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    /// Linear continuation, used when the step offers no choices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub terminal: bool,
}

/// Structural shape of a step. A well-formed step is exactly one of
/// `Branch`, `Linear` or `Terminal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind<'a> {
    Branch(&'a [Choice]),
    Linear(&'a str),
    Terminal,
    /// No outgoing edge and not marked terminal.
    DeadEnd,
    /// More than one shape at once (choices plus next, or terminal with edges).
    Ambiguous,
}

impl Step {
    pub fn kind(&self) -> StepKind<'_> {
        let has_choices = !self.choices.is_empty();
        match (has_choices, self.next.as_deref(), self.terminal) {
            (true, None, false) => StepKind::Branch(&self.choices),
            (false, Some(next), false) => StepKind::Linear(next),
            (false, None, true) => StepKind::Terminal,
            (false, None, false) => StepKind::DeadEnd,
            _ => StepKind::Ambiguous,
        }
    }

    pub fn choice(&self, choice_id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == choice_id)
    }

    /// First choice leading to `next_step_id`, if any.
    pub fn choice_to(&self, next_step_id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.next_step_id == next_step_id)
    }

    /// Every step id this step points at, choices first.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.choices
            .iter()
            .map(|c| c.next_step_id.as_str())
            .chain(self.next.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(choices: Vec<Choice>, next: Option<&str>, terminal: bool) -> Step {
        Step {
            id: "s".into(),
            actor: Actor::Scammer,
            text: "hi".into(),
            choices,
            next: next.map(Into::into),
            terminal,
        }
    }

    fn choice(id: &str, next: &str) -> Choice {
        Choice {
            id: id.into(),
            label: id.into(),
            pressure_delta: 0,
            trust_hint: TrustHint::Appropriate,
            next_step_id: next.into(),
            flags: vec![],
        }
    }

    #[test]
    fn test_step_kind_shapes() {
        assert!(matches!(step(vec![choice("c1", "a")], None, false).kind(), StepKind::Branch(c) if c.len() == 1));
        assert_eq!(step(vec![], Some("a"), false).kind(), StepKind::Linear("a"));
        assert_eq!(step(vec![], None, true).kind(), StepKind::Terminal);
        assert_eq!(step(vec![], None, false).kind(), StepKind::DeadEnd);
        assert_eq!(step(vec![choice("c1", "a")], Some("b"), false).kind(), StepKind::Ambiguous);
        assert_eq!(step(vec![], Some("b"), true).kind(), StepKind::Ambiguous);
    }

    #[test]
    fn test_step_kind_compares_branch_choices() {
        let choices = vec![choice("c1", "a"), choice("c2", "b")];
        let s = step(choices.clone(), None, false);
        assert_eq!(s.kind(), StepKind::Branch(&choices));
        assert_ne!(s.kind(), StepKind::Branch(&choices[..1]));
    }

    #[test]
    fn test_choice_lookup_and_targets() {
        let s = step(vec![choice("c1", "a"), choice("c2", "b")], None, false);
        assert_eq!(s.choice_to("b").map(|c| c.id.as_str()), Some("c2"));
        assert!(s.choice("c3").is_none());
        assert_eq!(s.targets().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_deserialize_choice_json() {
        let raw = r#"{"id":"c1","label":"Call the bank","pressureDelta":-4,
            "trustHint":"too_skeptical","nextStepId":"s2"}"#;
        let c: Choice = serde_json::from_str(raw).unwrap();
        assert_eq!(c.pressure_delta, -4);
        assert_eq!(c.trust_hint, TrustHint::TooSkeptical);
        assert!(c.flags.is_empty());
    }
}
