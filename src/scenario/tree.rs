use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::scenario::step::Step;

/// Authoring difficulty. Bounds how many choices a single step may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Maximum number of choices a single step may carry.
    pub fn max_choices(self) -> usize {
        match self {
            Difficulty::Easy => 3,
            Difficulty::Medium => 5,
            Difficulty::Hard => 7,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioMeta {
    pub scam_type: String,
    pub locale: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub a11y_hints: Vec<String>,
}

/// Teaching material shown once the player reaches a terminal step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debrief {
    pub red_flag_primary: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub red_flag_secondary: Vec<String>,
    pub teaching_points: Vec<String>,
    /// Kept as a list so a malformed range surfaces in the audit instead of
    /// failing to parse.
    pub target_trust_range: Vec<i32>,
}

/// One authored branching narrative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub meta: ScenarioMeta,
    pub entry_step_id: String,
    pub steps: Vec<Step>,
    pub debrief: Debrief,
}

impl Scenario {
    pub fn get(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn entry_step(&self) -> Option<&Step> {
        self.get(&self.entry_step_id)
    }

    /// Lookup table of step id -> step. When ids collide the first step wins.
    pub fn step_index(&self) -> HashMap<&str, &Step> {
        let mut index = HashMap::with_capacity(self.steps.len());
        for step in &self.steps {
            index.entry(step.id.as_str()).or_insert(step);
        }
        index
    }

    pub fn step_ids(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.id.as_str())
    }

    pub fn total_choices(&self) -> usize {
        self.steps.iter().map(|s| s.choices.len()).sum()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::scenario::step::{Actor, Choice, TrustHint};

    pub fn choice(id: &str, next: &str, delta: i32, hint: TrustHint) -> Choice {
        Choice {
            id: id.into(),
            label: format!("choice {id}"),
            pressure_delta: delta,
            trust_hint: hint,
            next_step_id: next.into(),
            flags: vec![],
        }
    }

    pub fn branch(id: &str, choices: Vec<Choice>) -> Step {
        Step {
            id: id.into(),
            actor: Actor::Scammer,
            text: format!("text for {id}"),
            choices,
            next: None,
            terminal: false,
        }
    }

    pub fn linear(id: &str, next: &str) -> Step {
        Step {
            id: id.into(),
            actor: Actor::Ally,
            text: format!("text for {id}"),
            choices: vec![],
            next: Some(next.into()),
            terminal: false,
        }
    }

    pub fn terminal(id: &str) -> Step {
        Step {
            id: id.into(),
            actor: Actor::System,
            text: format!("text for {id}"),
            choices: vec![],
            next: None,
            terminal: true,
        }
    }

    pub fn scenario(difficulty: Difficulty, steps: Vec<Step>) -> Scenario {
        Scenario {
            id: "test_scenario".into(),
            title: "Test scenario".into(),
            difficulty,
            meta: ScenarioMeta {
                scam_type: "bank_impersonation".into(),
                locale: "en-US".into(),
                a11y_hints: vec![],
            },
            entry_step_id: steps.first().map(|s| s.id.clone()).unwrap_or_default(),
            steps,
            debrief: Debrief {
                red_flag_primary: "Unsolicited request for a one-time code".into(),
                red_flag_secondary: vec![],
                teaching_points: vec![
                    "Banks never ask for codes".into(),
                    "Hang up and call back".into(),
                ],
                target_trust_range: vec![40, 60],
            },
        }
    }

    /// `levels` decision steps `l0..`, each offering `width` choices into
    /// its own linear step `m{level}_{k}` that rejoins at the next level;
    /// `l{levels}` is terminal. `width^levels` distinct paths over only
    /// `levels * (width + 1) + 1` steps.
    pub fn converging_levels(levels: usize, width: usize) -> Scenario {
        let mut steps = Vec::new();
        for level in 0..levels {
            let next = format!("l{}", level + 1);
            steps.push(branch(
                &format!("l{level}"),
                (0..width)
                    .map(|k| {
                        let hint = if k % 2 == 0 {
                            TrustHint::Appropriate
                        } else {
                            TrustHint::TooTrusting
                        };
                        choice(&format!("c{k}"), &format!("m{level}_{k}"), 1, hint)
                    })
                    .collect(),
            ));
            steps.extend((0..width).map(|k| linear(&format!("m{level}_{k}"), &next)));
        }
        steps.push(terminal(&format!("l{levels}")));
        scenario(Difficulty::Hard, steps)
    }

    /// `s1` branches to two terminals: c1 -> s2 (+5, too trusting),
    /// c2 -> s3 (-2, appropriate).
    pub fn two_endings() -> Scenario {
        scenario(
            Difficulty::Easy,
            vec![
                branch(
                    "s1",
                    vec![
                        choice("c1", "s2", 5, TrustHint::TooTrusting),
                        choice("c2", "s3", -2, TrustHint::Appropriate),
                    ],
                ),
                terminal("s2"),
                terminal("s3"),
            ],
        )
    }
}
