use serde::Serialize;

use crate::engine::trust_pressure::{TrustPressureTrace, TARGET_TRUST_RANGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustCategory {
    TooTrusting,
    TooSkeptical,
    WellCalibrated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrustAssessment {
    pub category: TrustCategory,
    pub message: String,
    pub recommendation: String,
}

pub fn analyze_trust_performance(final_trust: i32) -> TrustAssessment {
    let (min, max) = TARGET_TRUST_RANGE;

    if final_trust > max {
        TrustAssessment {
            category: TrustCategory::TooTrusting,
            message: format!(
                "You trusted too easily ({final_trust}%). Target range is {min}-{max}%."
            ),
            recommendation:
                "Be more skeptical of urgent requests and verify through official channels."
                    .into(),
        }
    } else if final_trust < min {
        TrustAssessment {
            category: TrustCategory::TooSkeptical,
            message: format!(
                "You were very cautious ({final_trust}% trust). Target range is {min}-{max}%."
            ),
            recommendation: "Some caution is good, but don't miss legitimate communications."
                .into(),
        }
    } else {
        TrustAssessment {
            category: TrustCategory::WellCalibrated,
            message: format!(
                "Excellent trust calibration ({final_trust}%). You're in the optimal range."
            ),
            recommendation: "Keep practicing this balanced approach to build confidence.".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureAction {
    Escalated,
    Resisted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub step: String,
    pub action: PressureAction,
    pub delta: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PressureResistance {
    /// Percentage of choices that did not raise pressure. 50 with no choices.
    pub resistance_score: f64,
    pub message: String,
    pub timeline: Vec<TimelineEntry>,
}

pub fn analyze_pressure_resistance(traces: &[TrustPressureTrace]) -> PressureResistance {
    let timeline: Vec<TimelineEntry> = traces
        .iter()
        .map(|t| TimelineEntry {
            step: t.step_id.clone(),
            action: if t.pressure_after > t.pressure_before {
                PressureAction::Escalated
            } else {
                PressureAction::Resisted
            },
            delta: t.pressure_change(),
        })
        .collect();

    let escalations = timeline
        .iter()
        .filter(|t| t.action == PressureAction::Escalated)
        .count();
    let resistances = timeline.len() - escalations;

    let resistance_score = if timeline.is_empty() {
        50.0
    } else {
        resistances as f64 / timeline.len() as f64 * 100.0
    };

    let message = if resistance_score >= 70.0 {
        format!(
            "Excellent pressure resistance! You resisted {resistances} manipulation attempts vs {escalations} escalations."
        )
    } else if resistance_score >= 40.0 {
        format!(
            "Good pressure awareness. You resisted {resistances} times but fell for {escalations} pressure tactics."
        )
    } else {
        format!(
            "Scammer escalated pressure {escalations} times; you resisted only {resistances} times."
        )
    };

    PressureResistance {
        resistance_score,
        message,
        timeline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::trust_pressure::Gauges;

    fn trace(step: &str, before: i32, after: i32) -> TrustPressureTrace {
        TrustPressureTrace::new(
            step,
            "c",
            Gauges { trust: 50, pressure: before },
            Gauges { trust: 50, pressure: after },
            0,
        )
    }

    #[test]
    fn test_trust_categories() {
        assert_eq!(analyze_trust_performance(61).category, TrustCategory::TooTrusting);
        assert_eq!(analyze_trust_performance(39).category, TrustCategory::TooSkeptical);
        assert_eq!(analyze_trust_performance(40).category, TrustCategory::WellCalibrated);
        assert!(analyze_trust_performance(74).message.contains("74%"));
    }

    #[test]
    fn test_resistance_without_traces_is_neutral() {
        let r = analyze_pressure_resistance(&[]);
        assert_eq!(r.resistance_score, 50.0);
        assert!(r.timeline.is_empty());
    }

    #[test]
    fn test_resistance_counts_flat_as_resisted() {
        let traces = vec![trace("s1", 0, 10), trace("s2", 10, 10), trace("s3", 10, 4)];
        let r = analyze_pressure_resistance(&traces);
        assert!((r.resistance_score - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(r.timeline[0].action, PressureAction::Escalated);
        assert_eq!(r.timeline[1].action, PressureAction::Resisted);
        assert_eq!(r.timeline[2].delta, -6);
        assert!(r.message.starts_with("Good pressure awareness"));
    }

    #[test]
    fn test_resistance_message_buckets() {
        let low = analyze_pressure_resistance(&[trace("s1", 0, 5), trace("s2", 5, 9)]);
        assert_eq!(low.resistance_score, 0.0);
        assert!(low.message.starts_with("Scammer escalated pressure 2 times"));

        let high = analyze_pressure_resistance(&[trace("s1", 9, 5)]);
        assert!(high.message.starts_with("Excellent pressure resistance!"));
    }
}
