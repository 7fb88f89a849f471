use std::fs;
use std::path::{Path, PathBuf};

use scamshield::audit::audit_corpus;
use scamshield::banlist::LegacyBanlist;
use scamshield::engine::trust_pressure::{PressureZone, TrustZone};
use scamshield::scenario::load_dir;
use scamshield::simulate::{simulate_corpus, CorpusReport, SimulationResult, REQUIRED_SUCCESS_RATE};
use scamshield::{validate, ConversationState, Scenario, StructuralError};

const SHIPPED: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/scenarios");

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("scamshield-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write(dir: &Path, file: &str, content: &str) {
    fs::write(dir.join(file), content).unwrap();
}

const TWO_ENDINGS: &str = r#"{
    "id": "two_endings",
    "title": "Two endings",
    "difficulty": "easy",
    "meta": { "scamType": "romance", "locale": "en-US" },
    "entryStepId": "s1",
    "steps": [
        { "id": "s1", "actor": "scammer", "text": "I need help with a customs fee.",
          "choices": [
            { "id": "c1", "label": "Send the money", "pressureDelta": 5,
              "trustHint": "too_trusting", "nextStepId": "s2" },
            { "id": "c2", "label": "Suggest a video call first", "pressureDelta": -2,
              "trustHint": "appropriate", "nextStepId": "s3" }
          ] },
        { "id": "s2", "actor": "system", "text": "The money is gone.", "terminal": true },
        { "id": "s3", "actor": "system", "text": "They stop replying.", "terminal": true }
    ],
    "debrief": {
        "redFlagPrimary": "Money requested by someone never met",
        "teachingPoints": ["Never send money to online-only contacts", "Insist on a video call"],
        "targetTrustRange": [40, 60]
    }
}"#;

#[test]
fn test_shipped_scenarios_pass_both_gates() {
    let files = load_dir(Path::new(SHIPPED)).unwrap();
    assert!(!files.is_empty());

    let banlist = LegacyBanlist::new().unwrap();
    let mut scenarios = Vec::new();
    for file in files {
        assert!(banlist.check(&file.content).is_empty(), "{}", file.name());
        scenarios.push(file.scenario.unwrap());
    }

    let audit = audit_corpus(&scenarios);
    assert_eq!(audit.passed, audit.total, "{:#?}", audit.results);

    let report = simulate_corpus(&scenarios);
    assert!(report.passes(REQUIRED_SUCCESS_RATE));
    for result in &report.results {
        assert!(result.paths.iter().all(|p| p.error.is_none()), "{}", result.scenario_id);
    }
}

#[test]
fn test_concrete_two_ending_scenario() {
    let scenario = Scenario::from_json(TWO_ENDINGS).unwrap();

    let validation = validate(&scenario).unwrap();
    assert_eq!(validation.reachable_steps, vec!["s1", "s2", "s3"]);
    assert_eq!(validation.terminal_steps, vec!["s2", "s3"]);
    assert!(validation.orphaned_steps.is_empty());
    assert!(validation.has_debrief);

    let mut state = ConversationState::start(&scenario);
    let update = state.choose(&scenario, "c1").unwrap();
    assert_eq!((update.trust, update.pressure), (62, 5));
    assert_eq!(update.pressure_zone, PressureZone::Safe);
    assert_eq!(update.trust_zone, TrustZone::TooHigh);
    assert!(update.should_trigger_haptic);
    assert!(state.is_completed);
}

#[test]
fn test_broken_documents_do_not_block_corpus() {
    let dir = scratch_dir("corpus");
    write(&dir, "a_good.json", TWO_ENDINGS);
    write(&dir, "b_not_json.json", "{ this is not json");
    write(
        &dir,
        "c_dangling.json",
        &TWO_ENDINGS
            .replace("\"two_endings\"", "\"dangling\"")
            .replace("\"nextStepId\": \"s3\"", "\"nextStepId\": \"s9\""),
    );
    write(&dir, "notes.txt", "ignored");

    let files = load_dir(&dir).unwrap();
    assert_eq!(files.len(), 3);
    assert_eq!(files[1].name(), "b_not_json");
    assert!(files[1].scenario.is_err());

    let dangling = files[2].scenario.as_ref().unwrap();
    let failure = validate(dangling).unwrap_err();
    assert!(failure.errors.contains(&StructuralError::MissingChoiceTarget {
        step_id: "s1".into(),
        choice_id: "c2".into(),
        target: "s9".into(),
    }));

    let results: Vec<SimulationResult> = files
        .iter()
        .map(|f| match &f.scenario {
            Ok(s) => scamshield::simulate(s),
            Err(e) => SimulationResult::failed(f.name(), format!("{e:#}")),
        })
        .collect();
    let report = CorpusReport::from_results(results);

    assert_eq!(report.total_scenarios, 3);
    // The dangling scenario still completes through s2.
    assert_eq!(report.successful_scenarios, 2);
    assert_eq!(report.low_completion, vec!["dangling"]);
    assert!(!report.passes(REQUIRED_SUCCESS_RATE));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["results"][1]["scenarioId"], "b_not_json");
    assert_eq!(json["results"][0]["paths"][0]["finalTrust"], 62);

    fs::remove_dir_all(&dir).unwrap();
}
