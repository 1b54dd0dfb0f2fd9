use std::sync::{Arc, Mutex};

use nova::config::PipelineConfig;
use nova::context::ContextStore;
use nova::emotion::USER_EMOTION_KEY;
use nova::intent::{IntentCandidate, IntentDetector};
use nova::learning::MemoryLearner;
use nova::pipeline::{Pipeline, TurnStatus, TRANSLATION_RETRY_MESSAGE};

fn pipeline() -> Pipeline {
    Pipeline::new(PipelineConfig::default())
}

#[test]
fn greeting_succeeds_with_one_response() {
    let mut p = pipeline();
    let mut ctx = ContextStore::new();

    let outcome = p.process_command("hi", &mut ctx).unwrap();

    assert_eq!(outcome.status, TurnStatus::Success);
    assert_eq!(outcome.responses.len(), 1);
    assert_eq!(outcome.primary_intent().unwrap().intent, "greet");
    assert_eq!(outcome.language, "en");
}

#[test]
fn untranslatable_input_is_a_hard_failure() {
    let mut p = pipeline();
    let mut ctx = ContextStore::new();

    // Devanagari with no dictionary coverage: translation stalls.
    let outcome = p.process_command("नमस्ते दोस्त", &mut ctx).unwrap();

    assert_eq!(outcome.status, TurnStatus::Failure);
    assert!(outcome.intents.is_none(), "failed turn must carry no intents");
    assert_eq!(outcome.responses.len(), 1);
    assert_eq!(outcome.responses[0].speakable(), TRANSLATION_RETRY_MESSAGE);
    assert_eq!(outcome.language, "hi");
}

#[test]
fn translated_hindi_flows_through_to_a_skill() {
    let mut p = pipeline();
    let mut ctx = ContextStore::new();

    let outcome = p.process_command("battery kitni hai", &mut ctx).unwrap();

    assert_eq!(outcome.status, TurnStatus::Success);
    assert_eq!(outcome.language, "hi");
    assert_eq!(outcome.primary_intent().unwrap().intent, "get_battery_status");
}

#[test]
fn compound_command_routes_every_intent() {
    let mut p = pipeline();
    let mut ctx = ContextStore::new();

    let outcome = p
        .process_command("open chrome and play lofi beats", &mut ctx)
        .unwrap();

    assert_eq!(outcome.status, TurnStatus::Success);
    assert_eq!(outcome.responses.len(), 2, "one response per routed intent");
    let names: Vec<&str> = outcome
        .intents
        .as_deref()
        .unwrap()
        .iter()
        .map(|c| c.intent.as_str())
        .collect();
    assert_eq!(names, vec!["open_app", "play_youtube"]);
}

#[test]
fn failure_marker_downgrades_to_not_found() {
    let mut p = pipeline();
    let mut ctx = ContextStore::new();

    // Weather without a city: the skill answers with a "couldn't find"
    // phrasing, which the scan must catch.
    let outcome = p
        .process_command("what is the weather like", &mut ctx)
        .unwrap();

    assert_eq!(outcome.status, TurnStatus::NotFound);
    assert!(!outcome.responses.is_empty());
}

#[test]
fn emotion_signal_is_recorded_every_turn() {
    let mut p = pipeline();
    let mut ctx = ContextStore::new();

    p.process_command("i hate this stupid machine", &mut ctx)
        .unwrap();

    assert_eq!(ctx.get_str(USER_EMOTION_KEY), Some("angry"));
}

#[test]
fn successful_turn_records_pattern_use() {
    let learner = Arc::new(Mutex::new(MemoryLearner::new()));
    let mut p = pipeline().with_learner(learner.clone());
    let mut ctx = ContextStore::new();

    let outcome = p.process_command("play despacito", &mut ctx).unwrap();

    assert_eq!(outcome.status, TurnStatus::Success);
    assert_eq!(
        learner
            .lock()
            .unwrap()
            .pattern_count("play despacito", "play_youtube"),
        1
    );
}

#[test]
fn not_found_turn_records_no_pattern_use() {
    let learner = Arc::new(Mutex::new(MemoryLearner::new()));
    let mut p = pipeline().with_learner(learner.clone());
    let mut ctx = ContextStore::new();

    let outcome = p
        .process_command("what is the weather like", &mut ctx)
        .unwrap();

    assert_eq!(outcome.status, TurnStatus::NotFound);
    assert_eq!(
        learner
            .lock()
            .unwrap()
            .pattern_count("what is the weather like", "get_weather"),
        0,
        "only fully successful turns count toward frequency learning"
    );
}

#[test]
fn explanation_mode_appends_a_justification() {
    let config = PipelineConfig {
        reason_explanation_mode: true,
        ..PipelineConfig::default()
    };
    let mut p = Pipeline::new(config);
    let mut ctx = ContextStore::new();

    let outcome = p.process_command("battery status please", &mut ctx).unwrap();

    assert_eq!(outcome.status, TurnStatus::Success);
    assert_eq!(outcome.responses.len(), 2, "skill reply + explanation");
    assert!(outcome.responses[1].speakable().contains("battery"));
}

#[test]
fn rebound_detector_takes_over_detection() {
    struct EverythingIsGreet;
    impl IntentDetector for EverythingIsGreet {
        fn detect(&self, _text: &str, _ctx: &ContextStore) -> Vec<IntentCandidate> {
            vec![IntentCandidate::new("greet", 1.0)]
        }
    }

    let mut p = pipeline();
    let mut ctx = ContextStore::new();

    let before = p
        .process_command("blorp fizzle snorf quux", &mut ctx)
        .unwrap();
    assert_eq!(before.status, TurnStatus::Fallback);

    p.rebind_detector(Arc::new(EverythingIsGreet));
    let after = p
        .process_command("blorp fizzle snorf quux", &mut ctx)
        .unwrap();
    assert_eq!(after.status, TurnStatus::Success);
    assert_eq!(after.primary_intent().unwrap().intent, "greet");
}

#[test]
fn status_strings_are_stable() {
    assert_eq!(TurnStatus::Success.as_str(), "success");
    assert_eq!(TurnStatus::Fallback.as_str(), "fallback");
    assert_eq!(TurnStatus::NotFound.as_str(), "not_found");
    assert_eq!(TurnStatus::Failure.as_str(), "failure");
    assert_eq!(TurnStatus::Clarify.as_str(), "clarify");
}
