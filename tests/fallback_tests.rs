use std::collections::HashMap;

use serde_json::{json, Value};

use nova::config::PipelineConfig;
use nova::context::ContextStore;
use nova::fallback::ConversationalFallback;
use nova::pipeline::{Pipeline, TurnStatus};

fn pipeline() -> Pipeline {
    Pipeline::new(PipelineConfig::default())
}

fn remembered(ctx: &mut ContextStore, intent: &str, user_text: &str, response: &str) {
    ctx.remember_turn(Some(intent), user_text, response, HashMap::new());
}

#[test]
fn short_vague_reply_nudges_instead_of_searching() {
    let mut p = pipeline();
    let mut ctx = ContextStore::new();
    remembered(&mut ctx, "play_youtube", "play lofi", "Playing lofi on YouTube.");

    let outcome = p.process_command("same again", &mut ctx).unwrap();

    assert_eq!(outcome.status, TurnStatus::Fallback);
    let reply = outcome.responses[0].speakable();
    assert!(reply.contains("do that again"), "got: {reply}");
    assert!(
        !reply.contains("google.com"),
        "short replies must never become web searches"
    );
}

#[test]
fn passive_last_action_offers_a_lookup() {
    let mut p = pipeline();
    let mut ctx = ContextStore::new();
    remembered(&mut ctx, "get_time", "what time is it", "It's noon.");

    let outcome = p.process_command("okay", &mut ctx).unwrap();

    assert_eq!(outcome.status, TurnStatus::Fallback);
    assert!(outcome.responses[0].speakable().contains("look it up"));
}

#[test]
fn long_question_falls_back_to_web_search() {
    let mut p = pipeline();
    let mut ctx = ContextStore::new();

    let outcome = p
        .process_command("how do magnets actually work", &mut ctx)
        .unwrap();

    assert_eq!(outcome.status, TurnStatus::Fallback);
    assert!(outcome.responses[0]
        .speakable()
        .contains("google.com/search?q="));
}

#[test]
fn short_reply_without_history_goes_to_the_responder() {
    let mut p = pipeline();
    let mut ctx = ContextStore::new();

    let outcome = p.process_command("hmm", &mut ctx).unwrap();

    assert_eq!(outcome.status, TurnStatus::Fallback);
    let reply = outcome.responses[0].speakable();
    assert!(reply.contains("Tell me a bit more"), "got: {reply}");
}

#[test]
fn repeat_marker_replays_the_last_action_with_entities() {
    let mut p = pipeline();
    let mut ctx = ContextStore::new();
    let mut entities: HashMap<String, Value> = HashMap::new();
    entities.insert("query".to_string(), json!("lofi"));
    ctx.remember_turn(
        Some("play_youtube"),
        "play lofi",
        "Playing lofi on YouTube.",
        entities,
    );

    let outcome = p.process_command("again", &mut ctx).unwrap();

    assert_eq!(outcome.status, TurnStatus::Success);
    assert_eq!(outcome.primary_intent().unwrap().intent, "play_youtube");
    assert_eq!(outcome.responses[0].speakable(), "Playing lofi on YouTube.");
}

#[test]
fn dangerous_last_action_is_not_replayed() {
    let mut p = pipeline();
    let mut ctx = ContextStore::new();
    remembered(&mut ctx, "lock_system", "lock the system", "Locking the system.");

    let outcome = p.process_command("again", &mut ctx).unwrap();

    assert_eq!(outcome.status, TurnStatus::Fallback);
    assert!(
        outcome.primary_intent().is_none(),
        "a dangerous action must never replay implicitly"
    );
}

#[test]
fn erroring_responder_still_yields_a_reply() {
    struct FailingResponder;
    impl ConversationalFallback for FailingResponder {
        fn reply(&self, _text: &str, _ctx: &mut ContextStore) -> anyhow::Result<Option<String>> {
            anyhow::bail!("responder offline")
        }
    }

    let mut p = pipeline().with_responder(Box::new(FailingResponder));
    let mut ctx = ContextStore::new();

    let outcome = p.process_command("hmm", &mut ctx).unwrap();

    assert_eq!(outcome.status, TurnStatus::Fallback);
    assert_eq!(outcome.responses.len(), 1);
    assert!(
        !outcome.responses[0].speakable().is_empty(),
        "a dead responder must degrade to a fixed line, not silence"
    );
}
