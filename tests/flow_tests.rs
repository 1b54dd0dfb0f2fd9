use nova::config::PipelineConfig;
use nova::context::ContextStore;
use nova::flow::preempt::ExclusiveMode;
use nova::flow::FlowState;
use nova::pipeline::{Pipeline, TurnStatus};

fn pipeline() -> Pipeline {
    Pipeline::new(PipelineConfig::default())
}

#[test]
fn active_flow_claims_the_turn_before_intents() {
    let mut p = pipeline();
    let mut ctx = ContextStore::new();
    FlowState::Question.store(&mut ctx);

    // Would normally be a media command; the flow gets it first.
    let outcome = p.process_command("play lofi", &mut ctx).unwrap();

    assert_eq!(outcome.status, TurnStatus::Success);
    assert!(outcome.intents.is_none(), "flow turns carry no intents");
    assert!(outcome.responses[0].speakable().contains("What got you into it"));
    assert_eq!(FlowState::read(&ctx), FlowState::FollowUp);
}

#[test]
fn smalltalk_opener_walks_the_full_flow() {
    let mut p = pipeline();
    let mut ctx = ContextStore::new();

    let opener = p.process_command("talk to me", &mut ctx).unwrap();
    assert_eq!(opener.status, TurnStatus::Fallback);
    assert_eq!(FlowState::read(&ctx), FlowState::Question);

    let first = p.process_command("reading", &mut ctx).unwrap();
    assert_eq!(first.status, TurnStatus::Success);
    assert_eq!(FlowState::read(&ctx), FlowState::FollowUp);

    let second = p.process_command("a friend got me into it", &mut ctx).unwrap();
    assert_eq!(second.status, TurnStatus::Success);
    assert_eq!(FlowState::read(&ctx), FlowState::Depth);

    let closing = p.process_command("yes definitely", &mut ctx).unwrap();
    assert_eq!(closing.status, TurnStatus::Success);
    assert_eq!(
        FlowState::read(&ctx),
        FlowState::None,
        "the flow must close after the depth exchange"
    );
}

#[test]
fn disengage_mid_flow_returns_to_commands() {
    let mut p = pipeline();
    let mut ctx = ContextStore::new();
    FlowState::FollowUp.store(&mut ctx);

    let outcome = p.process_command("stop", &mut ctx).unwrap();

    // "stop" carries no intent, so the released turn lands in fallback.
    assert_eq!(outcome.status, TurnStatus::Fallback);
    assert_eq!(FlowState::read(&ctx), FlowState::None);
}

#[test]
fn quiz_session_end_to_end() {
    let mut p = pipeline();
    let mut ctx = ContextStore::new();

    let start = p.process_command("start a quiz", &mut ctx).unwrap();
    assert_eq!(start.status, TurnStatus::Success);
    assert!(start.responses[0].speakable().contains("Quiz time"));

    // While the quiz runs, raw input is an answer, not a command.
    let answer = p.process_command("20", &mut ctx).unwrap();
    assert_eq!(answer.status, TurnStatus::Success);
    assert!(answer.intents.is_none(), "mode turns carry no intents");
    assert!(answer.responses[0].speakable().starts_with("Correct!"));

    let end = p.process_command("stop quiz", &mut ctx).unwrap();
    assert!(end.responses[0].speakable().contains("Quiz over"));

    // Out of the mode: commands route normally again.
    let after = p.process_command("hi", &mut ctx).unwrap();
    assert_eq!(after.primary_intent().unwrap().intent, "greet");
}

#[test]
fn erroring_mode_is_skipped() {
    struct BrokenMode;
    impl ExclusiveMode for BrokenMode {
        fn name(&self) -> &'static str {
            "broken"
        }
        fn is_active(&self, _ctx: &ContextStore) -> bool {
            true
        }
        fn handle(&self, _text: &str, _ctx: &mut ContextStore) -> anyhow::Result<Option<String>> {
            anyhow::bail!("mode crashed")
        }
    }

    let mut p = pipeline();
    p.register_mode(Box::new(BrokenMode));
    let mut ctx = ContextStore::new();

    let outcome = p.process_command("hi", &mut ctx).unwrap();

    assert_eq!(outcome.status, TurnStatus::Success);
    assert_eq!(outcome.primary_intent().unwrap().intent, "greet");
}

#[test]
fn first_claiming_mode_wins() {
    struct CannedMode(&'static str);
    impl ExclusiveMode for CannedMode {
        fn name(&self) -> &'static str {
            "canned"
        }
        fn is_active(&self, ctx: &ContextStore) -> bool {
            ctx.has("canned_mode")
        }
        fn handle(&self, _text: &str, _ctx: &mut ContextStore) -> anyhow::Result<Option<String>> {
            Ok(Some(self.0.to_string()))
        }
    }

    let mut p = pipeline();
    p.register_mode(Box::new(CannedMode("first answer")));
    p.register_mode(Box::new(CannedMode("second answer")));
    let mut ctx = ContextStore::new();
    ctx.set("canned_mode", serde_json::json!(true));

    let outcome = p.process_command("anything at all", &mut ctx).unwrap();

    assert_eq!(outcome.responses[0].speakable(), "first answer");
}
