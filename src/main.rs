use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use nova::config::PipelineConfig;
use nova::context::ContextStore;
use nova::emotion::USER_EMOTION_KEY;
use nova::pipeline::{Pipeline, TurnOutcome};
use nova::router::Tone;

const DEFLECTION_LINE: &str = "Okay, I'll keep things quiet for now.";

/// Never echo user input back as the response (confusing over TTS).
fn echoes_input(user: &str, response: &str) -> bool {
    let user = user.trim().to_lowercase();
    let response = response.trim().to_lowercase();
    if user.is_empty() {
        return false;
    }
    response == user || (response.contains(&user) && response.len() < user.len() + 100)
}

/// Tone for the speaker: story hint overrides, then emotion, then the
/// intent family of the last candidate.
fn select_tone(outcome: &TurnOutcome, ctx: &ContextStore) -> Tone {
    if outcome.responses.iter().any(|r| r.tone() == Some(Tone::Story)) {
        return Tone::Story;
    }
    match ctx.get_str(USER_EMOTION_KEY) {
        Some("angry") => return Tone::Calm,
        Some("frustrated") => return Tone::Supportive,
        Some("sleepy") => return Tone::Soft,
        _ => {}
    }
    if let Some(last) = outcome.intents.as_deref().and_then(|c| c.last()) {
        let name = last.intent.as_str();
        if ["time", "date", "greet", "joke", "reminder", "email"]
            .iter()
            .any(|k| name.contains(k))
        {
            return Tone::Success;
        }
        if ["exit", "shutdown", "restart", "lock"]
            .iter()
            .any(|k| name.contains(k))
        {
            return Tone::Notify;
        }
    }
    outcome
        .responses
        .iter()
        .find_map(|r| r.tone())
        .unwrap_or(Tone::Default)
}

/// Non-blocking: one recognized phrase, merging continuations
/// ("open" then "chrome") into a single command within the window.
async fn drain_with_continuation(
    rx: &mut mpsc::Receiver<String>,
    window: Duration,
) -> Option<String> {
    let first = rx.try_recv().ok()?;
    let mut parts = vec![first.trim().to_string()];
    loop {
        match tokio::time::timeout(window, rx.recv()).await {
            Ok(Some(more)) if !more.trim().is_empty() => parts.push(more.trim().to_string()),
            _ => break,
        }
    }
    Some(parts.join(" "))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("Nova session booting...");

    let config = PipelineConfig::load_or_default(Path::new("nova.toml"));
    let continuation_window = Duration::from_millis(config.continuation_window_ms);

    // Listener: stdin lines stand in for the STT front end. Dedicated
    // thread so reads never block the session loop.
    let (input_tx, mut input_rx) = mpsc::channel::<String>(100);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            if input_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    // Speaker: dedicated task; prints and optionally spawns the
    // external TTS command so playback never blocks the next turn.
    let (speak_tx, mut speak_rx) = mpsc::channel::<(String, Tone)>(100);
    let speak_command = config.speak_command.clone();
    let speaker = tokio::spawn(async move {
        while let Some((text, tone)) = speak_rx.recv().await {
            println!("Nova [{}]: {}", tone.as_str(), text);
            if let Some(cmd) = &speak_command {
                match tokio::process::Command::new(cmd)
                    .arg(&text)
                    .kill_on_drop(true)
                    .spawn()
                {
                    Ok(mut child) => {
                        let _ = child.wait().await;
                    }
                    Err(e) => tracing::warn!("failed to spawn speaker '{cmd}': {e}"),
                }
            }
        }
    });

    let mut pipeline = Pipeline::new(config);
    let mut context = ContextStore::new();

    let mut cadence = tokio::time::interval(Duration::from_millis(50));
    cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!("Nova session active. Type a command (Ctrl+C to stop).");

    'session: loop {
        cadence.tick().await;

        let Some(text) = drain_with_continuation(&mut input_rx, continuation_window).await else {
            continue;
        };
        println!("You: {text}");

        // The pipeline is synchronous per utterance; run it off the
        // async loop so the listener and speaker stay live.
        let (p, c, result, text) = tokio::task::spawn_blocking(move || {
            let mut pipeline = pipeline;
            let mut context = context;
            let result = pipeline.process_command(&text, &mut context);
            (pipeline, context, result, text)
        })
        .await?;
        pipeline = p;
        context = c;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("turn failed: {e}");
                continue;
            }
        };

        if !outcome.responses.is_empty() {
            let mut full_response = outcome.combined_speech();
            if echoes_input(&text, &full_response) {
                full_response = DEFLECTION_LINE.to_string();
            }

            let tone = select_tone(&outcome, &context);
            let last = outcome.intents.as_deref().and_then(|c| c.last());
            let intent_name = last.map(|c| c.intent.clone());
            let entities: HashMap<String, Value> =
                last.map(|c| c.entities.clone()).unwrap_or_default();
            context.remember_turn(intent_name.as_deref(), &text, &full_response, entities);

            tracing::info!(status = %outcome.status, lang = %outcome.language, "turn complete");
            if speak_tx.send((full_response, tone)).await.is_err() {
                break 'session;
            }
        }

        if outcome.has_intent("exit") {
            // Let the farewell drain before the process goes away.
            drop(speak_tx);
            let _ = speaker.await;
            tracing::info!("Exiting on user command.");
            return Ok(());
        }
    }

    Ok(())
}
