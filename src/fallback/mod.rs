use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::context::ContextStore;
use crate::flow::FlowState;

/// Last actions that were "active" operations; the nudge for these
/// offers a re-run instead of a lookup.
pub const ACTIVE_LAST_ACTIONS: &[&str] = &["open_app", "play_youtube", "open_website"];

/// Short-vague-reply nudge, worded by what we just did.
pub fn nudge_for(last_action: &str) -> &'static str {
    if ACTIVE_LAST_ACTIONS.contains(&last_action) {
        "Didn't quite catch that. Say it another way, or should I do that again?"
    } else {
        "Give me a little more detail, or should I look it up for you?"
    }
}

/// Web-search fallback for longer queries. The driver (or a browser
/// skill) owns actually opening the URL; the pipeline reports it.
pub fn web_search_response(query: &str) -> String {
    let encoded = urlencoding::encode(query);
    format!(
        "Searching the web for \"{query}\": https://www.google.com/search?q={encoded}"
    )
}

/// Terminal conversational fallback when nothing else applied.
/// Errors here are soft: the orchestrator falls back to a fixed line.
pub trait ConversationalFallback: Send {
    fn reply(&self, text: &str, ctx: &mut ContextStore) -> anyhow::Result<Option<String>>;
}

/// Template responder: small-talk openers start a conversation flow,
/// everything else gets a gentle catch-all.
pub struct TemplateResponder;

impl ConversationalFallback for TemplateResponder {
    fn reply(&self, text: &str, ctx: &mut ContextStore) -> anyhow::Result<Option<String>> {
        let t = text.trim().to_lowercase();
        if t.contains("how are you") {
            return Ok(Some("I'm doing well, all systems green. How about you?".to_string()));
        }
        if t.contains("talk to me") || t.contains("let's chat") || t.contains("bored") {
            FlowState::Question.store(ctx);
            return Ok(Some("Sure, what's something you enjoyed this week?".to_string()));
        }
        Ok(Some(
            "Hmm, I'm not sure what to do with that. Tell me a bit more and I'll figure it out."
                .to_string(),
        ))
    }
}

const COMPLETION_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Serialize)]
struct CompletionRequest {
    prompt: String,
    stream: bool,
    n_predict: usize,
    temperature: f32,
    stop: Vec<String>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    content: String,
}

/// LLM-backed responder against a local llama-server `/completion`
/// endpoint. Blocking client with a hard timeout: the pipeline is
/// synchronous per utterance and must not hang a turn on the network.
pub struct LlmResponder {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl LlmResponder {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::blocking::Client::builder()
                .timeout(COMPLETION_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url,
        }
    }
}

impl ConversationalFallback for LlmResponder {
    fn reply(&self, text: &str, _ctx: &mut ContextStore) -> anyhow::Result<Option<String>> {
        let system_prompt = "You are a warm, concise voice assistant. Reply in one or two short sentences.";
        let request_body = CompletionRequest {
            prompt: format!("System: {system_prompt}\nUser: {text}\nAssistant:"),
            stream: false,
            n_predict: 64,
            temperature: 0.4,
            stop: vec!["User:".to_string(), "System:".to_string()],
        };

        let response = self
            .client
            .post(format!("{}/completion", self.base_url))
            .json(&request_body)
            .send()?;
        if !response.status().is_success() {
            anyhow::bail!("LLM server error: {}", response.status());
        }
        let parsed: CompletionResponse = response.json()?;
        let content = parsed.content.trim().to_string();
        Ok(if content.is_empty() { None } else { Some(content) })
    }
}
