//! Built-in skill handlers. These are small stand-ins for the external
//! skill collaborators (battery, todo, news, app launching live outside
//! the pipeline); they exist to exercise the router seam and the
//! failure-marker contract with realistic responses.

use chrono::Local;
use serde_json::{json, Value};

use crate::context::ContextStore;
use crate::flow::preempt::{QUIZ_INDEX_KEY, QUIZ_QUESTIONS};
use crate::intent::IntentCandidate;
use crate::learning::PendingCorrection;
use crate::router::{CommandRouter, SkillHandler, SkillResponse, Tone};

/// Canned one-liner, optionally with a delivery hint.
pub struct FixedReply {
    line: &'static str,
    tone: Option<Tone>,
}

impl FixedReply {
    pub fn new(line: &'static str) -> Self {
        Self { line, tone: None }
    }

    pub fn with_tone(line: &'static str, tone: Tone) -> Self {
        Self {
            line,
            tone: Some(tone),
        }
    }
}

impl SkillHandler for FixedReply {
    fn handle(
        &self,
        _intent: &IntentCandidate,
        _text: &str,
        _ctx: &mut ContextStore,
    ) -> anyhow::Result<Option<SkillResponse>> {
        Ok(Some(match self.tone {
            Some(tone) => SkillResponse::with_tone(self.line, tone),
            None => SkillResponse::text(self.line),
        }))
    }
}

struct TimeSkill;

impl SkillHandler for TimeSkill {
    fn handle(
        &self,
        _intent: &IntentCandidate,
        _text: &str,
        _ctx: &mut ContextStore,
    ) -> anyhow::Result<Option<SkillResponse>> {
        let now = Local::now();
        Ok(Some(SkillResponse::text(format!(
            "It's {}.",
            now.format("%I:%M %p")
        ))))
    }
}

struct DateSkill;

impl SkillHandler for DateSkill {
    fn handle(
        &self,
        _intent: &IntentCandidate,
        _text: &str,
        _ctx: &mut ContextStore,
    ) -> anyhow::Result<Option<SkillResponse>> {
        let today = Local::now();
        Ok(Some(SkillResponse::text(format!(
            "Today is {}.",
            today.format("%A, %d %B %Y")
        ))))
    }
}

/// Reads `battery_percent` from context when the driver publishes it.
struct BatterySkill;

impl SkillHandler for BatterySkill {
    fn handle(
        &self,
        _intent: &IntentCandidate,
        _text: &str,
        ctx: &mut ContextStore,
    ) -> anyhow::Result<Option<SkillResponse>> {
        let percent = ctx
            .get("battery_percent")
            .and_then(Value::as_u64)
            .unwrap_or(80);
        Ok(Some(SkillResponse::text(format!(
            "Battery is at {percent} percent."
        ))))
    }
}

/// Summarizes the `todo_items` array kept in context by the todo store.
struct TodoSkill;

impl SkillHandler for TodoSkill {
    fn handle(
        &self,
        _intent: &IntentCandidate,
        _text: &str,
        ctx: &mut ContextStore,
    ) -> anyhow::Result<Option<SkillResponse>> {
        let items: Vec<String> = ctx
            .get("todo_items")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let reply = if items.is_empty() {
            "Your todo list is clear.".to_string()
        } else {
            format!("You have {} pending: {}.", items.len(), items.join(", "))
        };
        Ok(Some(SkillResponse::text(reply)))
    }
}

struct WeatherSkill;

impl SkillHandler for WeatherSkill {
    fn handle(
        &self,
        intent: &IntentCandidate,
        _text: &str,
        _ctx: &mut ContextStore,
    ) -> anyhow::Result<Option<SkillResponse>> {
        Ok(Some(match intent.entity_str("city") {
            Some(city) => SkillResponse::text(format!("Checking the forecast for {city}.")),
            None => SkillResponse::text("Couldn't find a city in that. Which city do you mean?"),
        }))
    }
}

struct PlayMediaSkill;

impl SkillHandler for PlayMediaSkill {
    fn handle(
        &self,
        intent: &IntentCandidate,
        _text: &str,
        _ctx: &mut ContextStore,
    ) -> anyhow::Result<Option<SkillResponse>> {
        Ok(Some(match intent.entity_str("query").filter(|q| !q.is_empty()) {
            Some(query) => SkillResponse::text(format!("Playing {query} on YouTube.")),
            None => SkillResponse::text("Couldn't find anything to play. What should I put on?"),
        }))
    }
}

struct OpenAppSkill;

impl SkillHandler for OpenAppSkill {
    fn handle(
        &self,
        intent: &IntentCandidate,
        _text: &str,
        _ctx: &mut ContextStore,
    ) -> anyhow::Result<Option<SkillResponse>> {
        Ok(Some(match intent.entity_str("app").filter(|a| !a.is_empty()) {
            Some(app) => SkillResponse::text(format!("Opening {app}.")),
            None => SkillResponse::text("Couldn't find that app."),
        }))
    }
}

struct OpenWebsiteSkill;

impl SkillHandler for OpenWebsiteSkill {
    fn handle(
        &self,
        intent: &IntentCandidate,
        _text: &str,
        _ctx: &mut ContextStore,
    ) -> anyhow::Result<Option<SkillResponse>> {
        Ok(Some(match intent.entity_str("site").filter(|s| !s.is_empty()) {
            Some(site) => SkillResponse::text(format!("Opening {site} in your browser.")),
            None => SkillResponse::text("Couldn't find that website."),
        }))
    }
}

struct WifiSkill {
    enable: bool,
}

impl SkillHandler for WifiSkill {
    fn handle(
        &self,
        _intent: &IntentCandidate,
        _text: &str,
        _ctx: &mut ContextStore,
    ) -> anyhow::Result<Option<SkillResponse>> {
        let line = if self.enable {
            "Turning Wi-Fi on."
        } else {
            "Turning Wi-Fi off."
        };
        Ok(Some(SkillResponse::text(line)))
    }
}

struct ReminderSkill;

impl SkillHandler for ReminderSkill {
    fn handle(
        &self,
        intent: &IntentCandidate,
        _text: &str,
        _ctx: &mut ContextStore,
    ) -> anyhow::Result<Option<SkillResponse>> {
        Ok(Some(match intent.entity_str("when") {
            Some(when) => SkillResponse::text(format!("Reminder set for {when}.")),
            None => SkillResponse::text("Reminder noted. I'll nudge you."),
        }))
    }
}

/// User flagged the previous action as wrong: arm a pending correction
/// so the next resolvable intent becomes a training pair.
struct FlagWrongSkill;

impl SkillHandler for FlagWrongSkill {
    fn handle(
        &self,
        _intent: &IntentCandidate,
        _text: &str,
        ctx: &mut ContextStore,
    ) -> anyhow::Result<Option<SkillResponse>> {
        let last = ctx
            .last_action_turn()
            .map(|t| (t.user_text.clone(), t.intent.clone()));
        Ok(Some(match last {
            Some((user_text, wrong_intent)) => {
                PendingCorrection {
                    user_text,
                    wrong_intent,
                }
                .store(ctx);
                SkillResponse::text("My bad, what should I have done?")
            }
            None => SkillResponse::text("I don't have a recent action to correct."),
        }))
    }
}

/// Kicks off quiz mode; subsequent turns are claimed by `QuizMode`.
struct QuizStartSkill;

impl SkillHandler for QuizStartSkill {
    fn handle(
        &self,
        _intent: &IntentCandidate,
        _text: &str,
        ctx: &mut ContextStore,
    ) -> anyhow::Result<Option<SkillResponse>> {
        ctx.set(QUIZ_INDEX_KEY, json!(0));
        let (question, _) = QUIZ_QUESTIONS[0];
        Ok(Some(SkillResponse::text(format!(
            "Quiz time! First one: {question}"
        ))))
    }
}

struct StorySkill;

impl SkillHandler for StorySkill {
    fn handle(
        &self,
        _intent: &IntentCandidate,
        _text: &str,
        _ctx: &mut ContextStore,
    ) -> anyhow::Result<Option<SkillResponse>> {
        Ok(Some(SkillResponse::with_tone(
            "Once there was a little satellite that was afraid of the dark, \
             until it learned it carried its own light.",
            Tone::Story,
        )))
    }
}

/// The default dispatch table: every intent the rule detector can emit
/// has a handler here.
pub fn default_router() -> CommandRouter {
    let mut router = CommandRouter::new();
    router.register("greet", Box::new(FixedReply::new("Hello! How can I help?")));
    router.register(
        "good_night",
        Box::new(FixedReply::with_tone("Good night. Sleep well.", Tone::Soft)),
    );
    router.register(
        "exit",
        Box::new(FixedReply::with_tone("Goodbye! Shutting down.", Tone::Notify)),
    );
    router.register("appreciation", Box::new(FixedReply::new("Anytime!")));
    router.register(
        "graceful_end",
        Box::new(FixedReply::new("Alright, I'm here if you need me.")),
    );
    router.register(
        "tell_joke",
        Box::new(FixedReply::new(
            "Why do programmers prefer dark mode? Because light attracts bugs.",
        )),
    );
    router.register(
        "get_news",
        Box::new(FixedReply::new(
            "Top headlines: markets steady, light rain expected tomorrow.",
        )),
    );
    router.register(
        "lock_system",
        Box::new(FixedReply::with_tone("Locking the system.", Tone::Notify)),
    );
    router.register(
        "clear_recycle_bin",
        Box::new(FixedReply::new("Recycle bin cleared.")),
    );
    router.register("get_time", Box::new(TimeSkill));
    router.register("get_date", Box::new(DateSkill));
    router.register("get_battery_status", Box::new(BatterySkill));
    router.register("show_todo_list", Box::new(TodoSkill));
    router.register("get_weather", Box::new(WeatherSkill));
    router.register("play_youtube", Box::new(PlayMediaSkill));
    router.register("open_app", Box::new(OpenAppSkill));
    router.register("open_website", Box::new(OpenWebsiteSkill));
    router.register("disable_wifi", Box::new(WifiSkill { enable: false }));
    router.register("enable_wifi", Box::new(WifiSkill { enable: true }));
    router.register("reminder", Box::new(ReminderSkill));
    router.register("flag_wrong", Box::new(FlagWrongSkill));
    router.register("start_quiz", Box::new(QuizStartSkill));
    router.register("tell_story", Box::new(StorySkill));
    router
}
