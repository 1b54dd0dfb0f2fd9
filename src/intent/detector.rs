use serde_json::json;

use super::{IntentCandidate, IntentDetector};
use crate::context::ContextStore;

// Confidence tiers for the rule table.
const STRONG: f32 = 0.9;
const MEDIUM: f32 = 0.8;
const WEAK: f32 = 0.5;

/// Keyword/phrase rule detector. Stands in for the swappable ML
/// detector; implements the same seam so either can be bound.
pub struct RuleDetector;

impl RuleDetector {
    pub fn new() -> Self {
        Self
    }

    fn detect_one(&self, t: &str) -> Vec<IntentCandidate> {
        let mut out = Vec::new();
        let has_word = |w: &str| {
            t.split_whitespace()
                .any(|x| x.trim_matches(|c: char| !c.is_alphanumeric()) == w)
        };

        // Greetings and session endings
        if has_word("hi") || has_word("hello") || has_word("hey")
            || t.contains("good morning") || t.contains("good evening")
        {
            out.push(IntentCandidate::new("greet", STRONG));
        }
        if t.contains("good night") {
            out.push(IntentCandidate::new("good_night", STRONG));
        }
        if has_word("bye") || has_word("goodbye") || has_word("exit") || has_word("quit") {
            out.push(IntentCandidate::new("exit", STRONG));
        }
        if t.contains("thank") || has_word("shukriya") {
            out.push(IntentCandidate::new("appreciation", MEDIUM));
        }
        if has_word("nothing") || t.contains("never mind") || t.contains("nevermind") {
            out.push(IntentCandidate::new("graceful_end", MEDIUM));
        }
        if t.contains("that was wrong")
            || t.contains("that's wrong")
            || t.contains("you got that wrong")
        {
            out.push(IntentCandidate::new("flag_wrong", STRONG));
        }

        // Information
        if has_word("time") {
            out.push(IntentCandidate::new("get_time", MEDIUM));
        }
        if has_word("date") || has_word("day") {
            out.push(IntentCandidate::new("get_date", MEDIUM));
        }
        if has_word("battery") {
            out.push(IntentCandidate::new("get_battery_status", STRONG));
        }
        if has_word("weather") || has_word("forecast") {
            let mut cand = IntentCandidate::new("get_weather", MEDIUM);
            if let Some(city) = t.split(" in ").nth(1) {
                let city = city.trim().trim_end_matches(|c: char| !c.is_alphanumeric());
                if !city.is_empty() {
                    cand = cand.with_entity("city", json!(city));
                }
            }
            out.push(cand);
        }
        if has_word("news") || has_word("headlines") {
            out.push(IntentCandidate::new("get_news", MEDIUM));
        }
        if has_word("joke") {
            out.push(IntentCandidate::new("tell_joke", MEDIUM));
        }
        if has_word("story") {
            out.push(IntentCandidate::new("tell_story", MEDIUM));
        }

        // Actions
        if let Some(rest) = t.strip_prefix("play ") {
            let query = rest.trim_end_matches(" on youtube").trim();
            out.push(
                IntentCandidate::new("play_youtube", MEDIUM)
                    .with_entity("query", json!(query)),
            );
        } else if t == "play" {
            out.push(IntentCandidate::new("play_youtube", WEAK));
        }
        if t.contains("wifi") || t.contains("wi-fi") {
            if t.contains("off") || t.contains("disable") {
                out.push(IntentCandidate::new("disable_wifi", MEDIUM));
            } else if t.contains("on") || t.contains("enable") {
                out.push(IntentCandidate::new("enable_wifi", MEDIUM));
            }
        }
        if t.contains("recycle bin") {
            out.push(IntentCandidate::new("clear_recycle_bin", STRONG));
        }
        if has_word("lock") {
            out.push(IntentCandidate::new("lock_system", MEDIUM));
        }
        if t.contains("remind") || has_word("alarm") || t.contains("wake me") {
            let mut cand = IntentCandidate::new("reminder", MEDIUM);
            if let Some(at) = t.split(" at ").nth(1) {
                cand = cand.with_entity("when", json!(at.trim()));
            }
            out.push(cand);
        }
        if has_word("todo") || has_word("todos") || has_word("pending") {
            out.push(IntentCandidate::new("show_todo_list", MEDIUM));
        }
        if has_word("quiz") {
            out.push(IntentCandidate::new("start_quiz", MEDIUM));
        }
        if let Some(rest) = t.strip_prefix("open ") {
            let target = rest.trim();
            if target.contains('.') || target.contains("website") || target.contains("site") {
                out.push(
                    IntentCandidate::new("open_website", MEDIUM)
                        .with_entity("site", json!(target)),
                );
            } else if !target.is_empty() {
                out.push(
                    IntentCandidate::new("open_app", MEDIUM)
                        .with_entity("app", json!(target)),
                );
            }
        } else if t == "open" {
            // Bare verb: plausibly an app launch, but nothing to act on.
            out.push(IntentCandidate::new("open_app", WEAK));
        }

        out
    }
}

impl Default for RuleDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentDetector for RuleDetector {
    fn detect(&self, text: &str, _ctx: &ContextStore) -> Vec<IntentCandidate> {
        let t = text.trim().to_lowercase();
        if t.len() < 2 {
            return Vec::new();
        }

        // Compound commands: only split when every part stands on its
        // own, so "rock and roll" stays one query.
        let parts: Vec<&str> = t
            .split(" and then ")
            .flat_map(|p| p.split(" and "))
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() > 1 {
            let per_part: Vec<Vec<IntentCandidate>> =
                parts.iter().map(|p| self.detect_one(p)).collect();
            if per_part.iter().all(|v| !v.is_empty()) {
                return per_part.into_iter().flatten().collect();
            }
        }

        self.detect_one(&t)
    }
}
