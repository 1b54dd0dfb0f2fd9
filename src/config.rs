use std::path::Path;

use serde::Deserialize;
use tracing::warn;

/// Session settings. Everything has a default so the assistant runs
/// with no config file present.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Append a short justification after each routed response.
    pub reason_explanation_mode: bool,
    /// How long the driver waits to merge continuation phrases
    /// ("open" ... "chrome") into one command.
    pub continuation_window_ms: u64,
    /// llama-server base URL for the conversational fallback. Unset
    /// means the template responder answers instead.
    pub llm_url: Option<String>,
    /// External TTS command (e.g. "say"); unset means print-only.
    pub speak_command: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reason_explanation_mode: false,
            continuation_window_ms: 1000,
            llm_url: None,
            speak_command: None,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Missing or unreadable config is not fatal for a voice session.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("ignoring config at {}: {e}", path.display());
                Self::default()
            }
        }
    }
}
