use alloc::string::String;
use core::fmt;

use crate::RoundError;

pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Where and how the judge is reached.
///
/// The API key is redacted from `Debug` output.
#[derive(Clone, PartialEq)]
pub struct JudgeConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    api_key: String,
}

impl JudgeConfig {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            temperature: temperature.clamp(0.0, 2.0),
            api_key: String::new(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.set_api_key(api_key);
        self
    }

    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.api_key = api_key.into();
    }

    pub fn api_key(&self) -> &str {
        self.api_key.trim()
    }

    pub fn validate(&self) -> Result<(), RoundError> {
        if self.api_key().is_empty() {
            Err(RoundError::MissingApiKey)
        } else {
            Ok(())
        }
    }
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TEMPERATURE)
    }
}

impl fmt::Debug for JudgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key().is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };
        f.debug_struct("JudgeConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("api_key", &api_key)
            .finish()
    }
}
