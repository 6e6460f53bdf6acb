//! Generation parameters.

use serde::{Deserialize, Serialize};

use notechat_core::CohereSettings;

/// Model parameters sent with every completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: notechat_core::config::DEFAULT_GENERATE_MODEL.into(),
            temperature: 0.3,
            max_tokens: 1000,
        }
    }
}

impl From<&CohereSettings> for GenerationConfig {
    fn from(settings: &CohereSettings) -> Self {
        Self {
            model: settings.generate_model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }
}
