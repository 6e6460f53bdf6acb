//! Completion backends.
//!
//! `CohereCompleter` calls the hosted generate endpoint. [`complete`] sits on
//! top of any backend and turns degenerate results into canned answers, so
//! only real service failures surface as errors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::{debug, error, warn};

use crate::config::GenerationConfig;
use crate::types::{Answer, Fallback};
use notechat_core::{Error, Result};

pub const NO_ANSWER: &str = "No specific answer was found in the document.";
pub const REPHRASE: &str =
    "I couldn't find a clear answer to that. Could you try rephrasing your question?";

/// Generated text shorter than this (after trimming) is not an answer.
pub const MIN_ANSWER_CHARS: usize = 5;

/// Raw result of one generation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    /// `None` when the service returned no text field at all.
    pub text: Option<String>,
}

/// Trait for text-completion backends.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Generation>;

    fn model(&self) -> &str;
}

/// Generate an answer for `prompt`, substituting fallbacks for degenerate
/// output.
pub async fn complete(backend: &dyn CompletionBackend, prompt: &str) -> Result<Answer> {
    let generation = backend.generate(prompt).await?;
    Ok(finalize(generation))
}

/// Apply the degenerate-response policy to a raw generation.
pub fn finalize(generation: Generation) -> Answer {
    match generation.text {
        None => {
            warn!("Completion returned no text, using fallback");
            Answer {
                text: NO_ANSWER.to_string(),
                fallback: Some(Fallback::NoText),
            }
        }
        Some(text) if text.trim().chars().count() < MIN_ANSWER_CHARS => {
            warn!("Completion too short ({:?}), asking to rephrase", text);
            Answer {
                text: REPHRASE.to_string(),
                fallback: Some(Fallback::TooShort),
            }
        }
        Some(text) => Answer {
            text: text.trim().to_string(),
            fallback: None,
        },
    }
}

/// A [`CompletionBackend`] backed by the Cohere generate API.
pub struct CohereCompleter {
    client: Client,
    base_url: String,
    api_key: String,
    config: GenerationConfig,
}

impl CohereCompleter {
    pub fn new(
        base_url: &str,
        api_key: &str,
        config: GenerationConfig,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            config,
        })
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "prompt": prompt,
            "model": self.config.model,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "num_generations": 1,
        })
    }
}

#[async_trait]
impl CompletionBackend for CohereCompleter {
    async fn generate(&self, prompt: &str) -> Result<Generation> {
        let url = format!("{}/v1/generate", self.base_url);
        debug!("Generating with {} ({} prompt chars)", self.config.model, prompt.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| {
                error!("Completion request failed: {}", e);
                Error::CompletionService(format!("Request failed: {}", e))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::CompletionService(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            error!("Completion API error {}", status);
            return Err(Error::CompletionService(api_error(status, &body)));
        }

        parse_generate_response(&body)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Read the first generation's text. A body that is not JSON is a service
/// error; JSON without a text field is a `Generation` with no text.
pub fn parse_generate_response(body: &str) -> Result<Generation> {
    let parsed: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| Error::CompletionService(format!("Invalid response: {}", e)))?;
    let text = parsed["generations"][0]["text"]
        .as_str()
        .or_else(|| parsed["text"].as_str())
        .map(str::to_string);
    Ok(Generation { text })
}

fn api_error(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string());
    format!("API error {}: {}", status, detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedBackend(Option<&'static str>);

    #[async_trait]
    impl CompletionBackend for FixedBackend {
        async fn generate(&self, _prompt: &str) -> Result<Generation> {
            Ok(Generation {
                text: self.0.map(str::to_string),
            })
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl CompletionBackend for FailingBackend {
        async fn generate(&self, _prompt: &str) -> Result<Generation> {
            Err(Error::CompletionService("API error 429: too many requests".into()))
        }

        fn model(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_missing_text_gives_fallback_not_error() {
        let answer = complete(&FixedBackend(None), "prompt").await.unwrap();
        assert_eq!(answer.text, NO_ANSWER);
        assert_eq!(answer.fallback, Some(Fallback::NoText));
    }

    #[tokio::test]
    async fn test_short_text_asks_to_rephrase() {
        for text in ["", "  ok \n", "n/a"] {
            let answer = complete(&FixedBackend(Some(text)), "prompt").await.unwrap();
            assert_eq!(answer.text, REPHRASE);
            assert_eq!(answer.fallback, Some(Fallback::TooShort));
        }
    }

    #[tokio::test]
    async fn test_real_answer_is_trimmed() {
        let answer = complete(&FixedBackend(Some("\n  Ownership rules.  ")), "p")
            .await
            .unwrap();
        assert_eq!(answer.text, "Ownership rules.");
        assert!(answer.fallback.is_none());
    }

    #[tokio::test]
    async fn test_service_failure_propagates() {
        let err = complete(&FailingBackend, "p").await.unwrap_err();
        assert!(matches!(err, Error::CompletionService(_)));
    }

    #[test]
    fn test_parse_generate_response() {
        let body = r#"{"id":"g1","generations":[{"id":"a","text":" The answer."}],"prompt":"p"}"#;
        assert_eq!(
            parse_generate_response(body).unwrap().text.as_deref(),
            Some(" The answer.")
        );

        let body = r#"{"id":"g1","generations":[]}"#;
        assert_eq!(parse_generate_response(body).unwrap(), Generation { text: None });

        let body = r#"{"generations":[{"text":""}]}"#;
        assert_eq!(parse_generate_response(body).unwrap().text.as_deref(), Some(""));

        assert!(matches!(
            parse_generate_response("<html>bad gateway</html>"),
            Err(Error::CompletionService(_))
        ));
    }

    #[test]
    fn test_request_body() {
        let completer = CohereCompleter::new(
            "https://api.cohere.ai/",
            "k",
            GenerationConfig::default(),
            Duration::from_secs(5),
        )
        .unwrap();
        let body = completer.request_body("hello");
        assert_eq!(body["prompt"], "hello");
        assert_eq!(body["model"], "command");
        assert_eq!(body["temperature"], 0.3);
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["num_generations"], 1);
        assert_eq!(completer.base_url, "https://api.cohere.ai");
    }

    #[test]
    fn test_api_error_prefers_service_message() {
        let msg = api_error(StatusCode::UNAUTHORIZED, r#"{"message":"invalid api token"}"#);
        assert_eq!(msg, "API error 401 Unauthorized: invalid api token");
    }
}
