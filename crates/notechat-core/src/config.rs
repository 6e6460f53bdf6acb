//! Configuration loaded from the environment (and an optional `.env` file).

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 3003;
pub const DEFAULT_BASE_URL: &str = "https://api.cohere.ai";
pub const DEFAULT_EMBED_MODEL: &str = "embed-english-v3.0";
pub const DEFAULT_GENERATE_MODEL: &str = "command";
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);

/// Cohere credentials and model parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohereSettings {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub base_url: String,
    pub embed_model: String,
    pub generate_model: String,
    pub temperature: f64,
    pub max_tokens: usize,
}

/// Chunking, batching and retrieval parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetrievalSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub embed_batch_size: usize,
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            embed_batch_size: 10,
            top_k: 5,
        }
    }
}

/// Bounds on remote calls.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Timeouts {
    /// Embedding requests and connectivity checks.
    pub connect: Duration,
    /// Text generation.
    pub generation: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            generation: Duration::from_secs(60),
        }
    }
}

/// Top-level NoteChat configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteChatConfig {
    /// HTTP server port.
    pub port: u16,
    pub cohere: CohereSettings,
    pub retrieval: RetrievalSettings,
    pub timeouts: Timeouts,
    /// Largest accepted upload, in bytes.
    pub max_upload_bytes: usize,
    /// Idle time after which a session is dropped. Zero keeps sessions
    /// until logout.
    pub session_ttl: Duration,
}

impl NoteChatConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Fails with [`Error::Config`] when `COHERE_API_KEY` is missing or blank,
    /// or when a numeric variable does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("COHERE_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("COHERE_API_KEY is missing".into()))?;

        let port = match lookup("NOTECHAT_PORT") {
            Some(v) => parse_var("NOTECHAT_PORT", &v)?,
            None => parse_or("PORT", &lookup, DEFAULT_PORT)?,
        };

        let cohere = CohereSettings {
            api_key,
            base_url: lookup("COHERE_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            embed_model: lookup("NOTECHAT_EMBED_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBED_MODEL.to_string()),
            generate_model: lookup("NOTECHAT_GENERATE_MODEL")
                .unwrap_or_else(|| DEFAULT_GENERATE_MODEL.to_string()),
            temperature: parse_or("NOTECHAT_TEMPERATURE", &lookup, 0.3)?,
            max_tokens: parse_or("NOTECHAT_MAX_TOKENS", &lookup, 1000)?,
        };

        let defaults = RetrievalSettings::default();
        let retrieval = RetrievalSettings {
            chunk_size: parse_or("NOTECHAT_CHUNK_SIZE", &lookup, defaults.chunk_size)?,
            chunk_overlap: parse_or("NOTECHAT_CHUNK_OVERLAP", &lookup, defaults.chunk_overlap)?,
            embed_batch_size: parse_or("NOTECHAT_EMBED_BATCH", &lookup, defaults.embed_batch_size)?
                .max(1),
            top_k: parse_or("NOTECHAT_TOP_K", &lookup, defaults.top_k)?,
        };

        let timeouts = Timeouts {
            connect: Duration::from_secs(parse_or(
                "NOTECHAT_CONNECT_TIMEOUT_SECS",
                &lookup,
                Timeouts::default().connect.as_secs(),
            )?),
            generation: Duration::from_secs(parse_or(
                "NOTECHAT_GENERATION_TIMEOUT_SECS",
                &lookup,
                Timeouts::default().generation.as_secs(),
            )?),
        };

        let max_upload_mb: usize = parse_or("NOTECHAT_MAX_UPLOAD_MB", &lookup, 25)?;
        let session_ttl = Duration::from_secs(parse_or(
            "NOTECHAT_SESSION_TTL_SECS",
            &lookup,
            DEFAULT_SESSION_TTL.as_secs(),
        )?);

        Ok(Self {
            port,
            cohere,
            retrieval,
            timeouts,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            session_ttl,
        })
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} has an invalid value: {:?}", key, value)))
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(v) => parse_var(key, &v),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let err = NoteChatConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = NoteChatConfig::from_lookup(lookup_from(&[("COHERE_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_defaults() {
        let config = NoteChatConfig::from_lookup(lookup_from(&[("COHERE_API_KEY", "k-123")])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.cohere.api_key, "k-123");
        assert_eq!(config.cohere.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.cohere.embed_model, "embed-english-v3.0");
        assert_eq!(config.cohere.generate_model, "command");
        assert_eq!(config.cohere.max_tokens, 1000);
        assert_eq!(config.retrieval.chunk_size, 1000);
        assert_eq!(config.retrieval.chunk_overlap, 200);
        assert_eq!(config.retrieval.embed_batch_size, 10);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.timeouts.connect, Duration::from_secs(10));
        assert_eq!(config.max_upload_bytes, 25 * 1024 * 1024);
        assert_eq!(config.session_ttl, DEFAULT_SESSION_TTL);
    }

    #[test]
    fn test_overrides() {
        let config = NoteChatConfig::from_lookup(lookup_from(&[
            ("COHERE_API_KEY", "k"),
            ("PORT", "9000"),
            ("NOTECHAT_PORT", "8080"),
            ("COHERE_BASE_URL", "http://localhost:9999/"),
            ("NOTECHAT_TOP_K", "3"),
            ("NOTECHAT_EMBED_BATCH", "0"),
            ("NOTECHAT_SESSION_TTL_SECS", "90"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.cohere.base_url, "http://localhost:9999");
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.embed_batch_size, 1);
        assert_eq!(config.session_ttl, Duration::from_secs(90));
    }

    #[test]
    fn test_bad_number_is_config_error() {
        let err = NoteChatConfig::from_lookup(lookup_from(&[
            ("COHERE_API_KEY", "k"),
            ("NOTECHAT_CHUNK_SIZE", "big"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("NOTECHAT_CHUNK_SIZE"));
    }

    #[test]
    fn test_api_key_not_serialized() {
        let config = NoteChatConfig::from_lookup(lookup_from(&[("COHERE_API_KEY", "secret")])).unwrap();
        let json = serde_json::to_string(&config.cohere).unwrap();
        assert!(!json.contains("secret"));
    }
}
