//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// Resource limits applied to uploads before decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum upload size in megabytes
    pub max_upload_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { max_upload_mb: 20 }
    }
}

/// Image normalization settings for the primary classifier payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Longest allowed edge in pixels. Smaller images are never upscaled.
    pub max_dimension: u32,

    /// JPEG quality (1-100)
    pub quality: u8,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1280,
            quality: 90,
            decode_timeout_ms: 5000,
        }
    }
}

/// Pl@ntNet identification service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantNetConfig {
    /// Base identify endpoint; the project is appended as a path segment
    pub endpoint: String,

    /// Flora project ("all" searches every project)
    pub project: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Language for common names (e.g. "en", "fr"); service default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for PlantNetConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://my-api.plantnet.org/v2/identify".to_string(),
            project: "all".to_string(),
            api_key: "${PLANTNET_KEY}".to_string(),
            lang: None,
            timeout_ms: 60_000,
        }
    }
}

/// Low-confidence fallback captioning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostConfig {
    /// Allow the fallback at all. It still needs a caption provider key.
    pub enabled: bool,

    /// Primary confidence strictly below this triggers captioning
    pub threshold: f64,

    /// Output token limit per caption
    pub max_tokens: u32,

    /// Maximum concurrent captioning calls
    pub parallel: usize,

    /// Per-caption timeout in milliseconds
    pub timeout_ms: u64,

    /// Retries per caption for transient failures (0 disables)
    pub retry_attempts: u32,

    /// Base backoff delay in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.8,
            max_tokens: 300,
            parallel: 4,
            timeout_ms: 60_000,
            retry_attempts: 0,
            retry_delay_ms: 1000,
        }
    }
}

/// OpenAI-compatible caption provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// Chat Completions endpoint
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Vision-capable model name
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: "${OPENAI_API_KEY}".to_string(),
            model: "gpt-4o".to_string(),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON output
    pub pretty: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
