//! Process-wide settings.
//!
//! Loaded once at startup. A missing or malformed API key is fatal here so
//! that no submission is ever attempted without a usable credential.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{MediError, MediResult};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment override for the model name.
pub const MODEL_ENV: &str = "MEDIGENIE_MODEL";

/// Environment override for the API base URL.
pub const BASE_URL_ENV: &str = "MEDIGENIE_BASE_URL";

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "medigenie.toml";

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// API credential. Never printed.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    /// Validate and wrap a raw key.
    pub fn new(raw: impl Into<String>) -> MediResult<Self> {
        let raw = raw.into();
        let key = raw.trim();
        if key.is_empty() {
            return Err(MediError::config(format!("{API_KEY_ENV} is empty")));
        }
        if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(MediError::config(format!("{API_KEY_ENV} contains whitespace")));
        }
        Ok(Self(key.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Sampling parameters forwarded verbatim to the model. Fixed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
            response_mime_type: "text/plain".to_string(),
        }
    }
}

/// On-disk configuration (`medigenie.toml`). Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub session_ttl_secs: Option<u64>,
    pub max_upload_bytes: Option<usize>,
}

impl FileConfig {
    pub fn parse(text: &str) -> MediResult<Self> {
        toml::from_str(text).map_err(|e| MediError::config(format!("invalid config file: {e}")))
    }
}

/// Resolved settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: ApiKey,
    pub model: String,
    pub base_url: String,
    pub request_timeout: Duration,
    pub session_ttl: Duration,
    pub max_upload_bytes: usize,
    pub generation: GenerationConfig,
}

impl Settings {
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
    pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);
    pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

    /// Load settings from an optional TOML file plus the process environment.
    ///
    /// An explicit `config_path` must exist; the default file is optional.
    pub fn load(config_path: Option<&Path>) -> MediResult<Self> {
        let file = match config_path {
            Some(path) => Some(read_config(path)?),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Some(read_config(&default)?)
                } else {
                    None
                }
            }
        };

        let settings = Self::resolve(file.unwrap_or_default(), |name| std::env::var(name).ok())?;
        info!(
            model = %settings.model,
            base_url = %settings.base_url,
            timeout_secs = settings.request_timeout.as_secs(),
            "Settings loaded"
        );
        Ok(settings)
    }

    /// Combine a file config with environment lookups.
    pub fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> MediResult<Self> {
        let api_key = env(API_KEY_ENV).ok_or_else(|| {
            MediError::config(format!(
                "{API_KEY_ENV} environment variable not set.\n\
                 Set it with: export {API_KEY_ENV}=your-key"
            ))
        })?;
        let api_key = ApiKey::new(api_key)?;

        let model = env(MODEL_ENV)
            .or(file.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        if model.trim().is_empty() {
            return Err(MediError::config("model name is empty"));
        }

        let base_url = env(BASE_URL_ENV)
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(MediError::config(format!("base URL must be http(s): {base_url}")));
        }

        let request_timeout = match file.request_timeout_secs {
            Some(0) => return Err(MediError::config("request_timeout_secs must be positive")),
            Some(secs) => Duration::from_secs(secs),
            None => Self::DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Self {
            api_key,
            model: model.trim().to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout,
            session_ttl: file
                .session_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(Self::DEFAULT_SESSION_TTL),
            max_upload_bytes: file.max_upload_bytes.unwrap_or(Self::DEFAULT_MAX_UPLOAD_BYTES),
            generation: GenerationConfig::default(),
        })
    }
}

fn read_config(path: &Path) -> MediResult<FileConfig> {
    debug!(path = %path.display(), "Reading config file");
    let text = std::fs::read_to_string(path)
        .map_err(|e| MediError::config(format!("cannot read {}: {e}", path.display())))?;
    FileConfig::parse(&text)
}
