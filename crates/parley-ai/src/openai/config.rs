//! OpenAI API client configuration.

use std::fmt;
use std::path::PathBuf;

use crate::ChatError;

pub(crate) const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Filename the original desktop app kept its key in; still honored.
const KEY_FILE_NAME: &str = "OpenAI_API_key.txt";

/// OpenAI API client configuration.
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| OPENAI_API_BASE.to_string()),
        }
    }

    /// Resolve credentials from the environment.
    ///
    /// Resolution order:
    /// 1. `OPENAI_API_KEY` env var
    /// 2. `OpenAI_API_key.txt` in the current directory (first line)
    /// 3. `~/.config/parley/api_key`
    pub fn from_env() -> Result<Self, ChatError> {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                return Ok(Self::new(key.trim().to_string()));
            }
        }

        if let Some(key) = Self::read_key_file(&PathBuf::from(KEY_FILE_NAME)) {
            return Ok(Self::new(key));
        }

        if let Some(home) = dirs::config_dir() {
            if let Some(key) = Self::read_key_file(&home.join("parley").join("api_key")) {
                return Ok(Self::new(key));
            }
        }

        Err(ChatError::ApiError(
            "OpenAI API not configured. Set OPENAI_API_KEY or create \
             OpenAI_API_key.txt."
                .into(),
        ))
    }

    /// First non-empty line of a key file, if it exists.
    fn read_key_file(path: &PathBuf) -> Option<String> {
        let contents = std::fs::read_to_string(path).ok()?;
        let key = contents.lines().next()?.trim();
        if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}
