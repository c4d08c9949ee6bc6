use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use nc_core::{Error, Result};

pub mod embeddings;
pub mod models;
pub mod prompts;

pub const DEFAULT_TEMPERATURE: f32 = 0.9;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Which family of model backs an [`nc_core::InferenceModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelProvider {
    #[default]
    OpenAi,
    DeepSeek,
    Dummy,
}

impl ModelProvider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::DeepSeek => "https://api.deepseek.com/v1",
            Self::Dummy => "",
        }
    }

    pub fn default_chat_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-3.5-turbo",
            Self::DeepSeek => "deepseek-chat",
            Self::Dummy => "dummy",
        }
    }

    pub fn default_embedding_model(&self) -> &'static str {
        match self {
            Self::OpenAi | Self::DeepSeek => "text-embedding-ada-002",
            Self::Dummy => "dummy",
        }
    }

    pub fn default_embedding_dim(&self) -> usize {
        match self {
            Self::OpenAi | Self::DeepSeek => 1536,
            Self::Dummy => 768,
        }
    }

    fn api_key_var(&self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::DeepSeek => Some("DEEPSEEK_API_KEY"),
            Self::Dummy => None,
        }
    }

    fn base_url_var(&self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("OPENAI_BASE_URL"),
            Self::DeepSeek => Some("DEEPSEEK_BASE_URL"),
            Self::Dummy => None,
        }
    }
}

impl FromStr for ModelProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "deepseek" => Ok(Self::DeepSeek),
            "dummy" => Ok(Self::Dummy),
            other => Err(Error::Inference(format!("Unknown model: {}", other))),
        }
    }
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::DeepSeek => write!(f, "deepseek"),
            Self::Dummy => write!(f, "dummy"),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub provider: ModelProvider,
    pub api_key: Option<String>,
    /// Chat model; the provider default when unset.
    pub model_name: Option<String>,
    pub base_url: Option<String>,
    pub embedding_model: Option<String>,
    pub embedding_dim: usize,
    pub temperature: f32,
    pub request_timeout: Duration,
}

impl Config {
    pub fn new(provider: ModelProvider) -> Self {
        Self {
            provider,
            api_key: None,
            model_name: None,
            base_url: None,
            embedding_model: None,
            embedding_dim: provider.default_embedding_dim(),
            temperature: DEFAULT_TEMPERATURE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Provider defaults with the API key and base URL taken from the
    /// environment (`OPENAI_API_KEY`, `OPENAI_BASE_URL`, `DEEPSEEK_API_KEY`, ...).
    pub fn from_env(provider: ModelProvider) -> Self {
        let mut config = Self::new(provider);
        config.api_key = provider
            .api_key_var()
            .and_then(|var| env::var(var).ok())
            .filter(|key| !key.is_empty());
        config.base_url = provider
            .base_url_var()
            .and_then(|var| env::var(var).ok())
            .filter(|url| !url.is_empty());
        config
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = dim;
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
    }

    pub fn chat_model(&self) -> &str {
        self.model_name
            .as_deref()
            .unwrap_or_else(|| self.provider.default_chat_model())
    }

    pub fn embedding_model(&self) -> &str {
        self.embedding_model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_embedding_model())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(ModelProvider::default())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("base_url", &self.base_url)
            .field("embedding_model", &self.embedding_model)
            .field("embedding_dim", &self.embedding_dim)
            .field("temperature", &self.temperature)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

pub mod prelude {
    pub use super::embeddings::EmbeddingGenerator;
    pub use super::models::{create_model, DummyModel, OpenAiModel};
    pub use super::{Config, ModelProvider};
    pub use nc_core::{Article, Error, InferenceModel, Result, TitledSummary};
}

pub use models::create_model;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("OpenAI".parse::<ModelProvider>().unwrap(), ModelProvider::OpenAi);
        assert_eq!("deepseek".parse::<ModelProvider>().unwrap(), ModelProvider::DeepSeek);
        assert_eq!("dummy".parse::<ModelProvider>().unwrap(), ModelProvider::Dummy);
        assert!("ollama".parse::<ModelProvider>().is_err());
    }

    #[test]
    fn test_config_defaults_follow_provider() {
        let config = Config::new(ModelProvider::DeepSeek);
        assert_eq!(config.base_url(), "https://api.deepseek.com/v1");
        assert_eq!(config.chat_model(), "deepseek-chat");
        assert_eq!(config.embedding_model(), "text-embedding-ada-002");
        assert_eq!(config.temperature, 0.9);

        let config = Config::new(ModelProvider::OpenAi).with_base_url("http://localhost:8080/v1/");
        assert_eq!(config.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_config_debug_redacts_key() {
        let config = Config::default().with_api_key("sk-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
