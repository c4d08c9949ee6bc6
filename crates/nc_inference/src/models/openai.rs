use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use nc_core::{Error, InferenceModel, Result, TitledSummary};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::prompts::{parse_summary_and_title, summary_and_title_prompt, summary_prompt};
use crate::{Config, ModelProvider};

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for OpenAI-compatible `chat/completions` and `embeddings`
/// endpoints. DeepSeek speaks the same protocol under another base URL.
pub struct OpenAiModel {
    client: Arc<Client>,
    api_key: String,
    config: Config,
}

impl OpenAiModel {
    pub fn new(config: Config) -> Result<Self> {
        let Some(api_key) = config.api_key.clone() else {
            return Err(Error::Inference(format!(
                "{} API key is required",
                display_name(config.provider)
            )));
        };
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client: Arc::new(client),
            api_key,
            config,
        })
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.config.chat_model(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url()))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::Inference("Completion returned no choices".to_string()))?;
        debug!("Completion from {}: {} chars", self.config.chat_model(), content.len());
        Ok(content)
    }
}

fn display_name(provider: ModelProvider) -> &'static str {
    match provider {
        ModelProvider::DeepSeek => "DeepSeek",
        ModelProvider::OpenAi | ModelProvider::Dummy => "OpenAI",
    }
}

impl fmt::Debug for OpenAiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.config.base_url())
            .field("model", &self.config.chat_model())
            .finish()
    }
}

#[async_trait]
impl InferenceModel for OpenAiModel {
    fn name(&self) -> &str {
        display_name(self.config.provider)
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        let summary = self.complete(&summary_prompt(text)).await?;
        Ok(summary.trim().to_string())
    }

    async fn summarize_and_title(&self, text: &str) -> Result<TitledSummary> {
        let response = self.complete(&summary_and_title_prompt(text)).await?;
        Ok(parse_summary_and_title(&response))
    }

    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            input: text,
            model: self.config.embedding_model(),
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.config.base_url()))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<EmbeddingResponse>()
            .await?;

        response
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .filter(|embedding| !embedding.is_empty())
            .ok_or_else(|| Error::Inference("Embedding response was empty".to_string()))
    }
}
