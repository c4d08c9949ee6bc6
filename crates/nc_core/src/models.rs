use std::fmt;

use async_trait::async_trait;
use crate::types::{Article, TitledSummary};
use crate::Result;

#[async_trait]
pub trait InferenceModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Summarize a piece of text in a few sentences
    async fn summarize(&self, text: &str) -> Result<String>;

    /// Generate a title and summary for a piece of text
    async fn summarize_and_title(&self, text: &str) -> Result<TitledSummary>;

    /// Generate embeddings for a piece of text
    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>>;

    /// Summarize an entire article
    async fn summarize_article(&self, article: &Article) -> Result<String> {
        self.summarize(&article.content).await
    }
}
