use std::sync::Arc;

use nc_core::{Article, InferenceModel, Result};

/// Embeds articles and search queries with the configured model.
#[derive(Debug, Clone)]
pub struct EmbeddingGenerator {
    model: Arc<dyn InferenceModel>,
}

impl EmbeddingGenerator {
    pub fn new(model: Arc<dyn InferenceModel>) -> Self {
        Self { model }
    }

    pub async fn generate_article_embedding(&self, article: &Article) -> Result<Vec<f32>> {
        self.model.generate_embeddings(&article.embedding_text()).await
    }

    pub async fn generate_text_embedding(&self, text: &str) -> Result<Vec<f32>> {
        self.model.generate_embeddings(text).await
    }

    /// Return `article` with a freshly generated embedding attached.
    pub async fn embed_article(&self, article: Article) -> Result<Article> {
        let embedding = self.generate_article_embedding(&article).await?;
        Ok(article.with_embedding(embedding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DummyModel;

    #[tokio::test]
    async fn test_embedding_generation() {
        let model = Arc::new(DummyModel::new(None));
        let generator = EmbeddingGenerator::new(model.clone());

        let article = Article::new("http://example.com", "Test Article", "Test content", chrono::Utc::now());
        let embedding = generator.generate_article_embedding(&article).await.unwrap();
        assert_eq!(
            embedding,
            model.generate_embeddings("Test Article\n\nTest content").await.unwrap()
        );

        let embedded = generator.embed_article(article).await.unwrap();
        assert_eq!(embedded.embedding.and_then(|e| e.decode()), Some(embedding));

        let text_embedding = generator.generate_text_embedding("Test text").await.unwrap();
        assert!(!text_embedding.is_empty());
    }
}
