use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::embedding::StoredEmbedding;

pub type ArticleId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub url: String,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub source: String,
    /// Stored as handed back by the backend; see [`crate::EmbeddingAdapter`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<StoredEmbedding>,
}

impl Article {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            title: title.into(),
            content: content.into(),
            summary: None,
            published_at,
            source: String::new(),
            embedding: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_embedding(mut self, embedding: impl Into<StoredEmbedding>) -> Self {
        self.embedding = Some(embedding.into());
        self
    }

    /// Text used to embed an article: title followed by body.
    pub fn embedding_text(&self) -> String {
        if self.content.trim().is_empty() {
            self.title.clone()
        } else {
            format!("{}\n\n{}", self.title, self.content)
        }
    }
}

/// Outcome of an upsert keyed by article URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    New,
    Updated,
    Unchanged,
}

impl ArticleStatus {
    pub fn emoji(&self) -> &'static str {
        match self {
            ArticleStatus::New => "🆕",
            ArticleStatus::Updated => "📝",
            ArticleStatus::Unchanged => "⏭️",
        }
    }
}

/// Raw result of a title + summary generation request. Either field is
/// `None` when the model response could not be parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitledSummary {
    pub title: Option<String>,
    pub summary: Option<String>,
}

impl TitledSummary {
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            summary: Some(summary.into()),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.title.is_some() && self.summary.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_builder() {
        let article = Article::new("http://test.com/a", "Title", "Body", Utc::now())
            .with_summary("Short")
            .with_source("Wire")
            .with_embedding(vec![0.5_f32, 1.0]);

        assert_eq!(article.summary.as_deref(), Some("Short"));
        assert_eq!(article.source, "Wire");
        assert_eq!(
            article.embedding.as_ref().and_then(|e| e.decode()),
            Some(vec![0.5, 1.0])
        );
    }

    #[test]
    fn test_embedding_text_falls_back_to_title() {
        let article = Article::new("http://test.com/a", "Only a title", "   ", Utc::now());
        assert_eq!(article.embedding_text(), "Only a title");

        let article = Article::new("http://test.com/b", "Title", "Body", Utc::now());
        assert_eq!(article.embedding_text(), "Title\n\nBody");
    }

    #[test]
    fn test_article_without_embedding_omits_field() {
        let article = Article::new("http://test.com/a", "Title", "Body", Utc::now());
        let json = serde_json::to_value(&article).unwrap();
        assert!(json.get("embedding").is_none());

        let back: Article = serde_json::from_value(json).unwrap();
        assert_eq!(back, article);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ArticleStatus::Unchanged).unwrap(),
            r#""unchanged""#
        );
    }

    #[test]
    fn test_titled_summary_completeness() {
        assert!(TitledSummary::new("t", "s").is_complete());
        assert!(!TitledSummary::default().is_complete());
    }
}
