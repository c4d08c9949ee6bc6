use async_trait::async_trait;
use crate::types::{Article, ArticleStatus};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Insert or replace an article, keyed by URL
    async fn store_article(&self, article: &Article) -> Result<ArticleStatus>;

    /// Look up a single article by URL
    async fn get_by_url(&self, url: &str) -> Result<Option<Article>>;

    /// Nearest articles to `embedding`, most similar first
    async fn search_by_embedding(&self, embedding: &[f32], limit: usize) -> Result<Vec<Article>>;

    /// Articles whose title or content contains `query`, newest first
    async fn search_by_keyword(&self, query: &str, limit: usize) -> Result<Vec<Article>>;

    /// Most recently published articles, newest first
    async fn list_recent(&self, limit: usize, offset: usize) -> Result<Vec<Article>>;

    async fn delete_article(&self, url: &str) -> Result<()>;

    async fn count(&self) -> Result<usize>;
}
