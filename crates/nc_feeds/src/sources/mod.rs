use async_trait::async_trait;
use nc_core::{Article, Result};

pub mod newsapi;

pub use newsapi::{NewsApiConfig, NewsApiSource};

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Returns the name of the feed
    fn name(&self) -> &str;

    /// Fetches the current batch of articles, without summaries or embeddings
    async fn fetch_articles(&self) -> Result<Vec<Article>>;
}
