use async_trait::async_trait;
use nc_core::{Article, ArticleStatus, ArticleStorage, Result};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{rank_by_similarity, status_for};

#[derive(Debug, Default)]
pub struct MemoryStore {
    articles: Vec<Article>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store_article(&mut self, article: &Article) -> ArticleStatus {
        match self.articles.iter_mut().find(|a| a.url == article.url) {
            Some(existing) => {
                let status = status_for(Some(&*existing), article);
                if status == ArticleStatus::Updated {
                    let id = existing.id;
                    *existing = article.clone();
                    existing.id = id;
                }
                status
            }
            None => {
                self.articles.push(article.clone());
                ArticleStatus::New
            }
        }
    }

    pub fn get_by_url(&self, url: &str) -> Option<Article> {
        self.articles.iter().find(|a| a.url == url).cloned()
    }

    pub fn search_by_embedding(&self, embedding: &[f32], limit: usize) -> Vec<Article> {
        rank_by_similarity(embedding, self.articles.clone(), limit)
    }

    pub fn search_by_keyword(&self, query: &str, limit: usize) -> Vec<Article> {
        let needle = query.to_lowercase();
        let mut matches: Vec<Article> = self
            .articles
            .iter()
            .filter(|a| {
                a.title.to_lowercase().contains(&needle) || a.content.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        matches.truncate(limit);
        matches
    }

    pub fn list_recent(&self, limit: usize, offset: usize) -> Vec<Article> {
        let mut articles = self.articles.clone();
        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        articles.into_iter().skip(offset).take(limit).collect()
    }

    pub fn delete_article(&mut self, url: &str) {
        self.articles.retain(|a| a.url != url);
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleStorage for InMemoryStorage {
    async fn store_article(&self, article: &Article) -> Result<ArticleStatus> {
        let mut store = self.store.write().await;
        Ok(store.store_article(article))
    }

    async fn get_by_url(&self, url: &str) -> Result<Option<Article>> {
        let store = self.store.read().await;
        Ok(store.get_by_url(url))
    }

    async fn search_by_embedding(&self, embedding: &[f32], limit: usize) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.search_by_embedding(embedding, limit))
    }

    async fn search_by_keyword(&self, query: &str, limit: usize) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.search_by_keyword(query, limit))
    }

    async fn list_recent(&self, limit: usize, offset: usize) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.list_recent(limit, offset))
    }

    async fn delete_article(&self, url: &str) -> Result<()> {
        let mut store = self.store.write().await;
        store.delete_article(url);
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        let store = self.store.read().await;
        Ok(store.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn article(url: &str, title: &str, age_hours: i64) -> Article {
        Article::new(
            url,
            title,
            format!("{} body text", title),
            Utc::now() - Duration::hours(age_hours),
        )
    }

    #[tokio::test]
    async fn test_memory_storage_upsert_by_url() {
        let storage = InMemoryStorage::new();
        let original = article("http://test.com", "Test Article", 1);

        assert_eq!(storage.store_article(&original).await.unwrap(), ArticleStatus::New);
        assert_eq!(storage.store_article(&original).await.unwrap(), ArticleStatus::Unchanged);

        let mut edited = original.clone().with_summary("Summary");
        edited.id = uuid::Uuid::new_v4();
        assert_eq!(storage.store_article(&edited).await.unwrap(), ArticleStatus::Updated);
        assert_eq!(storage.count().await.unwrap(), 1);

        let stored = storage.get_by_url("http://test.com").await.unwrap().unwrap();
        assert_eq!(stored.id, original.id);
        assert_eq!(stored.summary.as_deref(), Some("Summary"));
    }

    #[tokio::test]
    async fn test_list_recent_orders_newest_first() {
        let storage = InMemoryStorage::new();
        for (i, age) in [5, 1, 3].iter().enumerate() {
            let a = article(&format!("http://test.com/{}", i), &format!("A{}", i), *age);
            storage.store_article(&a).await.unwrap();
        }

        let recent = storage.list_recent(2, 0).await.unwrap();
        let titles: Vec<&str> = recent.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["A1", "A2"]);

        let page = storage.list_recent(10, 2).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "A0");
    }

    #[tokio::test]
    async fn test_search_by_embedding_nearest_first() {
        let storage = InMemoryStorage::new();
        let sports = article("http://test.com/sports", "Sports", 1).with_embedding(vec![1.0_f32, 0.0]);
        let politics = article("http://test.com/politics", "Politics", 1).with_embedding(vec![0.0_f32, 1.0]);
        storage.store_article(&sports).await.unwrap();
        storage.store_article(&politics).await.unwrap();
        storage.store_article(&article("http://test.com/raw", "Raw", 1)).await.unwrap();

        let similar = storage.search_by_embedding(&[0.1, 0.9], 1).await.unwrap();
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].title, "Politics");
    }

    #[tokio::test]
    async fn test_search_by_keyword_and_delete() {
        let storage = InMemoryStorage::new();
        storage.store_article(&article("http://test.com/1", "Election results", 2)).await.unwrap();
        storage.store_article(&article("http://test.com/2", "Election turnout", 1)).await.unwrap();
        storage.store_article(&article("http://test.com/3", "Weather", 1)).await.unwrap();

        let found = storage.search_by_keyword("ELECTION", 10).await.unwrap();
        let titles: Vec<&str> = found.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Election turnout", "Election results"]);

        storage.delete_article("http://test.com/2").await.unwrap();
        assert_eq!(storage.search_by_keyword("election", 10).await.unwrap().len(), 1);
    }
}
