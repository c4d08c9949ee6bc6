use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use nc_core::{Article, ArticleStatus, ArticleStorage, Error, InferenceModel, Result};
use nc_inference::embeddings::EmbeddingGenerator;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::logging::Logger;
use crate::sources::FeedSource;

pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// What one ingestion pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub new: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl IngestReport {
    pub fn record(&mut self, status: ArticleStatus) {
        match status {
            ArticleStatus::New => self.new += 1,
            ArticleStatus::Updated => self.updated += 1,
            ArticleStatus::Unchanged => self.unchanged += 1,
        }
    }

    pub fn merge(&mut self, other: IngestReport) {
        self.new += other.new;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.failed += other.failed;
    }

    pub fn total(&self) -> usize {
        self.new + self.updated + self.unchanged + self.failed
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} new, {} {} updated, {} {} unchanged, ❌ {} failed",
            ArticleStatus::New.emoji(),
            self.new,
            ArticleStatus::Updated.emoji(),
            self.updated,
            ArticleStatus::Unchanged.emoji(),
            self.unchanged,
            self.failed
        )
    }
}

/// Pulls articles from feed sources, summarizes and embeds them, and upserts
/// them into storage by URL.
pub struct IngestManager {
    storage: Arc<dyn ArticleStorage>,
    inference: Arc<dyn InferenceModel>,
    embeddings: EmbeddingGenerator,
    sources: Vec<Arc<dyn FeedSource>>,
    semaphore: Arc<Semaphore>,
}

impl IngestManager {
    pub fn new(storage: Arc<dyn ArticleStorage>, inference: Arc<dyn InferenceModel>) -> Self {
        Self {
            storage,
            embeddings: EmbeddingGenerator::new(inference.clone()),
            inference,
            sources: Vec::new(),
            semaphore: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENCY)),
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
        self
    }

    pub fn add_source(&mut self, source: Arc<dyn FeedSource>) {
        self.sources.push(source);
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.name())
    }

    /// Summarize (if needed), embed and store one article.
    ///
    /// An article whose title and body match what is already stored keeps
    /// the stored summary and embedding, so no inference calls are made.
    pub async fn process_article(&self, mut article: Article) -> Result<ArticleStatus> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| Error::External(e.into()))?;
        debug!("📰 Processing article: {}", article.title);

        if let Some(existing) = self.storage.get_by_url(&article.url).await? {
            article.id = existing.id;
            if existing.title == article.title && existing.content == article.content {
                article.summary = article.summary.or(existing.summary);
                article.embedding = existing.embedding;
            }
        }

        if article.summary.is_none() && !article.content.trim().is_empty() {
            debug!("🤖 Generating summary for article: {}", article.title);
            article.summary = Some(self.inference.summarize_article(&article).await?);
        }

        if article.embedding.is_none() {
            debug!("🔢 Generating embedding for article: {}", article.title);
            article = self.embeddings.embed_article(article).await?;
        }

        let status = self.storage.store_article(&article).await?;
        info!("{} {} - {}", status.emoji(), article.title, article.url);
        Ok(status)
    }

    pub async fn ingest_source(&self, source: &dyn FeedSource) -> Result<IngestReport> {
        let logger = Logger::new().with_prefix(format!("[{}]", source.name()));
        let articles = source.fetch_articles().await?;
        logger.info(&format!("📥 Fetched {} articles", articles.len()));

        let outcomes = join_all(articles.into_iter().map(|article| {
            let url = article.url.clone();
            async move { (url, self.process_article(article).await) }
        }))
        .await;

        let mut report = IngestReport::default();
        for (url, outcome) in outcomes {
            match outcome {
                Ok(status) => report.record(status),
                Err(e) => {
                    logger.warn(&format!("⚠️ Failed to ingest {}: {}", url, e));
                    report.failed += 1;
                }
            }
        }
        logger.info(&format!("✅ {}", report));
        Ok(report)
    }

    /// One pass over every source. A failing source is logged and skipped.
    pub async fn ingest_all(&self) -> IngestReport {
        let mut report = IngestReport::default();
        for source in &self.sources {
            match self.ingest_source(source.as_ref()).await {
                Ok(source_report) => report.merge(source_report),
                Err(e) => error!("❌ Feed {} failed: {}", source.name(), e),
            }
        }
        report
    }

    /// Ingest every `interval`, starting immediately. Runs `cycles` passes,
    /// or forever when `None`.
    pub async fn run_periodic(&self, interval: Duration, cycles: Option<usize>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut completed = 0;
        loop {
            ticker.tick().await;
            info!("🔄 Starting ingestion cycle {}", completed + 1);
            let report = self.ingest_all().await;
            if report.total() == 0 && !self.sources.is_empty() {
                warn!("⚠️ Ingestion cycle produced no articles");
            }
            info!("💤 Cycle done ({}), next in {:?}", report, interval);

            completed += 1;
            if cycles.is_some_and(|max| completed >= max) {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use nc_core::TitledSummary;
    use nc_storage::InMemoryStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct CountingModel {
        summaries: AtomicUsize,
        embeddings: AtomicUsize,
    }

    #[async_trait]
    impl InferenceModel for CountingModel {
        fn name(&self) -> &str {
            "counting"
        }

        async fn summarize(&self, text: &str) -> Result<String> {
            self.summaries.fetch_add(1, Ordering::SeqCst);
            Ok(format!("Summary of {} chars", text.len()))
        }

        async fn summarize_and_title(&self, _text: &str) -> Result<TitledSummary> {
            Ok(TitledSummary::default())
        }

        async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
            self.embeddings.fetch_add(1, Ordering::SeqCst);
            if text.contains("poison") {
                return Err(Error::Inference("embedding backend rejected input".to_string()));
            }
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    struct StaticSource {
        batches: Mutex<Vec<Vec<Article>>>,
    }

    impl StaticSource {
        fn new(batches: Vec<Vec<Article>>) -> Self {
            Self {
                batches: Mutex::new(batches),
            }
        }
    }

    #[async_trait]
    impl FeedSource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        async fn fetch_articles(&self) -> Result<Vec<Article>> {
            let mut batches = self.batches.lock().unwrap();
            if batches.is_empty() {
                return Err(Error::Feed("feed exhausted".to_string()));
            }
            Ok(batches.remove(0))
        }
    }

    fn article(slug: &str, content: &str) -> Article {
        Article::new(format!("http://feed.test/{}", slug), slug.to_uppercase(), content, Utc::now())
    }

    #[tokio::test]
    async fn test_ingest_reports_statuses() {
        let storage = Arc::new(InMemoryStorage::new());
        let model = Arc::new(CountingModel::default());
        let mut manager = IngestManager::new(storage.clone(), model.clone());

        let first = vec![
            article("a", "alpha body"),
            article("b", "beta body").with_summary("Provided"),
            article("c", "poison body"),
        ];
        let mut edited = first[0].clone();
        edited.content = "alpha body, corrected".to_string();
        let second = vec![edited, first[1].clone()];
        manager.add_source(Arc::new(StaticSource::new(vec![first, second])));

        let report = manager.ingest_all().await;
        assert_eq!(report, IngestReport { new: 2, updated: 0, unchanged: 0, failed: 1 });
        assert_eq!(storage.count().await.unwrap(), 2);
        assert_eq!(model.summaries.load(Ordering::SeqCst), 2);

        let stored = storage.get_by_url("http://feed.test/b").await.unwrap().unwrap();
        assert_eq!(stored.summary.as_deref(), Some("Provided"));
        assert!(stored.embedding.and_then(|e| e.decode()).is_some());

        let embeddings_before = model.embeddings.load(Ordering::SeqCst);
        let report = manager.ingest_all().await;
        assert_eq!(report, IngestReport { new: 0, updated: 1, unchanged: 1, failed: 0 });
        // Only the edited article is re-embedded.
        assert_eq!(model.embeddings.load(Ordering::SeqCst), embeddings_before + 1);

        // Feed errors are logged, not propagated.
        assert_eq!(manager.ingest_all().await, IngestReport::default());
    }

    #[tokio::test]
    async fn test_run_periodic_stops_after_cycles() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut manager = IngestManager::new(storage.clone(), Arc::new(CountingModel::default()))
            .with_max_concurrency(1);
        manager.add_source(Arc::new(StaticSource::new(vec![
            vec![article("a", "one")],
            vec![article("b", "two")],
        ])));
        assert_eq!(manager.sources().collect::<Vec<_>>(), vec!["static"]);

        manager.run_periodic(Duration::from_millis(5), Some(3)).await;
        assert_eq!(storage.count().await.unwrap(), 2);
    }

    #[test]
    fn test_report_display() {
        let mut report = IngestReport::default();
        report.record(ArticleStatus::New);
        report.record(ArticleStatus::Unchanged);
        report.failed = 1;
        assert_eq!(report.total(), 3);
        assert_eq!(report.to_string(), "🆕 1 new, 📝 0 updated, ⏭️ 1 unchanged, ❌ 1 failed");
    }
}
