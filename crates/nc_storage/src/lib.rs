use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use nc_core::{
    cosine_similarity, Article, ArticleStatus, ArticleStorage, EmbeddingAdapter, Error, Result, StoredEmbedding,
};
use tracing::info;

pub mod backends;

pub use backends::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    #[default]
    Memory,
    Sqlite,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::Storage(format!("Unknown storage backend: {}", other))),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub kind: StorageKind,
    /// Database file for the sqlite backend.
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn new(kind: StorageKind) -> Self {
        Self { kind, path: None }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

pub async fn create_storage(config: &StorageConfig) -> Result<Arc<dyn ArticleStorage>> {
    let storage: Arc<dyn ArticleStorage> = match config.kind {
        StorageKind::Memory => Arc::new(InMemoryStorage::new()),
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => {
            let path = config
                .path
                .clone()
                .unwrap_or_else(|| PathBuf::from(sqlite::DEFAULT_DB_PATH));
            Arc::new(SQLiteStorage::new_with_path(&path).await?)
        }
        #[cfg(not(feature = "sqlite"))]
        StorageKind::Sqlite => {
            return Err(Error::Storage(
                "sqlite support was not compiled in (enable the `sqlite` feature)".to_string(),
            ))
        }
    };
    info!("💾 Storage backend ready (using {})", config.kind);
    Ok(storage)
}

/// Two stored embeddings are the same when they decode to the same vector,
/// whatever encoding each backend hands back. Undecodable values compare raw.
fn same_embedding(a: Option<&StoredEmbedding>, b: Option<&StoredEmbedding>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => match (EmbeddingAdapter::decode(a), EmbeddingAdapter::decode(b)) {
            (Some(x), Some(y)) => x == y,
            (None, None) => a == b,
            _ => false,
        },
        _ => false,
    }
}

/// Upsert status of `incoming` against what is already stored under its URL.
///
/// Timestamps compare at microsecond precision, the finest the sqlite
/// backend keeps.
pub fn status_for(existing: Option<&Article>, incoming: &Article) -> ArticleStatus {
    match existing {
        None => ArticleStatus::New,
        Some(existing)
            if existing.title == incoming.title
                && existing.content == incoming.content
                && existing.summary == incoming.summary
                && existing.published_at.timestamp_micros() == incoming.published_at.timestamp_micros()
                && existing.source == incoming.source
                && same_embedding(existing.embedding.as_ref(), incoming.embedding.as_ref()) =>
        {
            ArticleStatus::Unchanged
        }
        Some(_) => ArticleStatus::Updated,
    }
}

/// Rank articles by cosine similarity to `query`, most similar first.
/// Articles without a usable embedding of the query's dimension are skipped.
pub fn rank_by_similarity(query: &[f32], articles: Vec<Article>, limit: usize) -> Vec<Article> {
    let mut scored: Vec<(f32, Article)> = articles
        .into_iter()
        .filter_map(|article| {
            let vector = article.embedding.as_ref().and_then(EmbeddingAdapter::decode)?;
            if vector.len() != query.len() {
                return None;
            }
            Some((cosine_similarity(query, &vector), article))
        })
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().take(limit).map(|(_, article)| article).collect()
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageConfig, StorageKind};
}
