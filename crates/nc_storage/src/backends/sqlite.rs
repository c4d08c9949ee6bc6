use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use nc_core::{Article, ArticleStatus, ArticleStorage, Error, Result, StoredEmbedding};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::{rank_by_similarity, status_for};

pub const DEFAULT_DB_PATH: &str = "articles.db";

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        url TEXT PRIMARY KEY,
        id TEXT NOT NULL,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        summary TEXT,
        source TEXT NOT NULL,
        published_at TEXT NOT NULL,
        embedding TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS articles_published_at ON articles (published_at)",
];

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &PathBuf {
        &self.db_path
    }

    async fn fetch(&self, sql: &str, binds: &[Bind<'_>]) -> Result<Vec<Article>> {
        let mut query = sqlx::query(sql);
        for bind in binds {
            query = match bind {
                Bind::Text(text) => query.bind(*text),
                Bind::Int(value) => query.bind(*value),
            };
        }
        let rows = query
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to query articles: {}", e)))?;
        rows.iter().map(row_to_article).collect()
    }
}

enum Bind<'a> {
    Text(&'a str),
    Int(i64),
}

/// Embeddings are kept as JSON text. A value that already is text is
/// written verbatim so it round-trips unchanged.
fn encode_embedding(embedding: &StoredEmbedding) -> Result<String> {
    match embedding.as_raw().as_str() {
        Some(text) => Ok(text.to_string()),
        None => Ok(serde_json::to_string(embedding.as_raw())?),
    }
}

fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_article(row: &SqliteRow) -> Result<Article> {
    let get_text = |column: &str| -> Result<String> {
        row.try_get::<String, _>(column)
            .map_err(|e| Error::Database(format!("Failed to read column {}: {}", column, e)))
    };

    let id = Uuid::parse_str(&get_text("id")?)
        .map_err(|e| Error::Database(format!("Invalid article id: {}", e)))?;
    let published_at = DateTime::parse_from_rfc3339(&get_text("published_at")?)
        .map_err(|e| Error::Database(format!("Failed to parse date: {}", e)))?
        .with_timezone(&Utc);
    let summary: Option<String> = row
        .try_get("summary")
        .map_err(|e| Error::Database(format!("Failed to read column summary: {}", e)))?;
    let embedding: Option<String> = row
        .try_get("embedding")
        .map_err(|e| Error::Database(format!("Failed to read column embedding: {}", e)))?;

    Ok(Article {
        id,
        url: get_text("url")?,
        title: get_text("title")?,
        content: get_text("content")?,
        summary,
        published_at,
        source: get_text("source")?,
        embedding: embedding.map(StoredEmbedding::encoded),
    })
}

fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn store_article(&self, article: &Article) -> Result<ArticleStatus> {
        let existing = self.get_by_url(&article.url).await?;
        let status = status_for(existing.as_ref(), article);
        if status == ArticleStatus::Unchanged {
            return Ok(status);
        }

        let embedding = article.embedding.as_ref().map(encode_embedding).transpose()?;

        sqlx::query(
            r#"
            INSERT INTO articles
            (url, id, title, content, summary, source, published_at, embedding)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                summary = excluded.summary,
                source = excluded.source,
                published_at = excluded.published_at,
                embedding = excluded.embedding
            "#,
        )
        .bind(&article.url)
        .bind(article.id.to_string())
        .bind(&article.title)
        .bind(&article.content)
        .bind(article.summary.as_deref())
        .bind(&article.source)
        .bind(encode_timestamp(&article.published_at))
        .bind(embedding)
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to store article: {}", e)))?;

        Ok(status)
    }

    async fn get_by_url(&self, url: &str) -> Result<Option<Article>> {
        let mut articles = self
            .fetch("SELECT * FROM articles WHERE url = ?", &[Bind::Text(url)])
            .await?;
        Ok(articles.pop())
    }

    async fn search_by_embedding(&self, embedding: &[f32], limit: usize) -> Result<Vec<Article>> {
        let candidates = self
            .fetch("SELECT * FROM articles WHERE embedding IS NOT NULL", &[])
            .await?;
        Ok(rank_by_similarity(embedding, candidates, limit))
    }

    async fn search_by_keyword(&self, query: &str, limit: usize) -> Result<Vec<Article>> {
        let pattern = like_pattern(query);
        self.fetch(
            r#"
            SELECT * FROM articles
            WHERE title LIKE ?1 ESCAPE '\' OR content LIKE ?1 ESCAPE '\'
            ORDER BY published_at DESC
            LIMIT ?2
            "#,
            &[Bind::Text(&pattern), Bind::Int(limit as i64)],
        )
        .await
    }

    async fn list_recent(&self, limit: usize, offset: usize) -> Result<Vec<Article>> {
        self.fetch(
            "SELECT * FROM articles ORDER BY published_at DESC LIMIT ? OFFSET ?",
            &[Bind::Int(limit as i64), Bind::Int(offset as i64)],
        )
        .await
    }

    async fn delete_article(&self, url: &str) -> Result<()> {
        sqlx::query("DELETE FROM articles WHERE url = ?")
            .bind(url)
            .execute(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to delete article: {}", e)))?;
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to count articles: {}", e)))?;
        Ok(count as usize)
    }
}
