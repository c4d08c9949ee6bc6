use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use nc_cluster::NewsWithClusters;
use nc_core::config::{DEFAULT_K_MAX, DEFAULT_K_MIN};
use nc_core::{Article, KRange};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_CLUSTER_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 200;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub articles: usize,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<Health>, ApiError> {
    let articles = state.storage.count().await?;
    Ok(Json(Health {
        status: "ok",
        articles,
    }))
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: usize,
    pub limit: Option<usize>,
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Article>>, ApiError> {
    let limit = page.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_LIMIT);
    Ok(Json(state.storage.list_recent(limit, page.skip).await?))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

pub async fn search_articles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Article>>, ApiError> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing search query `q`"))?;
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_LIMIT);
    Ok(Json(state.storage.search_by_keyword(query, limit).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct ClusterRequest {
    pub query: Option<String>,
    pub limit: Option<usize>,
    pub k_min: Option<usize>,
    pub k_max: Option<usize>,
}

impl ClusterRequest {
    fn k_range(&self) -> Result<Option<KRange>, ApiError> {
        if self.k_min.is_none() && self.k_max.is_none() {
            return Ok(None);
        }
        let range = KRange::new(
            self.k_min.unwrap_or(DEFAULT_K_MIN),
            self.k_max.unwrap_or(DEFAULT_K_MAX),
        )?;
        Ok(Some(range))
    }
}

/// Retrieve candidates (nearest to `query`, or most recent) and cluster them.
/// Clustering failures still return the articles, with no clusters.
pub async fn cluster_articles(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ClusterRequest>,
) -> Result<Json<NewsWithClusters>, ApiError> {
    let k_range = request.k_range()?;
    let limit = request.limit.unwrap_or(DEFAULT_CLUSTER_LIMIT).min(MAX_LIMIT);

    let articles = match request.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(query) => {
            let embedding = state.embeddings.generate_text_embedding(query).await?;
            state.storage.search_by_embedding(&embedding, limit).await?
        }
        None => state.storage.list_recent(limit, 0).await?,
    };
    info!("🔍 Clustering {} candidate articles", articles.len());

    Ok(Json(state.pipeline.cluster_news(articles, k_range).await))
}
