use std::sync::Arc;
use std::time::Duration;

use nc_core::{Article, Error, InferenceModel, KRange, PipelineConfig, Result, StoredEmbedding};
use tracing::{info, warn};

use crate::assembler::ClusterAssembler;
use crate::engine::ClusterEngine;
use crate::fanout::SummaryFanout;
use crate::selection::KSelector;
use crate::types::{ClusterResponse, NewsWithClusters};

/// Cluster a candidate article set and summarize every cluster.
#[derive(Debug, Clone)]
pub struct ClusterPipeline {
    engine: ClusterEngine,
    fanout: SummaryFanout,
    deadline: Option<Duration>,
}

impl ClusterPipeline {
    pub fn new(model: Arc<dyn InferenceModel>, config: PipelineConfig) -> Self {
        Self {
            engine: ClusterEngine::new(config.cluster),
            fanout: SummaryFanout::new(model, config.max_concurrency),
            deadline: config.deadline,
        }
    }

    pub fn with_selector(mut self, selector: Arc<dyn KSelector>) -> Self {
        self.engine = ClusterEngine::with_selector(self.engine.config().clone(), selector);
        self
    }

    pub fn engine(&self) -> &ClusterEngine {
        &self.engine
    }

    /// Like [`ClusterPipeline::cluster_and_summarize`] but reports why
    /// clustering produced nothing.
    pub async fn try_cluster_and_summarize(
        &self,
        articles: &[Article],
        k_range: Option<KRange>,
    ) -> Result<ClusterResponse> {
        let work = self.run(articles, k_range);
        match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, work)
                .await
                .map_err(|_| Error::Timeout(deadline))?,
            None => work.await,
        }
    }

    /// Never fails: any error degrades to an empty cluster list.
    pub async fn cluster_and_summarize(
        &self,
        articles: &[Article],
        k_range: Option<KRange>,
    ) -> ClusterResponse {
        match self.try_cluster_and_summarize(articles, k_range).await {
            Ok(response) => response,
            Err(e) => {
                warn!("⚠️ Clustering unavailable, returning articles only: {}", e);
                ClusterResponse::default()
            }
        }
    }

    /// The articles, untouched, alongside their clusters.
    pub async fn cluster_news(&self, articles: Vec<Article>, k_range: Option<KRange>) -> NewsWithClusters {
        let response = self.cluster_and_summarize(&articles, k_range).await;
        NewsWithClusters {
            articles,
            clusters: response.clusters,
        }
    }

    async fn run(&self, articles: &[Article], k_range: Option<KRange>) -> Result<ClusterResponse> {
        if articles.is_empty() {
            return Ok(ClusterResponse::default());
        }

        let stored: Vec<Option<StoredEmbedding>> = articles.iter().map(|a| a.embedding.clone()).collect();
        let assignment = self.engine.cluster_stored(stored, k_range).await?;
        if assignment.is_empty() {
            info!("No article in {} candidates has a usable embedding", articles.len());
            return Ok(ClusterResponse::default());
        }

        let texts = ClusterAssembler::cluster_texts(&assignment, articles);
        let summaries = self.fanout.summarize(texts).await?;
        Ok(ClusterResponse {
            clusters: ClusterAssembler::assemble(&assignment, articles, &summaries),
        })
    }
}
