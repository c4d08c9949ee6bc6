use std::sync::Arc;

use nc_cluster::ClusterPipeline;
use nc_core::{ArticleStorage, InferenceModel, PipelineConfig};
use nc_inference::embeddings::EmbeddingGenerator;

pub struct AppState {
    pub storage: Arc<dyn ArticleStorage>,
    pub embeddings: EmbeddingGenerator,
    pub pipeline: ClusterPipeline,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn ArticleStorage>,
        inference_model: Arc<dyn InferenceModel>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            storage,
            embeddings: EmbeddingGenerator::new(inference_model.clone()),
            pipeline: ClusterPipeline::new(inference_model, config),
        }
    }
}
