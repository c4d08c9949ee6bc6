pub mod config;
pub mod embedding;
pub mod error;
pub mod models;
pub mod storage;
pub mod types;

pub use config::{ClusterConfig, KRange, PipelineConfig};
pub use embedding::{cosine_similarity, EmbeddingAdapter, StoredEmbedding};
pub use error::{Error, Result};
pub use models::InferenceModel;
pub use storage::ArticleStorage;
pub use types::{Article, ArticleId, ArticleStatus, TitledSummary};
