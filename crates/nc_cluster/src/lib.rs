//! On-demand topic clustering of retrieved articles.
//!
//! Stored embeddings are decoded into an [`EmbeddingMatrix`], partitioned by
//! k-means with an automatically selected k ([`ClusterEngine`]), and each
//! group gets a generated title and summary ([`SummaryFanout`]). The
//! [`ClusterPipeline`] ties these together and degrades to "no clusters"
//! rather than failing.

pub mod assembler;
pub mod engine;
pub mod fanout;
pub mod kmeans;
pub mod matrix;
pub mod pipeline;
pub mod selection;
pub mod types;

pub use assembler::ClusterAssembler;
pub use engine::{ClusterEngine, SweepPoint};
pub use fanout::SummaryFanout;
pub use matrix::EmbeddingMatrix;
pub use pipeline::ClusterPipeline;
pub use selection::{ElbowSelector, KSelector};
pub use types::{
    ClusterAssignment, ClusterId, ClusterResponse, ClusterResult, ClusterSummary, NewsWithClusters,
};

pub mod prelude {
    pub use super::{ClusterPipeline, ClusterResponse, ClusterResult, NewsWithClusters};
    pub use nc_core::{KRange, PipelineConfig};
}
