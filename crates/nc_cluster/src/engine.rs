use std::sync::Arc;

use nc_core::{ClusterConfig, Error, KRange, Result, StoredEmbedding};
use tracing::{debug, info};

use crate::kmeans::{self, KMeansParams};
use crate::matrix::EmbeddingMatrix;
use crate::selection::{ElbowSelector, KSelector};
use crate::types::ClusterAssignment;

/// Inertia of one fit in a k sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPoint {
    pub k: usize,
    pub inertia: f64,
}

#[derive(Debug, Clone)]
pub struct ClusterEngine {
    config: ClusterConfig,
    selector: Arc<dyn KSelector>,
}

impl ClusterEngine {
    pub fn new(config: ClusterConfig) -> Self {
        Self::with_selector(config, Arc::new(ElbowSelector))
    }

    pub fn with_selector(config: ClusterConfig, selector: Arc<dyn KSelector>) -> Self {
        Self { config, selector }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    fn params(&self) -> KMeansParams {
        KMeansParams::from(&self.config)
    }

    /// Fit every k from `range.min - lookbehind` (at least 1) to `range.max`.
    pub fn sweep(&self, matrix: &EmbeddingMatrix, range: KRange) -> Vec<SweepPoint> {
        let params = self.params();
        let start = range.min.saturating_sub(self.selector.lookbehind()).max(1);
        (start..=range.max)
            .map(|k| SweepPoint {
                k,
                inertia: kmeans::fit(matrix, k, &params).inertia,
            })
            .collect()
    }

    /// Choose k and label every row of `matrix`. CPU bound; call it off the
    /// async runtime (see [`ClusterEngine::cluster_stored`]).
    pub fn cluster(&self, matrix: &EmbeddingMatrix, k_range: Option<KRange>) -> ClusterAssignment {
        let n = matrix.rows();
        let requested = k_range.unwrap_or(self.config.k_range);
        let Some(range) = requested.clip_to(n) else {
            debug!("Only {} embedded articles, using a single cluster", n);
            return ClusterAssignment::single(matrix.sources());
        };

        let sweep = self.sweep(matrix, range);
        let ks: Vec<usize> = sweep.iter().map(|p| p.k).collect();
        let inertias: Vec<f64> = sweep.iter().map(|p| p.inertia).collect();
        let k = self.selector.select_k(&inertias, &ks, range);
        debug!("Inertia sweep {:?} selected k={}", sweep, k);

        let fit = kmeans::fit(matrix, k, &self.params());
        info!(
            "🧩 Clustered {} articles into {} groups (k range {}..={})",
            n, fit.k, range.min, range.max
        );
        ClusterAssignment::new(matrix.sources(), &fit.labels, fit.k)
    }

    /// Decode `stored` and cluster it on the blocking pool.
    pub async fn cluster_stored(
        &self,
        stored: Vec<Option<StoredEmbedding>>,
        k_range: Option<KRange>,
    ) -> Result<ClusterAssignment> {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || {
            let matrix = EmbeddingMatrix::from_stored(&stored, engine.config.embedding_dim);
            engine.cluster(&matrix, k_range)
        })
        .await
        .map_err(|e| Error::Clustering(format!("Clustering task failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triads() -> EmbeddingMatrix {
        let points = [
            [0.0, 0.0],
            [0.2, 0.1],
            [0.1, 0.3],
            [10.0, 10.0],
            [10.2, 9.9],
            [9.8, 10.1],
        ];
        EmbeddingMatrix::from_vectors(points.iter().enumerate().map(|(i, p)| (i, p.to_vec())), None)
    }

    #[test]
    fn test_triads_choose_two() {
        let engine = ClusterEngine::new(ClusterConfig::default());
        let assignment = engine.cluster(&triads(), Some(KRange::new(2, 4).unwrap()));

        assert_eq!(assignment.k(), 2);
        let first: Vec<usize> = assignment.members_of(0).collect();
        let second: Vec<usize> = assignment.members_of(1).collect();
        assert_eq!(first, vec![0, 1, 2]);
        assert_eq!(second, vec![3, 4, 5]);
    }

    #[test]
    fn test_sweep_includes_anchor() {
        let engine = ClusterEngine::new(ClusterConfig::default());
        let ks: Vec<usize> = engine
            .sweep(&triads(), KRange::new(2, 4).unwrap())
            .iter()
            .map(|p| p.k)
            .collect();
        assert_eq!(ks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_tiny_inputs_form_one_cluster() {
        let engine = ClusterEngine::new(ClusterConfig::default());
        let two = EmbeddingMatrix::from_vectors(vec![(4, vec![1.0, 0.0]), (7, vec![0.0, 1.0])], None);
        let assignment = engine.cluster(&two, None);
        assert_eq!(assignment.k(), 1);
        assert_eq!(assignment.members_of(0).collect::<Vec<_>>(), vec![4, 7]);

        let none = EmbeddingMatrix::from_vectors(Vec::new(), None);
        assert!(engine.cluster(&none, None).is_empty());
    }

    #[derive(Debug)]
    struct AlwaysMax;

    impl KSelector for AlwaysMax {
        fn select_k(&self, _inertias: &[f64], _ks: &[usize], range: KRange) -> usize {
            range.max
        }
    }

    #[test]
    fn test_custom_selector() {
        let engine = ClusterEngine::with_selector(ClusterConfig::default(), Arc::new(AlwaysMax));
        let assignment = engine.cluster(&triads(), Some(KRange::new(2, 3).unwrap()));
        assert_eq!(assignment.k(), 3);
    }

    #[tokio::test]
    async fn test_cluster_stored_off_runtime() {
        let engine = ClusterEngine::new(ClusterConfig::default().with_k_range(KRange::new(2, 4).unwrap()));
        let stored = vec![
            Some(StoredEmbedding::from(vec![0.0_f32, 0.0])),
            Some(StoredEmbedding::encoded("[0.1, 0.2]")),
            None,
            Some(StoredEmbedding::from(vec![9.0_f32, 9.0])),
            Some(StoredEmbedding::encoded("[9.1, 9.2]")),
            Some(StoredEmbedding::encoded("[0.2, 0.1]")),
            Some(StoredEmbedding::encoded("[9.2, 9.1]")),
        ];

        let assignment = engine.cluster_stored(stored, None).await.unwrap();
        assert_eq!(assignment.len(), 6);
        assert_eq!(assignment.label_of(2), None);
        assert_eq!(assignment.label_of(0), assignment.label_of(5));
        assert_ne!(assignment.label_of(0), assignment.label_of(3));
    }
}
