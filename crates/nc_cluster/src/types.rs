use nc_core::Article;
use serde::{Deserialize, Serialize};

pub type ClusterId = usize;

pub const DEFAULT_SUMMARY: &str = "No summary available.";

pub fn default_title(cluster_id: ClusterId) -> String {
    format!("Cluster {}", cluster_id)
}

/// Label per clustered article. Only articles with a usable embedding appear.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClusterAssignment {
    /// `(input position, label)` in input order.
    members: Vec<(usize, ClusterId)>,
    k: usize,
}

impl ClusterAssignment {
    pub fn new(sources: &[usize], labels: &[ClusterId], k: usize) -> Self {
        Self {
            members: sources.iter().copied().zip(labels.iter().copied()).collect(),
            k,
        }
    }

    /// Everything in one cluster.
    pub fn single(sources: &[usize]) -> Self {
        let k = usize::from(!sources.is_empty());
        Self::new(sources, &vec![0; sources.len()], k)
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn label_of(&self, position: usize) -> Option<ClusterId> {
        self.members
            .iter()
            .find(|(p, _)| *p == position)
            .map(|(_, label)| *label)
    }

    /// Input positions in `label`, in input order.
    pub fn members_of(&self, label: ClusterId) -> impl Iterator<Item = usize> + '_ {
        self.members
            .iter()
            .filter(move |(_, l)| *l == label)
            .map(|(p, _)| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, ClusterId)> + '_ {
        self.members.iter().copied()
    }
}

/// Generated text for one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub title: String,
    pub summary: String,
}

impl ClusterSummary {
    pub fn fallback(cluster_id: ClusterId) -> Self {
        Self {
            title: default_title(cluster_id),
            summary: DEFAULT_SUMMARY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterResult {
    pub cluster_id: ClusterId,
    pub title: String,
    pub summary: String,
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterResponse {
    pub clusters: Vec<ClusterResult>,
}

impl ClusterResponse {
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

/// The raw article list together with its clusters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewsWithClusters {
    pub articles: Vec<Article>,
    pub clusters: Vec<ClusterResult>,
}
