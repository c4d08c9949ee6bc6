use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use nc_core::{Error, InferenceModel, Result, TitledSummary};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::types::{default_title, ClusterId, ClusterSummary, DEFAULT_SUMMARY};

/// Fill in whatever the model left out.
pub fn with_defaults(cluster_id: ClusterId, generated: TitledSummary) -> ClusterSummary {
    ClusterSummary {
        title: generated.title.unwrap_or_else(|| default_title(cluster_id)),
        summary: generated.summary.unwrap_or_else(|| DEFAULT_SUMMARY.to_string()),
    }
}

/// One title + summary request per cluster, run concurrently.
#[derive(Debug, Clone)]
pub struct SummaryFanout {
    model: Arc<dyn InferenceModel>,
    max_concurrency: usize,
}

impl SummaryFanout {
    pub fn new(model: Arc<dyn InferenceModel>, max_concurrency: usize) -> Self {
        Self {
            model,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Returns one entry per input cluster. A failed request gets the default
    /// entry; only a fan-out in which every request failed is an error.
    ///
    /// Dropping the returned future aborts all outstanding requests.
    pub async fn summarize(
        &self,
        texts: Vec<(ClusterId, String)>,
    ) -> Result<HashMap<ClusterId, ClusterSummary>> {
        let total = texts.len();
        if total == 0 {
            return Ok(HashMap::new());
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut pending: BTreeSet<ClusterId> = BTreeSet::new();
        let mut tasks = JoinSet::new();
        for (cluster_id, text) in texts {
            pending.insert(cluster_id);
            let model = Arc::clone(&self.model);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                debug!("Summarizing cluster {} ({} chars)", cluster_id, text.len());
                (cluster_id, model.summarize_and_title(&text).await)
            });
        }

        let mut summaries = HashMap::with_capacity(total);
        let mut failures = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((cluster_id, outcome)) => {
                    pending.remove(&cluster_id);
                    let generated = match outcome {
                        Ok(generated) => {
                            if !generated.is_complete() {
                                warn!("⚠️ Incomplete summary for cluster {}, using defaults", cluster_id);
                            }
                            generated
                        }
                        Err(e) => {
                            warn!("⚠️ Summary request for cluster {} failed: {}", cluster_id, e);
                            failures += 1;
                            TitledSummary::default()
                        }
                    };
                    summaries.insert(cluster_id, with_defaults(cluster_id, generated));
                }
                Err(e) => {
                    warn!("⚠️ Summary task failed: {}", e);
                    failures += 1;
                }
            }
        }

        // Tasks that panicked never reported their id.
        for cluster_id in pending {
            summaries.insert(cluster_id, ClusterSummary::fallback(cluster_id));
        }

        if failures == total {
            return Err(Error::Inference(format!(
                "All {} summary requests failed",
                total
            )));
        }
        info!("📝 Summarized {} clusters ({} failed)", total, failures);
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct ScriptedModel {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl InferenceModel for ScriptedModel {
        fn name(&self) -> &str {
            "Scripted"
        }

        async fn summarize(&self, text: &str) -> Result<String> {
            Ok(text.to_string())
        }

        async fn summarize_and_title(&self, text: &str) -> Result<TitledSummary> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match text {
                "fail" => Err(Error::Inference("provider unavailable".to_string())),
                "panic" => panic!("model crashed"),
                "garbled" => Ok(TitledSummary::default()),
                "half" => Ok(TitledSummary {
                    title: Some("Only a title".to_string()),
                    summary: None,
                }),
                other => Ok(TitledSummary::new(format!("About {}", other), other)),
            }
        }

        async fn generate_embeddings(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0])
        }
    }

    #[tokio::test]
    async fn test_one_entry_per_cluster_despite_failures() {
        let model = Arc::new(ScriptedModel::default());
        let fanout = SummaryFanout::new(model.clone(), 8);
        let texts = vec![
            (0, "sports".to_string()),
            (1, "fail".to_string()),
            (2, "garbled".to_string()),
            (3, "half".to_string()),
            (4, "panic".to_string()),
        ];

        let summaries = fanout.summarize(texts).await.unwrap();
        assert_eq!(model.calls.load(Ordering::SeqCst), 5);
        assert_eq!(summaries.len(), 5);
        assert_eq!(summaries[&0], ClusterSummary { title: "About sports".into(), summary: "sports".into() });
        assert_eq!(summaries[&1], ClusterSummary::fallback(1));
        assert_eq!(summaries[&2], ClusterSummary::fallback(2));
        assert_eq!(summaries[&3].title, "Only a title");
        assert_eq!(summaries[&3].summary, "No summary available.");
        assert_eq!(summaries[&4], ClusterSummary::fallback(4));
    }

    #[tokio::test]
    async fn test_all_failures_is_an_error() {
        let fanout = SummaryFanout::new(Arc::new(ScriptedModel::default()), 2);
        let texts = (0..3).map(|id| (id, "fail".to_string())).collect();
        assert!(matches!(fanout.summarize(texts).await, Err(Error::Inference(_))));
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let model = Arc::new(ScriptedModel::default());
        let fanout = SummaryFanout::new(model.clone(), 2);
        let texts = (0..6).map(|id| (id, format!("topic {}", id))).collect();

        let summaries = fanout.summarize(texts).await.unwrap();
        assert_eq!(summaries.len(), 6);
        assert!(model.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_empty_fanout() {
        let fanout = SummaryFanout::new(Arc::new(ScriptedModel::default()), 2);
        assert!(fanout.summarize(Vec::new()).await.unwrap().is_empty());
    }
}
