use std::collections::HashMap;

use nc_core::Article;

use crate::types::{ClusterAssignment, ClusterId, ClusterResult, ClusterSummary};

pub struct ClusterAssembler;

impl ClusterAssembler {
    /// Member text per cluster, joined with spaces in retrieval order.
    pub fn cluster_texts(assignment: &ClusterAssignment, articles: &[Article]) -> Vec<(ClusterId, String)> {
        (0..assignment.k())
            .map(|label| {
                let text = assignment
                    .members_of(label)
                    .filter_map(|p| articles.get(p))
                    .map(raw_text)
                    .collect::<Vec<_>>()
                    .join(" ");
                (label, text)
            })
            .collect()
    }

    /// Clusters in ascending label order, each with its members in
    /// retrieval order. Labels missing from `summaries` get the defaults.
    pub fn assemble(
        assignment: &ClusterAssignment,
        articles: &[Article],
        summaries: &HashMap<ClusterId, ClusterSummary>,
    ) -> Vec<ClusterResult> {
        (0..assignment.k())
            .map(|label| {
                let summary = summaries
                    .get(&label)
                    .cloned()
                    .unwrap_or_else(|| ClusterSummary::fallback(label));
                ClusterResult {
                    cluster_id: label,
                    title: summary.title,
                    summary: summary.summary,
                    articles: assignment
                        .members_of(label)
                        .filter_map(|p| articles.get(p).cloned())
                        .collect(),
                }
            })
            .collect()
    }
}

fn raw_text(article: &Article) -> &str {
    if article.content.trim().is_empty() {
        &article.title
    } else {
        &article.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn articles() -> Vec<Article> {
        ["alpha", "beta", "gamma", "delta"]
            .iter()
            .map(|name| Article::new(format!("http://{}", name), name.to_uppercase(), format!("{} body", name), Utc::now()))
            .collect()
    }

    #[test]
    fn test_cluster_texts_follow_retrieval_order() {
        let assignment = ClusterAssignment::new(&[0, 1, 2, 3], &[0, 1, 0, 1], 2);
        let texts = ClusterAssembler::cluster_texts(&assignment, &articles());
        assert_eq!(
            texts,
            vec![(0, "alpha body gamma body".to_string()), (1, "beta body delta body".to_string())]
        );
    }

    #[test]
    fn test_assemble_orders_by_label() {
        let articles = articles();
        let assignment = ClusterAssignment::new(&[0, 1, 3], &[1, 0, 1], 2);
        let mut summaries = HashMap::new();
        summaries.insert(1, ClusterSummary { title: "Greek".into(), summary: "Letters".into() });

        let clusters = ClusterAssembler::assemble(&assignment, &articles, &summaries);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].cluster_id, 0);
        assert_eq!(clusters[0].title, "Cluster 0");
        assert_eq!(clusters[0].articles, vec![articles[1].clone()]);
        assert_eq!(clusters[1].title, "Greek");
        let urls: Vec<&str> = clusters[1].articles.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["http://alpha", "http://delta"]);
    }

    #[test]
    fn test_title_stands_in_for_empty_body() {
        let article = Article::new("http://x", "Headline only", "", Utc::now());
        let assignment = ClusterAssignment::single(&[0]);
        let texts = ClusterAssembler::cluster_texts(&assignment, &[article]);
        assert_eq!(texts[0].1, "Headline only");
    }
}
