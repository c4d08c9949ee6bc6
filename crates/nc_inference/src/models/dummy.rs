use std::fmt;

use nc_core::{InferenceModel, Result, TitledSummary};

use crate::{Config, ModelProvider};

const SUMMARY_WORDS: usize = 20;
const TITLE_WORDS: usize = 8;

/// Offline model: word-prefix summaries and hashed bag-of-words embeddings.
/// Output depends only on the input text.
pub struct DummyModel {
    dim: usize,
}

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").field("dim", &self.dim).finish()
    }
}

impl DummyModel {
    pub fn new(config: Option<Config>) -> Self {
        let dim = config
            .map(|c| c.embedding_dim)
            .unwrap_or_else(|| ModelProvider::Dummy.default_embedding_dim())
            .max(1);
        Self { dim }
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }
}

fn first_words(text: &str, n: usize) -> String {
    text.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
}

// FNV-1a, stable across builds unlike `DefaultHasher`.
fn fnv1a(word: &str) -> u64 {
    word.bytes().fold(0xcbf29ce484222325, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x100000001b3)
    })
}

#[async_trait::async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        Ok(first_words(text, SUMMARY_WORDS))
    }

    async fn summarize_and_title(&self, text: &str) -> Result<TitledSummary> {
        if text.trim().is_empty() {
            return Ok(TitledSummary::default());
        }
        let first_sentence = text
            .split(['.', '!', '?'])
            .find(|s| !s.trim().is_empty())
            .unwrap_or(text);
        Ok(TitledSummary::new(
            first_words(first_sentence, TITLE_WORDS),
            first_words(text, SUMMARY_WORDS),
        ))
    }

    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0_f32; self.dim];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let index = (fnv1a(&word.to_lowercase()) % self.dim as u64) as usize;
            embedding[index] += 1.0;
        }

        let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(embedding)
    }
}
