use nc_core::{EmbeddingAdapter, StoredEmbedding};
use tracing::warn;

/// Row-major N×D matrix of decoded embeddings. Each row remembers the
/// position of the article it came from in the caller's input.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    data: Vec<f32>,
    dim: usize,
    sources: Vec<usize>,
}

impl EmbeddingMatrix {
    /// Build from `(source index, vector)` pairs. Rows whose length differs
    /// from `expected_dim` (or from the first row when unset) are dropped.
    pub fn from_vectors<I>(vectors: I, expected_dim: Option<usize>) -> Self
    where
        I: IntoIterator<Item = (usize, Vec<f32>)>,
    {
        let mut dim = expected_dim;
        let mut data = Vec::new();
        let mut sources = Vec::new();

        for (source, vector) in vectors {
            if vector.is_empty() {
                continue;
            }
            let expected = *dim.get_or_insert(vector.len());
            if vector.len() != expected {
                warn!(
                    "⚠️ Dropping embedding #{} with dimension {} (expected {})",
                    source,
                    vector.len(),
                    expected
                );
                continue;
            }
            data.extend_from_slice(&vector);
            sources.push(source);
        }

        Self {
            data,
            dim: dim.unwrap_or(0),
            sources,
        }
    }

    /// Decode stored embeddings, skipping absent or unusable ones.
    pub fn from_stored(stored: &[Option<StoredEmbedding>], expected_dim: Option<usize>) -> Self {
        let decoded = stored.iter().enumerate().filter_map(|(i, embedding)| {
            let vector = EmbeddingAdapter::decode(embedding.as_ref()?);
            if vector.is_none() {
                warn!("⚠️ Dropping unusable embedding #{}", i);
            }
            vector.map(|v| (i, v))
        });
        Self::from_vectors(decoded, expected_dim)
    }

    pub fn rows(&self) -> usize {
        self.sources.len()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        (0..self.rows()).map(move |i| self.row(i))
    }

    /// Input positions of the rows, in row order.
    pub fn sources(&self) -> &[usize] {
        &self.sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_stored_mixed_encodings() {
        let stored = vec![
            Some(StoredEmbedding::from(vec![1.0_f32, 2.0])),
            None,
            Some(StoredEmbedding::encoded("[3.0, 4.0]")),
            Some(StoredEmbedding::encoded("[broken")),
            Some(StoredEmbedding::from_raw(json!(["[5.0, 6.0]"]))),
        ];

        let matrix = EmbeddingMatrix::from_stored(&stored, None);
        assert_eq!(matrix.rows(), 3);
        assert_eq!(matrix.dim(), 2);
        assert_eq!(matrix.sources(), &[0, 2, 4]);
        assert_eq!(matrix.row(1), &[3.0, 4.0]);
        assert_eq!(matrix.iter_rows().count(), 3);
    }

    #[test]
    fn test_dimension_mismatch_dropped() {
        let vectors = vec![(0, vec![1.0, 0.0]), (1, vec![1.0, 0.0, 0.0]), (2, vec![0.0, 1.0])];
        let matrix = EmbeddingMatrix::from_vectors(vectors.clone(), None);
        assert_eq!(matrix.sources(), &[0, 2]);

        let matrix = EmbeddingMatrix::from_vectors(vectors, Some(3));
        assert_eq!(matrix.sources(), &[1]);
        assert_eq!(matrix.dim(), 3);
    }

    #[test]
    fn test_empty_input() {
        let matrix = EmbeddingMatrix::from_stored(&[None, None], None);
        assert!(matrix.is_empty());
        assert_eq!(matrix.dim(), 0);
    }
}
