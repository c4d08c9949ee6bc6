//! Stored embedding values and their conversion to numeric vectors.
//!
//! Backends do not agree on how an embedding comes back: a native float
//! array, a JSON-encoded string, or a one-element array wrapping that string.
//! [`EmbeddingAdapter`] runs an ordered series of typed decode attempts over
//! the stored value; the first success wins and anything else is unusable.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredEmbedding(Value);

impl StoredEmbedding {
    pub fn from_raw(value: Value) -> Self {
        Self(value)
    }

    /// An embedding kept as JSON text, the way text columns store it.
    pub fn encoded(text: impl Into<String>) -> Self {
        Self(Value::String(text.into()))
    }

    pub fn as_raw(&self) -> &Value {
        &self.0
    }

    pub fn decode(&self) -> Option<Vec<f32>> {
        EmbeddingAdapter::decode(self)
    }
}

impl From<Vec<f32>> for StoredEmbedding {
    fn from(vector: Vec<f32>) -> Self {
        Self(Value::from(vector))
    }
}

impl From<&[f32]> for StoredEmbedding {
    fn from(vector: &[f32]) -> Self {
        Self(Value::from(vector.to_vec()))
    }
}

/// `None` when the value does not have the shape the attempt handles,
/// `Some(Err(_))` when it has the shape but fails to parse.
type DecodeAttempt = fn(&Value) -> Option<Result<Vec<f32>>>;

pub fn try_decode_native(value: &Value) -> Option<Result<Vec<f32>>> {
    let items = value.as_array()?;
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|item| item.as_f64().map(|x| x as f32))
        .collect::<Option<Vec<f32>>>()
        .map(Ok)
}

pub fn try_decode_wrapped_json(value: &Value) -> Option<Result<Vec<f32>>> {
    match value.as_array()?.as_slice() {
        [Value::String(inner)] => Some(parse_json_vector(inner)),
        _ => None,
    }
}

pub fn try_decode_json_string(value: &Value) -> Option<Result<Vec<f32>>> {
    value.as_str().map(parse_json_vector)
}

fn parse_json_vector(text: &str) -> Result<Vec<f32>> {
    let vector: Vec<f32> = serde_json::from_str(text.trim())?;
    if vector.is_empty() {
        return Err(crate::Error::InvalidInput("empty embedding".to_string()));
    }
    Ok(vector)
}

pub struct EmbeddingAdapter;

impl EmbeddingAdapter {
    const ATTEMPTS: [(&'static str, DecodeAttempt); 3] = [
        ("native", try_decode_native),
        ("wrapped_json", try_decode_wrapped_json),
        ("json_string", try_decode_json_string),
    ];

    /// Decode one stored embedding, or `None` if it is unusable.
    pub fn decode(stored: &StoredEmbedding) -> Option<Vec<f32>> {
        for (name, attempt) in Self::ATTEMPTS {
            match attempt(stored.as_raw()) {
                Some(Ok(vector)) => {
                    debug!("Decoded {}-dimensional embedding via {}", vector.len(), name);
                    return Some(vector);
                }
                Some(Err(e)) => {
                    warn!("Failed to decode {} embedding: {}", name, e);
                }
                None => {}
            }
        }
        None
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
