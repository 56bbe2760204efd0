//! Embedding engine trait and vector helpers.
//!
//! The `EmbedderBackend` trait abstracts over embedding generation.
//! Implementations:
//! - `OnnxEmbedder`: ONNX Runtime with a MiniLM sentence-transformer (feature `onnx`)
//! - `HashingEmbedder`: signed feature hashing, no model files required

use ndarray::Array1;
use reviewsweep_core::Result;

/// Result of an embedding operation.
pub struct EmbeddingResult {
    /// Float32 embedding vector.
    pub embedding: Array1<f32>,
    /// Whether this was served from cache.
    pub cached: bool,
}

/// Trait for embedding backends.
///
/// Implementations are shared read-only across sessions, so they must be
/// `Send + Sync` and must not change their output for a given input.
pub trait EmbedderBackend: Send + Sync {
    /// Generate an embedding for a text string.
    fn embed(&self, text: &str) -> Result<EmbeddingResult>;

    /// Generate embeddings for a batch of texts.
    fn embed_batch(&self, texts: &[&str]) -> Vec<Result<EmbeddingResult>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;

    /// Check if the embedder is available (model loaded).
    fn is_available(&self) -> bool;

    /// Whether similar meanings land close together even without shared
    /// words. Lexical backends return `false`.
    fn is_semantic(&self) -> bool {
        true
    }
}

/// Cosine similarity of two vectors. Zero-norm input yields 0.0.
pub fn cosine_similarity(a: &Array1<f32>, b: &Array1<f32>) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let norm_a = a.dot(a).sqrt();
    let norm_b = b.dot(b).sqrt();
    if norm_a < 1e-9 || norm_b < 1e-9 {
        return 0.0;
    }
    a.dot(b) / (norm_a * norm_b)
}
