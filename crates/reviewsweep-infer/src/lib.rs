//! ReviewSweep Infer: embedding engine and semantic review classifier.
//!
//! Provides the `EmbedderBackend` trait for generating embeddings.
//! When the `onnx` feature is enabled and model files are present,
//! `OnnxEmbedder` loads a MiniLM sentence-transformer. Without it,
//! `HashingEmbedder` keeps classification deterministic and available.

pub mod cache;
pub mod classifier;
pub mod embedder;
pub mod hashing;
pub mod onnx_embedder;
pub mod taxonomy;

pub use cache::QueryCache;
pub use classifier::{
    filter_by_category, Classification, ClassificationResult, KeyTokens, SemanticClassifier,
    Validation, DEFAULT_KEY_TOKENS,
};
pub use embedder::{cosine_similarity, EmbedderBackend, EmbeddingResult};
pub use hashing::HashingEmbedder;
pub use taxonomy::{CategoryDef, Taxonomy};

#[cfg(feature = "onnx")]
pub use onnx_embedder::OnnxEmbedder;

use std::path::Path;
use std::sync::Arc;

/// Dimension shared by MiniLM models and the hashing fallback.
pub const DEFAULT_DIM: usize = 384;

/// Create the best available embedder for the given model directory.
///
/// Tries ONNX first (if feature enabled and model files present),
/// falls back to `HashingEmbedder`.
pub fn create_embedder(model_dir: &Path) -> Arc<dyn EmbedderBackend> {
    #[cfg(feature = "onnx")]
    {
        match OnnxEmbedder::load(model_dir) {
            Ok(embedder) => {
                tracing::info!("Using ONNX embedder (dim={})", embedder.dimension());
                return Arc::new(embedder);
            }
            Err(e) => {
                tracing::warn!("ONNX embedder unavailable: {}. Falling back to hashing embedder.", e);
            }
        }
    }

    #[cfg(not(feature = "onnx"))]
    {
        let _ = model_dir;
        tracing::info!("ONNX feature disabled. Using hashing embedder.");
    }

    Arc::new(HashingEmbedder::new(DEFAULT_DIM))
}
