//! Model-free embedder based on signed feature hashing.
//!
//! Each lowercase alphanumeric word is hashed with SHA-256; the first four
//! digest bytes pick a bucket and the fifth picks the sign. The bag of
//! words is L2-normalised. Texts sharing words get positive similarity and
//! nothing else does, so callers must compare against word-rich targets.

use ndarray::Array1;
use reviewsweep_core::{Error, Result};
use sha2::{Digest, Sha256};

use crate::embedder::{EmbedderBackend, EmbeddingResult};

pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn bucket(&self, word: &str) -> (usize, f32) {
        let digest = Sha256::digest(word.as_bytes());
        let idx = u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize % self.dim;
        let sign = if digest[4] & 1 == 0 { 1.0 } else { -1.0 };
        (idx, sign)
    }
}

impl EmbedderBackend for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<EmbeddingResult> {
        let lower = text.to_lowercase();
        let mut embedding = Array1::<f32>::zeros(self.dim);
        let mut words = 0usize;

        for word in lower.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let (idx, sign) = self.bucket(word);
            embedding[idx] += sign;
            words += 1;
        }

        if words == 0 {
            return Err(Error::Inference(format!("no embeddable words in {:?}", text)));
        }

        let norm = embedding.dot(&embedding).sqrt();
        if norm > 0.0 {
            embedding /= norm;
        }

        Ok(EmbeddingResult {
            embedding,
            cached: false,
        })
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_available(&self) -> bool {
        true
    }

    fn is_semantic(&self) -> bool {
        false
    }
}
