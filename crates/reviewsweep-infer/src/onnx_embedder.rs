//! ONNX-based embedding engine for MiniLM sentence-transformers.
//!
//! Loads an exported `paraphrase-MiniLM-L6-v2` (or any 384-dim MiniLM
//! variant) plus its HuggingFace tokenizer. Requires the `onnx` feature.

#[cfg(feature = "onnx")]
mod inner {
    use std::path::Path;

    use ndarray::Array1;
    use ort::session::Session;
    use ort::value::Tensor;
    use parking_lot::Mutex;
    use reviewsweep_core::{Error, Result};
    use tokenizers::Tokenizer;
    use tracing::info;

    use crate::cache::QueryCache;
    use crate::embedder::{EmbedderBackend, EmbeddingResult};
    use crate::DEFAULT_DIM;

    /// Reviews are short; longer inputs are truncated.
    const MAX_SEQ_LEN: usize = 256;

    pub struct OnnxEmbedder {
        session: Mutex<Session>,
        tokenizer: Tokenizer,
        cache: QueryCache,
        dimension: usize,
    }

    fn inference_err(context: &str, e: impl std::fmt::Display) -> Error {
        Error::Inference(format!("{}: {}", context, e))
    }

    impl OnnxEmbedder {
        /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
        pub fn load(model_dir: &Path) -> Result<Self> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            if !model_path.exists() {
                return Err(Error::Config(format!("Model not found: {}", model_path.display())));
            }
            if !tokenizer_path.exists() {
                return Err(Error::Config(format!(
                    "Tokenizer not found: {}",
                    tokenizer_path.display()
                )));
            }

            // With load-dynamic, ORT_DYLIB_PATH must point to libonnxruntime.
            ort::init().commit();

            let session = Session::builder()
                .map_err(|e| inference_err("session builder", e))?
                .with_intra_threads(1)
                .map_err(|e| inference_err("thread config", e))?
                .commit_from_file(&model_path)
                .map_err(|e| inference_err("model load", e))?;

            let tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| inference_err("tokenizer load", e))?;

            info!("ONNX embedder loaded: model={}", model_path.display());

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
                cache: QueryCache::default_cache(),
                dimension: DEFAULT_DIM,
            })
        }

        fn infer(&self, text: &str) -> Result<Array1<f32>> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| inference_err("tokenize", e))?;

            let seq_len = encoding.get_ids().len().min(MAX_SEQ_LEN);
            let ids: Vec<i64> = encoding.get_ids()[..seq_len].iter().map(|&id| id as i64).collect();
            let mask: Vec<i64> = encoding.get_attention_mask()[..seq_len]
                .iter()
                .map(|&m| m as i64)
                .collect();
            let type_ids = vec![0i64; seq_len];

            let ids_tensor = Tensor::from_array(([1usize, seq_len], ids))
                .map_err(|e| inference_err("ids tensor", e))?;
            let mask_tensor = Tensor::from_array(([1usize, seq_len], mask.clone()))
                .map_err(|e| inference_err("mask tensor", e))?;
            let type_tensor = Tensor::from_array(([1usize, seq_len], type_ids))
                .map_err(|e| inference_err("type_ids tensor", e))?;

            let mut session = self.session.lock();
            let outputs = session
                .run(ort::inputs![ids_tensor, mask_tensor, type_tensor])
                .map_err(|e| inference_err("run", e))?;

            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| inference_err("extract output", e))?;
            let dims: Vec<i64> = shape.iter().copied().collect();

            match dims.as_slice() {
                // [1, seq_len, dim] token embeddings
                [_, _, dim] => mean_pool(data, &mask, *dim as usize),
                // [1, dim] sentence embedding
                [_, dim] => Ok(Array1::from_vec(data[..*dim as usize].to_vec())),
                other => Err(Error::Inference(format!("unexpected output shape {:?}", other))),
            }
        }
    }

    /// Attention-masked mean over token embeddings laid out `[seq][dim]`.
    fn mean_pool(data: &[f32], mask: &[i64], dim: usize) -> Result<Array1<f32>> {
        let mut pooled = Array1::<f32>::zeros(dim);
        let mut count = 0.0f32;
        for (i, _) in mask.iter().enumerate().filter(|(_, m)| **m > 0) {
            let row = &data[i * dim..(i + 1) * dim];
            for (acc, v) in pooled.iter_mut().zip(row) {
                *acc += *v;
            }
            count += 1.0;
        }
        if count == 0.0 {
            return Err(Error::Inference("empty attention mask".into()));
        }
        Ok(pooled / count)
    }

    impl EmbedderBackend for OnnxEmbedder {
        fn embed(&self, text: &str) -> Result<EmbeddingResult> {
            if let Some(cached) = self.cache.get(text) {
                return Ok(EmbeddingResult {
                    embedding: cached,
                    cached: true,
                });
            }

            let embedding = self.infer(text)?;
            self.cache.put(text.to_string(), embedding.clone());

            Ok(EmbeddingResult {
                embedding,
                cached: false,
            })
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn is_available(&self) -> bool {
            true
        }
    }
}

#[cfg(feature = "onnx")]
pub use inner::OnnxEmbedder;
