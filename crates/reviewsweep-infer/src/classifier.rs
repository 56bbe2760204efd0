//! Semantic report-category classifier with auditable reasoning.
//!
//! Review text and category labels share one embedding space. The category
//! with the highest cosine similarity wins (first in taxonomy order on ties).
//! Lexical backends cannot relate a review to a two-word label, so for them
//! each category is represented by its label plus policy definition words.
//! The justification has three parts: the review words closest to the chosen
//! category, the category policy definition closest to the review, and the
//! review sentence containing those words.

use std::sync::Arc;

use ndarray::Array1;
use regex::{Regex, RegexBuilder};
use reviewsweep_core::{Error, Result};
use reviewsweep_ingest::{content_tokens, Review};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::QueryCache;
use crate::embedder::{cosine_similarity, EmbedderBackend};
use crate::taxonomy::Taxonomy;

/// Default number of key tokens reported per review.
pub const DEFAULT_KEY_TOKENS: usize = 4;

/// Texts shorter than this (in characters, trimmed) skip classification.
const MIN_TEXT_CHARS: usize = 3;

const SHORT_TEXT_TOKENS: &str = "Text too short to extract key concepts";
const NO_TOKENS: &str = "No meaningful words to analyse";
const INSUFFICIENT_REASON: &str =
    "The review has no meaningful text, which is treated as low-content spam.";
const INSUFFICIENT_CONTEXT: &str = "Not applicable: the review has no meaningful text.";

/// Words supporting a classification, or why there are none.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KeyTokens {
    Found(Vec<String>),
    Unavailable(String),
    /// The text was too short to classify; set only by the short-circuit.
    Insufficient(String),
}

impl KeyTokens {
    pub fn tokens(&self) -> &[String] {
        match self {
            Self::Found(tokens) => tokens,
            Self::Unavailable(_) | Self::Insufficient(_) => &[],
        }
    }
}

impl std::fmt::Display for KeyTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Found(tokens) => write!(f, "{}", tokens.join(", ")),
            Self::Unavailable(reason) | Self::Insufficient(reason) => write!(f, "{}", reason),
        }
    }
}

/// Category decision for one text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub category: String,
    /// Cosine similarity × 100, two decimals, clamped to [0, 100].
    pub confidence: f64,
    #[serde(rename = "keyTokens")]
    pub key_tokens: KeyTokens,
}

/// Human-readable justification of a classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Validation {
    #[serde(rename = "policyReason")]
    pub policy_reason: String,
    /// Sentence containing the key tokens, tokens wrapped in `**`.
    #[serde(rename = "contextSentence")]
    pub context_sentence: String,
    #[serde(rename = "keyConcepts")]
    pub key_concepts: String,
}

/// Classification plus its justification. Recomputed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    #[serde(flatten)]
    pub classification: Classification,
    #[serde(flatten)]
    pub validation: Validation,
}

/// Embedding-based classifier over a fixed taxonomy.
///
/// Immutable after construction; share it behind an `Arc` between sessions.
pub struct SemanticClassifier {
    embedder: Arc<dyn EmbedderBackend>,
    taxonomy: Taxonomy,
    /// One vector per category, taxonomy order.
    category_embeddings: Vec<Array1<f32>>,
    /// Per category: (definition index, vector). Definitions that failed to embed are absent.
    definition_embeddings: Vec<Vec<(usize, Array1<f32>)>>,
    token_cache: QueryCache,
    key_token_count: usize,
}

impl SemanticClassifier {
    /// Validate the taxonomy and precompute label and definition embeddings.
    ///
    /// Fails if any category cannot be embedded.
    pub fn new(embedder: Arc<dyn EmbedderBackend>, taxonomy: Taxonomy) -> Result<Self> {
        taxonomy.validate()?;

        let semantic = embedder.is_semantic();
        if !semantic {
            debug!("Lexical embedder: categories embedded with their definitions");
        }
        let mut category_embeddings = Vec::with_capacity(taxonomy.len());
        for (name, target) in taxonomy.names().zip(category_targets(&taxonomy, semantic)) {
            let result = embedder
                .embed(&target)
                .map_err(|e| Error::Inference(format!("embedding category '{}': {}", name, e)))?;
            category_embeddings.push(result.embedding);
        }

        let definition_embeddings: Vec<Vec<(usize, Array1<f32>)>> = taxonomy
            .categories
            .iter()
            .map(|cat| {
                cat.definitions
                    .iter()
                    .enumerate()
                    .filter_map(|(i, def)| match embedder.embed(def) {
                        Ok(r) => Some((i, r.embedding)),
                        Err(e) => {
                            warn!("Skipping definition {} of '{}': {}", i, cat.name, e);
                            None
                        }
                    })
                    .collect()
            })
            .collect();

        info!(
            "SemanticClassifier ready: {} categories, {} definitions",
            taxonomy.len(),
            definition_embeddings.iter().map(Vec::len).sum::<usize>()
        );

        Ok(Self {
            embedder,
            taxonomy,
            category_embeddings,
            definition_embeddings,
            token_cache: QueryCache::default_cache(),
            key_token_count: DEFAULT_KEY_TOKENS,
        })
    }

    /// Override how many key tokens [`classify`](Self::classify) reports.
    pub fn with_key_token_count(mut self, n: usize) -> Self {
        self.key_token_count = n;
        self
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Pick the best category for `text`.
    ///
    /// Near-empty text short-circuits to the insufficient-content bucket at
    /// 100% confidence. An embedding failure yields the same bucket at 0%.
    pub fn classify(&self, text: &str) -> Classification {
        if text.trim().chars().count() < MIN_TEXT_CHARS {
            return Classification {
                category: self.taxonomy.insufficient_content.clone(),
                confidence: 100.0,
                key_tokens: KeyTokens::Insufficient(SHORT_TEXT_TOKENS.into()),
            };
        }

        let embedding = match self.embedder.embed(text) {
            Ok(r) => r.embedding,
            Err(e) => {
                warn!("Classification fell back to '{}': {}", self.taxonomy.insufficient_content, e);
                return Classification {
                    category: self.taxonomy.insufficient_content.clone(),
                    confidence: 0.0,
                    key_tokens: KeyTokens::Unavailable(format!("Embedding unavailable: {}", e)),
                };
            }
        };

        let scores: Vec<f32> = self
            .category_embeddings
            .iter()
            .map(|target| cosine_similarity(&embedding, target))
            .collect();
        let (best_idx, best_score) = stable_argmax(&scores).unwrap_or((0, 0.0));
        let category = self.taxonomy.categories[best_idx].name.clone();

        let key_tokens = self.extract_key_tokens(text, &category, self.key_token_count);
        debug!("Classified as '{}' ({:.4})", category, best_score);

        Classification {
            category,
            confidence: to_confidence(best_score),
            key_tokens,
        }
    }

    /// Top-`n` words of `text` by similarity to `category`, best first.
    pub fn extract_key_tokens(&self, text: &str, category: &str, n: usize) -> KeyTokens {
        let Some(idx) = self.taxonomy.index_of(category) else {
            return KeyTokens::Unavailable(format!("Unknown category '{}'", category));
        };

        let tokens = content_tokens(text);
        if tokens.is_empty() {
            return KeyTokens::Unavailable(NO_TOKENS.into());
        }

        let target = &self.category_embeddings[idx];
        let mut scored: Vec<(f32, String)> = Vec::with_capacity(tokens.len());
        for token in tokens {
            match self.embed_token(&token) {
                Ok(emb) => scored.push((cosine_similarity(&emb, target), token)),
                Err(e) => return KeyTokens::Unavailable(format!("Key concepts unavailable: {}", e)),
            }
        }

        // Stable: equal scores keep text order.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        KeyTokens::Found(scored.into_iter().take(n).map(|(_, t)| t).collect())
    }

    /// Explain a classification: policy reason, context sentence, key concepts.
    ///
    /// Texts short-circuited by [`classify`](Self::classify) carry
    /// [`KeyTokens::Insufficient`] and get a fixed explanation.
    pub fn validate(
        &self,
        text: &str,
        category: &str,
        confidence: f64,
        key_tokens: &KeyTokens,
    ) -> Validation {
        if let KeyTokens::Insufficient(_) = key_tokens {
            debug!("No explanation for short text (category '{}', {:.2})", category, confidence);
            return Validation {
                policy_reason: INSUFFICIENT_REASON.into(),
                context_sentence: INSUFFICIENT_CONTEXT.into(),
                key_concepts: key_tokens.to_string(),
            };
        }

        Validation {
            policy_reason: self.policy_reason(text, category),
            context_sentence: highlight_context(text, key_tokens.tokens()),
            key_concepts: key_tokens.to_string(),
        }
    }

    /// [`classify`](Self::classify) followed by [`validate`](Self::validate).
    pub fn assess(&self, text: &str) -> ClassificationResult {
        let classification = self.classify(text);
        let validation = self.validate(
            text,
            &classification.category,
            classification.confidence,
            &classification.key_tokens,
        );
        ClassificationResult {
            classification,
            validation,
        }
    }

    /// The category definition closest to the whole review text.
    fn policy_reason(&self, text: &str, category: &str) -> String {
        let Some(idx) = self.taxonomy.index_of(category) else {
            return format!("Unknown category '{}'", category);
        };
        let definitions = &self.definition_embeddings[idx];
        if definitions.is_empty() {
            return format!("No policy definition available for '{}'", category);
        }

        let review = match self.embedder.embed(text) {
            Ok(r) => r.embedding,
            Err(e) => return format!("Policy reason unavailable: {}", e),
        };

        let scores: Vec<f32> = definitions
            .iter()
            .map(|(_, emb)| cosine_similarity(&review, emb))
            .collect();
        match stable_argmax(&scores) {
            Some((best, _)) => {
                let def_idx = definitions[best].0;
                self.taxonomy.categories[idx].definitions[def_idx].clone()
            }
            None => format!("No policy definition available for '{}'", category),
        }
    }

    fn embed_token(&self, token: &str) -> Result<Array1<f32>> {
        if let Some(cached) = self.token_cache.get(token) {
            return Ok(cached);
        }
        let embedding = self.embedder.embed(token)?.embedding;
        self.token_cache.put(token.to_string(), embedding.clone());
        Ok(embedding)
    }
}

/// Text embedded to represent each category, taxonomy order.
///
/// Semantic backends get the bare label. Lexical backends get the label and
/// definition content words, minus words every category shares.
fn category_targets(taxonomy: &Taxonomy, semantic: bool) -> Vec<String> {
    if semantic {
        return taxonomy.names().map(str::to_string).collect();
    }

    let profiles: Vec<Vec<String>> = taxonomy
        .categories
        .iter()
        .map(|cat| {
            let mut text = cat.name.clone();
            for def in &cat.definitions {
                text.push(' ');
                text.push_str(def);
            }
            content_tokens(&text)
        })
        .collect();

    profiles
        .iter()
        .zip(&taxonomy.categories)
        .map(|(words, cat)| {
            let distinctive: Vec<&str> = words
                .iter()
                .filter(|w| profiles.len() < 2 || !profiles.iter().all(|p| p.contains(*w)))
                .map(String::as_str)
                .collect();
            if distinctive.is_empty() {
                cat.name.clone()
            } else {
                distinctive.join(" ")
            }
        })
        .collect()
}

/// Reviews whose on-demand category equals `category`.
pub fn filter_by_category<'a>(
    reviews: &'a [Review],
    classifier: &SemanticClassifier,
    category: &str,
) -> Vec<&'a Review> {
    reviews
        .iter()
        .filter(|r| classifier.classify(&r.review_text).category == category)
        .collect()
}

/// Index and value of the maximum; the first index wins ties. NaN never wins.
fn stable_argmax(scores: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &s) in scores.iter().enumerate() {
        let better = match best {
            Some((_, b)) => s > b,
            None => !s.is_nan(),
        };
        if better {
            best = Some((i, s));
        }
    }
    best
}

fn to_confidence(similarity: f32) -> f64 {
    let pct = (f64::from(similarity) * 100.0 * 100.0).round() / 100.0;
    pct.clamp(0.0, 100.0)
}

/// Split on `.`, `!`, `?` followed by whitespace.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if matches!(b, b'.' | b'!' | b'?') && bytes.get(i + 1).is_some_and(u8::is_ascii_whitespace) {
            let s = text[start..=i].trim();
            if !s.is_empty() {
                sentences.push(s);
            }
            start = i + 1;
        }
    }
    let s = text[start..].trim();
    if !s.is_empty() {
        sentences.push(s);
    }
    sentences
}

fn token_pattern(tokens: &[String]) -> Option<Regex> {
    if tokens.is_empty() {
        return None;
    }
    let alternation = tokens
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&format!(r"\b(?:{})\b", alternation))
        .case_insensitive(true)
        .build()
        .ok()
}

/// First sentence mentioning any token, with matches emphasised.
/// Falls back to the whole text.
fn highlight_context(text: &str, tokens: &[String]) -> String {
    let Some(re) = token_pattern(tokens) else {
        return text.to_string();
    };
    let target = split_sentences(text)
        .into_iter()
        .find(|s| re.is_match(s))
        .unwrap_or(text);
    re.replace_all(target, "**${0}**").into_owned()
}
