//! Dataset-level operations: content dedup, report-status filter, rating summary.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::info;

use crate::review::Review;

/// Coarse content identity: reviewer name plus normalized text.
///
/// Two reviews by the same user with identical wording on different dates
/// share a signature. Only used to merge extraction passes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentSignature {
    user: String,
    text: String,
}

impl ContentSignature {
    pub fn new(user: &str, text: &str) -> Self {
        Self {
            user: user.to_string(),
            text: text.to_string(),
        }
    }
}

/// Result of merging passes into one deduplicated sequence.
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    pub reviews: Vec<Review>,
    /// Row count before dedup.
    pub before: usize,
    /// Row count after dedup.
    pub after: usize,
}

/// Keep the first review per [`ContentSignature`], preserving first-seen order.
pub fn dedup_by_content(reviews: Vec<Review>) -> DedupOutcome {
    let before = reviews.len();
    let mut seen: HashSet<ContentSignature> = HashSet::with_capacity(before);

    let reviews: Vec<Review> = reviews
        .into_iter()
        .filter(|r| seen.insert(r.content_signature()))
        .collect();

    let after = reviews.len();
    info!("Dedup: {} rows before, {} after", before, after);

    DedupOutcome {
        reviews,
        before,
        after,
    }
}

/// Reviews whose key is not in `reported_keys`.
pub fn unreported_only<'a>(reviews: &'a [Review], reported_keys: &HashSet<String>) -> Vec<&'a Review> {
    reviews
        .iter()
        .filter(|r| !reported_keys.contains(&r.review_key()))
        .collect()
}

/// Star distribution and average rating of a dataset.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RatingSummary {
    pub total: usize,
    /// Whole-star rating → review count.
    pub counts: BTreeMap<u8, usize>,
    #[serde(rename = "averageRating")]
    pub average: Option<f64>,
}

impl RatingSummary {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let mut counts = BTreeMap::new();
        for review in reviews {
            let stars = review.rating.round().clamp(0.0, 5.0) as u8;
            *counts.entry(stars).or_insert(0) += 1;
        }

        let total = reviews.len();
        let average = if total == 0 {
            None
        } else {
            Some(reviews.iter().map(|r| r.rating).sum::<f64>() / total as f64)
        };

        Self {
            total,
            counts,
            average,
        }
    }
}
