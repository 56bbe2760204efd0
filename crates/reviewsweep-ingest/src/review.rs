//! Scraped review record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dataset::ContentSignature;

/// Star ratings retained downstream. Everything else is discarded at scrape time.
pub const LOW_RATINGS: [f64; 2] = [1.0, 2.0];

/// Whether a rating belongs to the retained low-rating set.
pub fn is_low_rating(rating: f64) -> bool {
    LOW_RATINGS.iter().any(|r| *r == rating)
}

/// A review date after normalization.
///
/// Relative phrases resolve to a calendar date; anything unrecognised keeps
/// the scraped text verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParsedDate {
    Date(NaiveDate),
    Raw(String),
}

impl ParsedDate {
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Raw(_) => None,
        }
    }
}

impl std::fmt::Display for ParsedDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Raw(s) => write!(f, "{}", s),
        }
    }
}

/// One scraped low-rating review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Listing name at scrape time.
    pub place: String,
    /// Reviewer display name.
    pub user: String,
    /// Always 1.0 or 2.0 once a review leaves the scraper.
    pub rating: f64,
    #[serde(rename = "rawDate")]
    pub raw_date: String,
    #[serde(rename = "parsedDate")]
    pub parsed_date: ParsedDate,
    /// Normalized text (see [`crate::normalize_text`]).
    #[serde(rename = "reviewText")]
    pub review_text: String,
    /// Reviewer's lifetime review count, best-effort.
    #[serde(default, rename = "totalReviews")]
    pub total_reviews: Option<String>,
}

impl Review {
    /// Composite identity used for report history lookups.
    pub fn review_key(&self) -> String {
        crate::key::review_key(
            &self.place,
            &self.user,
            &self.parsed_date.to_string(),
            &self.review_text,
        )
    }

    /// Coarse (user, text) identity used for in-session dedup.
    pub fn content_signature(&self) -> ContentSignature {
        ContentSignature::new(&self.user, &self.review_text)
    }
}
