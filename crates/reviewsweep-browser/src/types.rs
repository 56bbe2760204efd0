//! Scraper types: cookies, scroll reports, pipeline outcomes.

use chrono::{DateTime, Utc};
use reviewsweep_ingest::Review;
use serde::{Deserialize, Serialize};

/// Place name used when the listing title could not be read.
pub const UNKNOWN_PLACE: &str = "Unknown_Place";
/// Place name used when the whole pipeline aborted.
pub const UNKNOWN_PLACE_ERROR: &str = "Unknown_Place_Error";
/// Reviewer name used when the author field is missing.
pub const UNKNOWN_USER: &str = "Unknown User";

/// Cookie as exported from a logged-in browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, rename = "httpOnly")]
    pub http_only: bool,
    #[serde(skip_serializing_if = "Option::is_none", rename = "sameSite")]
    pub same_site: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "expirationDate")]
    pub expiration_date: Option<f64>,
}

fn default_cookie_path() -> String {
    "/".into()
}

impl ImportedCookie {
    /// Same cookie as a session cookie.
    pub fn without_expiry(&self) -> Self {
        Self {
            expiration_date: None,
            ..self.clone()
        }
    }
}

/// Saved login session of one reporting account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookieJar {
    pub account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub cookies: Vec<ImportedCookie>,
    #[serde(rename = "savedAt")]
    pub saved_at: DateTime<Utc>,
}

impl CookieJar {
    /// Identity under which reports from this account are recorded.
    pub fn reporter_key(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.account)
    }

    pub fn is_expired(&self, now: DateTime<Utc>, max_age: chrono::Duration) -> bool {
        now - self.saved_at > max_age
    }
}

/// Phases of one scroll pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollPhase {
    Scrolling,
    Stuck,
    Recovering,
    Done,
}

/// Why a scroll phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollStop {
    /// Retry budget exhausted without the offset advancing.
    Settled,
    IterationCeiling,
    Cancelled,
}

/// Diagnostics of one scroll-and-collect pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrollReport {
    pub iterations: usize,
    pub recoveries: usize,
    pub stop: ScrollStop,
    /// Review blocks rendered when extraction started.
    pub blocks: usize,
    pub kept: usize,
    /// Blocks dropped by the rating filter.
    pub discarded: usize,
    /// Blocks dropped because the element itself was unreadable.
    #[serde(rename = "criticalSkips")]
    pub critical_skips: usize,
}

/// Reviews and diagnostics of one pass.
#[derive(Debug, Clone)]
pub struct PassResult {
    pub reviews: Vec<Review>,
    pub report: ScrollReport,
}

/// Listing order a pass ran under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassOrder {
    LowestRating,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassSummary {
    pub order: PassOrder,
    pub report: ScrollReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    Completed,
    Cancelled,
    Failed,
}

/// Result of a full extraction run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub place: String,
    pub reviews: Vec<Review>,
    #[serde(rename = "beforeDedup")]
    pub before_dedup: usize,
    #[serde(rename = "afterDedup")]
    pub after_dedup: usize,
    pub passes: Vec<PassSummary>,
    pub status: PipelineStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            place: UNKNOWN_PLACE_ERROR.into(),
            reviews: Vec::new(),
            before_dedup: 0,
            after_dedup: 0,
            passes: Vec::new(),
            status: PipelineStatus::Failed,
            error: Some(error.into()),
        }
    }

    /// Blocks skipped as unreadable across all passes.
    pub fn critical_skips(&self) -> usize {
        self.passes.iter().map(|p| p.report.critical_skips).sum()
    }
}
