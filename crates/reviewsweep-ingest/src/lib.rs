//! ReviewSweep Ingest: turns scraped review rows into a clean dataset.
//!
//! Text and date normalization, composite review keys, content-based
//! deduplication, dataset filters and tabular export.

pub mod dataset;
pub mod export;
pub mod key;
pub mod normalize;
pub mod review;

pub use dataset::{dedup_by_content, unreported_only, ContentSignature, DedupOutcome, RatingSummary};
pub use export::{export_csv, export_file_name};
pub use key::review_key;
pub use normalize::{content_tokens, normalize_text, parse_relative_date};
pub use review::{is_low_rating, ParsedDate, Review, LOW_RATINGS};
