//! Review text and date normalization.

pub mod date;
pub mod stopwords;
pub mod text;

pub use date::parse_relative_date;
pub use text::{content_tokens, normalize_text};
