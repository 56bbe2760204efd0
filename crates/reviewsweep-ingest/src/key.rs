//! Composite review keys.
//!
//! `place_user_date_snippet`, e.g. `cafeluna_johndoe_20240101_coffeewascold`.
//! Keys are deterministic but not collision-free: two different reviews that
//! share place, user, date and the first 50 characters of normalized text
//! map to the same key.

const UNKNOWN: &str = "UNKNOWN";
const SNIPPET_CHARS: usize = 50;

/// Build the composite key for a review.
///
/// Total: any empty field becomes the literal `UNKNOWN`.
pub fn review_key(place: &str, user: &str, parsed_date: &str, review_text: &str) -> String {
    let place = component(place, squash);
    let user = component(user, squash);
    let date = component(parsed_date, |s| s.chars().filter(|c| c.is_ascii_digit()).collect());
    let snippet = component(review_text, |s| {
        s.to_lowercase()
            .chars()
            .take(SNIPPET_CHARS)
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            .collect()
    });

    format!("{}_{}_{}_{}", place, user, date, snippet)
}

fn component(value: &str, transform: impl Fn(&str) -> String) -> String {
    if value.trim().is_empty() {
        UNKNOWN.to_string()
    } else {
        transform(value)
    }
}

/// Lowercase with all whitespace removed.
fn squash(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}
