//! Review text cleanup: emoji, URLs, stray symbols and stopwords.

use once_cell::sync::Lazy;
use regex::Regex;

use super::stopwords::is_stopword;

static EMOJI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{Extended_Pictographic}\p{Emoji_Modifier}\x{1F1E6}-\x{1F1FF}\x{200D}\x{FE0F}\x{20E3}]")
        .expect("static emoji regex")
});

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"http\S+|www\S+|https\S+").expect("static url regex"));

// Everything outside lowercase alnum, whitespace and `. , ! ? '`.
static DISALLOWED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s.,!?']").expect("static charset regex"));

static NON_ALNUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));

/// Normalize raw review text.
///
/// Emoji are removed, the text is lowercased, URLs are stripped, any
/// character outside `[a-z0-9\s.,!?']` becomes a space, stopwords are
/// dropped and the remaining words are joined by single spaces.
///
/// Stopword matching ignores sentence punctuation clinging to a word, so
/// `"out!"` is dropped like `"out"`.
pub fn normalize_text(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let text = EMOJI_RE.replace_all(raw, "");
    let text = text.to_lowercase();
    let text = URL_RE.replace_all(&text, "");
    let text = DISALLOWED_RE.replace_all(&text, " ");

    text.split_whitespace()
        .filter(|word| !is_stopword(word.trim_matches(|c| matches!(c, '.' | ',' | '!' | '?'))))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split text into distinct content words for embedding.
///
/// Words are lowercased, reduced to `[a-z0-9]` runs and stopwords removed.
/// Order follows first occurrence.
pub fn content_tokens(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut tokens: Vec<String> = Vec::new();
    for word in lower.split_whitespace() {
        // "don't" must be tested before it is split into "don" + "t"
        let trimmed = word.trim_matches(|c: char| !c.is_ascii_alphanumeric());
        if is_stopword(trimmed) {
            continue;
        }
        for piece in NON_ALNUM_RE.split(trimmed) {
            if piece.is_empty() || is_stopword(piece) {
                continue;
            }
            if !tokens.iter().any(|t| t == piece) {
                tokens.push(piece.to_string());
            }
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("   \n"), "");
    }

    #[test]
    fn test_emoji_url_and_stopwords_removed() {
        assert_eq!(normalize_text("Check 😀 this out! http://x.com a"), "check");
    }

    #[test]
    fn test_keeps_allowed_punctuation() {
        assert_eq!(
            normalize_text("Terrible SERVICE, waited 40 minutes!!"),
            "terrible service, waited 40 minutes!!"
        );
    }

    #[test]
    fn test_symbols_become_spaces() {
        assert_eq!(normalize_text("food#cold & staff@rude"), "food cold staff rude");
    }

    #[test]
    fn test_www_and_https_stripped() {
        assert_eq!(
            normalize_text("visit www.spam.example or https://spam.example/deal now"),
            "visit"
        );
    }

    #[test]
    fn test_non_ascii_letters_replaced() {
        assert_eq!(normalize_text("café awful"), "caf awful");
    }

    #[test]
    fn test_content_tokens() {
        let tokens = content_tokens("Rude staff, rude manager! Don't go.");
        assert_eq!(tokens, vec!["rude", "staff", "manager", "go"]);
    }

    #[test]
    fn test_content_tokens_all_stopwords() {
        assert!(content_tokens("this is the a").is_empty());
        assert!(content_tokens("!!! ...").is_empty());
    }
}
