//! Listing-ID extraction from free-form text.
//!
//! Accepts marketplace configure URLs, game-pass path URLs, or bare numeric
//! IDs. Extracted IDs are always 6-20 digit strings.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)game[-_]pass/(\d{6,20})").expect("valid pattern"));
static DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{6,20})\b").expect("valid pattern"));

/// Extract at most one listing ID from arbitrary text.
///
/// Priority order: configure-URL `id` query parameter, game-pass path
/// segment, first standalone 6-20 digit run. Malformed URLs fall through to
/// the later patterns instead of erroring.
pub fn extract_id(text: &str) -> Option<String> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }
    if s.to_lowercase().contains("configure?id=") {
        if let Some(id) = id_from_configure_url(s) {
            return Some(id);
        }
    }
    if let Some(caps) = PATH_RE.captures(s) {
        return Some(caps[1].to_string());
    }
    DIGITS_RE.captures(s).map(|caps| caps[1].to_string())
}

fn id_from_configure_url(s: &str) -> Option<String> {
    let url = Url::parse(s).ok()?;
    let id = url
        .query_pairs()
        .find(|(k, _)| k == "id")
        .map(|(_, v)| v.into_owned())?;
    let digits = (6..=20).contains(&id.len()) && id.bytes().all(|b| b.is_ascii_digit());
    digits.then_some(id)
}

/// Extract every unique listing ID from text, preserving first-seen order.
///
/// Tokens are split on commas, whitespace, and newlines.
pub fn extract_many(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for token in text.split(|c: char| c == ',' || c.is_whitespace()) {
        if token.is_empty() {
            continue;
        }
        if let Some(id) = extract_id(token) {
            if seen.insert(id.clone()) {
                ids.push(id);
            }
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configure_url_id_param() {
        let id = extract_id("https://create.roblox.com/dashboard/creations/configure?id=123456789");
        assert_eq!(id.as_deref(), Some("123456789"));
    }

    #[test]
    fn configure_url_non_digit_id_falls_through() {
        // The non-digit id parameter is rejected, then the digits pattern
        // finds nothing else usable in the URL.
        let id = extract_id("https://example.com/configure?id=abc");
        assert_eq!(id, None);
    }

    #[test]
    fn configure_url_case_insensitive_marker() {
        let id = extract_id("https://example.com/CONFIGURE?ID=1234567");
        assert_eq!(id.as_deref(), Some("1234567"));
    }

    #[test]
    fn game_pass_path_segment() {
        assert_eq!(
            extract_id("https://www.roblox.com/game-pass/987654321/Cool-Pass").as_deref(),
            Some("987654321")
        );
        assert_eq!(extract_id("GAME_PASS/123456").as_deref(), Some("123456"));
    }

    #[test]
    fn bare_digits() {
        assert_eq!(extract_id("please scan 123456 now").as_deref(), Some("123456"));
        assert_eq!(extract_id("12345"), None, "five digits is too short");
        assert_eq!(extract_id(&"9".repeat(21)), None, "21 digits is too long");
    }

    #[test]
    fn malformed_url_does_not_panic() {
        assert_eq!(extract_id("configure?id=%%%"), None);
        assert_eq!(extract_id(""), None);
        assert_eq!(extract_id("   "), None);
    }

    #[test]
    fn extracted_ids_are_6_to_20_digits() {
        for input in [
            "https://www.roblox.com/game-pass/123456789",
            "7654321",
            "https://create.roblox.com/configure?id=999999",
        ] {
            let id = extract_id(input).unwrap();
            assert!((6..=20).contains(&id.len()));
            assert!(id.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn many_dedups_preserving_order() {
        let ids = extract_many("123456, 7654321\n123456");
        assert_eq!(ids, vec!["123456".to_string(), "7654321".to_string()]);
    }

    #[test]
    fn many_empty_input() {
        assert!(extract_many("").is_empty());
        assert!(extract_many("no ids here").is_empty());
    }
}
