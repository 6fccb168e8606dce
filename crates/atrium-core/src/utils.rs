//! Text utilities: slugs, excerpts and reading time

use regex::Regex;
use std::sync::LazyLock;

/// Characters that never survive into a slug
#[allow(clippy::expect_used)]
static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("literal pattern"));

/// Runs of separators that collapse into a single hyphen
#[allow(clippy::expect_used)]
static SLUG_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_-]+").expect("literal pattern"));

/// Words per minute assumed by [`reading_time_minutes`]
pub const WORDS_PER_MINUTE: usize = 200;

/// Derive a URL slug from a title
///
/// Lowercases and trims the input, drops everything outside word
/// characters, whitespace and hyphens, collapses separator runs into one
/// hyphen and strips hyphens from both ends. `slugify(slugify(s)) ==
/// slugify(s)` for every input.
#[must_use]
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase();
    let kept = NON_SLUG_CHARS.replace_all(lowered.trim(), "");
    let joined = SLUG_SEPARATORS.replace_all(&kept, "-");
    joined.trim_matches('-').to_string()
}

/// Cut `content` to at most `max_chars` characters on a word boundary
///
/// Whitespace is normalized first; an ellipsis is appended when anything
/// was cut.
#[must_use]
pub fn excerpt(content: &str, max_chars: usize) -> String {
    let normalized = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.chars().count() <= max_chars {
        return normalized;
    }

    let mut out = String::new();
    for word in normalized.split(' ') {
        let needed = if out.is_empty() {
            word.chars().count()
        } else {
            out.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }

    if out.is_empty() {
        // A single word longer than the limit: hard cut.
        out = normalized.chars().take(max_chars).collect();
    }
    out.push('…');
    out
}

/// Estimated reading time in whole minutes, never less than one
#[must_use]
pub fn reading_time_minutes(content: &str) -> usize {
    content
        .split_whitespace()
        .count()
        .div_ceil(WORDS_PER_MINUTE)
        .max(1)
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("Hello, World! 2024", "hello-world-2024")]
    #[case("  Trim me  ", "trim-me")]
    #[case("snake_case_title", "snake-case-title")]
    #[case("--Already--Hyphenated--", "already-hyphenated")]
    #[case("Multiple   spaces\tand\nlines", "multiple-spaces-and-lines")]
    #[case("Café Déjà Vu", "café-déjà-vu")]
    #[case("100% legit & true", "100-legit-true")]
    #[case("!!!", "")]
    #[case("", "")]
    fn test_slugify_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(slugify(input), expected);
    }

    #[test]
    fn test_excerpt_short_content_is_untouched() {
        assert_eq!(excerpt("  A short\n body ", 50), "A short body");
    }

    #[test]
    fn test_excerpt_cuts_on_word_boundary() {
        let text = "The quick brown fox jumps over the lazy dog";
        assert_eq!(excerpt(text, 20), "The quick brown fox…");
    }

    #[test]
    fn test_excerpt_hard_cuts_a_single_long_word() {
        assert_eq!(excerpt("Supercalifragilistic", 5), "Super…");
    }

    #[test]
    fn test_reading_time() {
        assert_eq!(reading_time_minutes(""), 1);
        assert_eq!(reading_time_minutes(&"word ".repeat(200)), 1);
        assert_eq!(reading_time_minutes(&"word ".repeat(201)), 2);
        assert_eq!(reading_time_minutes(&"word ".repeat(1000)), 5);
    }

    proptest! {
        #[test]
        fn slugify_is_idempotent(input in "\\PC{0,60}") {
            let once = slugify(&input);
            let twice = slugify(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn slugs_have_no_edge_or_double_hyphens(input in "[ -~]{0,60}") {
            let slug = slugify(&input);
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
            prop_assert!(!slug.contains(' '));
            prop_assert!(!slug.contains('_'));
        }

        #[test]
        fn excerpt_respects_limit(input in "[a-z ]{0,200}", limit in 1usize..80) {
            let cut = excerpt(&input, limit);
            // The ellipsis adds at most one character beyond the limit.
            prop_assert!(cut.chars().count() <= limit + 1);
        }
    }
}
