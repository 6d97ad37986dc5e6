//! Slug derivation
//!
//! Deterministic mapping from a title to a URL-safe token, with a
//! randomized fallback when the title carries no usable characters.

use rand::Rng;

/// Maximum slug length in characters
pub const MAX_SLUG_LEN: usize = 60;

/// Derive a URL-safe slug from a title.
///
/// Lowercases the title, collapses every run of non-alphanumeric
/// characters into a single hyphen, trims leading/trailing hyphens,
/// and truncates to [`MAX_SLUG_LEN`] characters.
///
/// May return an empty string (e.g. symbol-only titles); callers that
/// need a non-empty token should use [`slug_or_random`].
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len().min(MAX_SLUG_LEN));
    let mut pending_hyphen = false;

    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch.to_ascii_lowercase());
            pending_hyphen = false;
        } else {
            pending_hyphen = true;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    // Truncation can re-expose a trailing hyphen
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Derive a slug from a title, substituting `<prefix>-<6 base-36 chars>`
/// when the title yields an empty slug.
pub fn slug_or_random(title: &str, prefix: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        format!("{}-{}", prefix, random_token(6))
    } else {
        slug
    }
}

/// Generate a random base-36 token of the given length
pub fn random_token(len: usize) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_slugification() {
        assert_eq!(slugify("Grandpa's watch"), "grandpa-s-watch");
        assert_eq!(slugify("Old  Family   Photos"), "old-family-photos");
        assert_eq!(slugify("WWII medals (1944)"), "wwii-medals-1944");
    }

    #[test]
    fn test_no_leading_or_trailing_hyphens() {
        assert_eq!(slugify("  hello  "), "hello");
        assert_eq!(slugify("---a---b---"), "a-b");
    }

    #[test]
    fn test_truncates_to_max_len() {
        let long = "a".repeat(200);
        assert_eq!(slugify(&long).len(), MAX_SLUG_LEN);

        // Truncation must not leave a trailing hyphen
        let mut title = "ab ".repeat(40);
        title.truncate(120);
        let slug = slugify(&title);
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_slug_charset() {
        let slug = slugify("Ünïcödé & Symbols! 42");
        assert!(slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }

    #[test]
    fn test_empty_title_gets_random_token() {
        for title in ["", "   ", "!!!", "@#$%^&*"] {
            let slug = slug_or_random(title, "artifact");
            let (prefix, token) = slug.split_at("artifact-".len());
            assert_eq!(prefix, "artifact-");
            assert_eq!(token.len(), 6);
            assert!(token
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_non_empty_title_is_deterministic() {
        assert_eq!(
            slug_or_random("Grandpa's watch", "artifact"),
            slug_or_random("Grandpa's watch", "artifact")
        );
    }
}
