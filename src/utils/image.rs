//! Deterministic placeholder image references.
//!
//! References already stored by earlier deployments were derived with a
//! 31-multiplier UTF-16 string hash, so the same hash is reproduced here
//! bit for bit. Changing it would make re-derived references disagree with
//! stored ones.

/// Number of distinct placeholder images.
pub const IMAGE_BUCKETS: i32 = 1000;

const PLACEHOLDER_BASE: &str = "https://picsum.photos/seed";
const PLACEHOLDER_SIZE: &str = "400/300";

/// Build the placeholder image reference for a word. Empty input yields an
/// empty string.
pub fn image_url_for(keyword: &str) -> String {
    if keyword.is_empty() {
        return String::new();
    }
    let seed = image_bucket(&clean_keyword(keyword));
    format!("{PLACEHOLDER_BASE}/{seed}/{PLACEHOLDER_SIZE}")
}

/// Bucket in `0..IMAGE_BUCKETS` for an already-cleaned keyword.
pub fn image_bucket(cleaned: &str) -> i32 {
    (string_hash(cleaned) % IMAGE_BUCKETS).abs()
}

/// Lower-case, drop everything but ASCII alphanumerics and whitespace, trim,
/// then turn each remaining space into a hyphen.
pub fn clean_keyword(keyword: &str) -> String {
    let kept: String = keyword
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || is_pattern_whitespace(*c))
        .collect();
    kept.trim_matches(|c: char| c <= ' ').replace(' ', "-")
}

fn is_pattern_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r')
}

/// `h = 31 * h + unit` over UTF-16 code units with 32-bit wraparound.
fn string_hash(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}
