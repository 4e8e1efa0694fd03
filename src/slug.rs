//! Slug generation for titled resources.

use regex::Regex;

lazy_static::lazy_static! {
    static ref DISALLOWED: Regex = Regex::new(r"[^a-z0-9\s-]").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref HYPHENS: Regex = Regex::new(r"-{2,}").unwrap();
    /// Valid slug pattern: lowercase letters, numbers, and hyphens
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}

/// Upper bound on suffix candidates tried before giving up on a title.
pub const MAX_SLUG_ATTEMPTS: usize = 64;

/// Turn a title into a URL-safe slug.
///
/// `slugify(slugify(x)) == slugify(x)` for every input.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = DISALLOWED.replace_all(&lowered, "");
    let hyphenated = WHITESPACE.replace_all(stripped.trim(), "-");
    let collapsed = HYPHENS.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_REGEX.is_match(slug)
}

/// Slug for `title`, or `fallback` when the title has no usable characters.
pub fn base_slug(title: &str, fallback: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// The `n`th candidate for `base`: `base`, `base-1`, `base-2`, ...
pub fn candidate(base: &str, n: usize) -> String {
    if n == 0 {
        base.to_string()
    } else {
        format!("{base}-{n}")
    }
}

/// Index of the first candidate for `base` not present in `taken`.
pub fn first_free(base: &str, taken: &[String]) -> usize {
    (0..)
        .find(|n| {
            let c = candidate(base, *n);
            !taken.iter().any(|t| *t == c)
        })
        .unwrap_or(0)
}
