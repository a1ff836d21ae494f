//! Slug generation and per-run collision handling
//!
//! Every slugged entity (categories, attribute terms, products) goes through
//! [`slugify`], so the same display name always yields the same slug.

use std::collections::HashSet;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Convert a display name into a URL-safe slug
///
/// Diacritics are stripped after canonical decomposition, the result is
/// lowercased, anything outside `[a-z0-9]`, whitespace and `-` is dropped,
/// runs of whitespace, underscores and hyphens collapse to a single `-`, and
/// leading/trailing hyphens are trimmed.
pub fn slugify(input: &str) -> String {
    let mut folded = String::with_capacity(input.len());
    for ch in input.nfd().filter(|c| !is_combining_mark(*c)) {
        match ch {
            'œ' | 'Œ' => folded.push_str("oe"),
            'æ' | 'Æ' => folded.push_str("ae"),
            'ß' => folded.push_str("ss"),
            _ => folded.extend(ch.to_lowercase()),
        }
    }

    let mut slug = String::with_capacity(folded.len());
    let mut pending_dash = false;
    for ch in folded.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_dash = true;
        }
        // anything else is removed without introducing a separator
    }
    slug
}

/// Tracks slugs already handed out during a run
///
/// The first claimant of a slug keeps it; later claimants receive `-1`,
/// `-2`, ... suffixes in claim order, so re-running on identical input
/// assigns identical slugs.
#[derive(Debug, Default)]
pub struct SlugRegistry {
    used: HashSet<String>,
}

impl SlugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `base` (or the first free suffixed form of it) and return it
    pub fn claim(&mut self, base: &str) -> String {
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }
        let mut counter = 1usize;
        loop {
            let candidate = format!("{}-{}", base, counter);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            counter += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}
