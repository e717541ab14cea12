//! Character normalization.
//!
//! Collapses case and leet-speak substitutions onto a canonical alphabet so
//! that `P4YPAL` and `paypal` look the same to the signature scanner. The
//! mapping is strictly one character to one character, which keeps character
//! positions aligned between the raw payload and its normalized form.

use crate::tables::SubstitutionTable;
use std::borrow::Cow;
use std::sync::Arc;

/// Lowercase a single character.
///
/// Characters whose lowercase form expands to several characters are
/// returned unchanged.
#[inline]
pub fn lowercase_char(c: char) -> char {
    if c.is_ascii() {
        return c.to_ascii_lowercase();
    }
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

/// Table-driven character normalizer.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    table: Arc<SubstitutionTable>,
}

impl Normalizer {
    /// Create a normalizer over the given substitution table.
    pub fn new(table: SubstitutionTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    /// Normalize one character: lowercase, then substitute.
    #[inline]
    pub fn normalize(&self, c: char) -> char {
        let lower = lowercase_char(c);
        self.table.get(lower).unwrap_or(lower)
    }

    /// Normalize a whole string.
    pub fn normalize_str<'a>(&self, input: &'a str) -> Cow<'a, str> {
        if input.chars().all(|c| self.normalize(c) == c) {
            return Cow::Borrowed(input);
        }
        Cow::Owned(input.chars().map(|c| self.normalize(c)).collect())
    }

    /// The substitution table in use.
    pub fn table(&self) -> &SubstitutionTable {
        &self.table
    }
}
