//! Substitution table and signature blocklist.
//!
//! Both tables are validated when constructed so that a bad configuration is
//! rejected before any payload is inspected.

use crate::error::{Error, Result};
use crate::normalize::lowercase_char;
use std::collections::HashMap;

/// Default leet-speak substitutions, applied after lowercasing.
pub const DEFAULT_SUBSTITUTIONS: &[(char, char)] = &[
    ('0', 'o'),
    ('1', 'l'),
    ('!', 'i'),
    ('@', 'a'),
    ('4', 'a'),
    ('$', 's'),
    ('5', 's'),
    ('3', 'e'),
    ('7', 't'),
];

/// Default blocklist, in match priority order.
pub const DEFAULT_SIGNATURES: &[&str] = &[
    "paypal", "secure", "login", "bank", "select", "union", "script", "admin",
];

/// Character substitution table used by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionTable {
    map: HashMap<char, char>,
    /// Entries in declaration order, deduplicated.
    entries: Vec<(char, char)>,
}

impl SubstitutionTable {
    /// Build a table, rejecting entries that would make normalization
    /// unreachable, ambiguous, or non-idempotent.
    pub fn new<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (char, char)>,
    {
        let mut map = HashMap::new();
        let mut ordered = Vec::new();

        for (from, to) in entries {
            if lowercase_char(from) != from {
                return Err(Error::InvalidSubstitution {
                    from,
                    to,
                    message: "source character is not lowercase and would never be looked up"
                        .to_string(),
                });
            }
            if lowercase_char(to) != to {
                return Err(Error::InvalidSubstitution {
                    from,
                    to,
                    message: "replacement character must be lowercase".to_string(),
                });
            }
            match map.get(&from) {
                Some(&existing) if existing != to => {
                    return Err(Error::InvalidSubstitution {
                        from,
                        to,
                        message: format!("conflicts with earlier mapping to '{}'", existing),
                    });
                }
                Some(_) => continue,
                None => {
                    map.insert(from, to);
                    ordered.push((from, to));
                }
            }
        }

        // A replacement that is itself remapped would normalize differently
        // depending on how many passes are applied.
        for &(from, to) in &ordered {
            if let Some(&next) = map.get(&to) {
                if to != from && next != to {
                    return Err(Error::InvalidSubstitution {
                        from,
                        to,
                        message: format!("replacement is itself substituted with '{}'", next),
                    });
                }
            }
        }

        Ok(Self {
            map,
            entries: ordered,
        })
    }

    /// Look up the replacement for an already lowercased character.
    #[inline]
    pub fn get(&self, c: char) -> Option<char> {
        self.map.get(&c).copied()
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> &[(char, char)] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SubstitutionTable {
    fn default() -> Self {
        Self {
            map: DEFAULT_SUBSTITUTIONS.iter().copied().collect(),
            entries: DEFAULT_SUBSTITUTIONS.to_vec(),
        }
    }
}

/// Ordered list of signature terms.
///
/// Order matters: with [`MatchPolicy::FirstInTable`](crate::signature::MatchPolicy)
/// the earliest term wins when several end at the same position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blocklist {
    terms: Vec<String>,
}

impl Blocklist {
    /// Build a blocklist from terms in priority order.
    pub fn new<I, S>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms: Vec<String> = terms.into_iter().map(Into::into).collect();

        if terms.is_empty() {
            return Err(Error::PatternSet {
                message: "empty signature list".to_string(),
            });
        }
        if let Some(term) = terms.iter().find(|t| t.is_empty()) {
            return Err(Error::InvalidSignature {
                term: term.clone(),
                message: "empty term would match at every position".to_string(),
            });
        }

        Ok(Self { terms })
    }

    /// Terms in priority order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Check if the blocklist is empty.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl Default for Blocklist {
    fn default() -> Self {
        Self {
            terms: DEFAULT_SIGNATURES.iter().map(|s| s.to_string()).collect(),
        }
    }
}
