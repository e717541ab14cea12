//! Signature scanner: suffix matching over the normalized stream.
//!
//! At each position the scanner reports the blocklist term that ends exactly
//! there, if any. Instead of re-normalizing the prefix and testing every term
//! as a suffix, the compiled set steps an Aho-Corasick DFA one normalized
//! character at a time. With standard match semantics every state carries all
//! patterns that are suffixes of the input consumed so far, so the reported
//! matches (positions, terms and snippets) are identical to the brute-force
//! suffix test.

use crate::audit::SignatureEntry;
use crate::error::{Error, Result};
use crate::normalize::Normalizer;
use crate::tables::Blocklist;
use aho_corasick::automaton::{Automaton, StateID};
use aho_corasick::dfa::DFA;
use aho_corasick::{Anchored, MatchKind};
use std::str::FromStr;
use tracing::trace;

/// Tie-break rule when several terms end at the same position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Earliest term in the blocklist wins.
    #[default]
    FirstInTable,
    /// Longest term wins; equal lengths fall back to table order.
    LongestTerm,
}

impl MatchPolicy {
    /// Policy name as used in rules files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FirstInTable => "first",
            Self::LongestTerm => "longest",
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" | "first_in_table" => Ok(Self::FirstInTable),
            "longest" | "longest_term" => Ok(Self::LongestTerm),
            other => Err(format!("unknown match policy '{}'", other)),
        }
    }
}

/// A compiled blocklist, shareable across inspections.
#[derive(Debug, Clone)]
pub struct SignatureSet {
    dfa: DFA,
    start: StateID,
    /// Canonical terms, in table order.
    terms: Vec<String>,
    /// Term lengths in characters.
    term_chars: Vec<usize>,
    policy: MatchPolicy,
}

impl SignatureSet {
    /// Compile a blocklist. Terms are canonicalized with `normalizer` so that
    /// they live in the same alphabet as the scanned stream.
    pub fn new(blocklist: &Blocklist, normalizer: &Normalizer, policy: MatchPolicy) -> Result<Self> {
        let terms: Vec<String> = blocklist
            .terms()
            .iter()
            .map(|t| normalizer.normalize_str(t).into_owned())
            .collect();
        let term_chars = terms.iter().map(|t| t.chars().count()).collect();

        let dfa = DFA::builder()
            .match_kind(MatchKind::Standard)
            .build(&terms)
            .map_err(|e| Error::PatternSet {
                message: e.to_string(),
            })?;
        let start = dfa
            .start_state(Anchored::No)
            .map_err(|e| Error::PatternSet {
                message: e.to_string(),
            })?;

        Ok(Self {
            dfa,
            start,
            terms,
            term_chars,
            policy,
        })
    }

    /// Canonical terms, in table order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// The tie-break policy.
    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Start a scan for one payload.
    pub fn scanner(&self) -> SignatureScanner<'_> {
        SignatureScanner {
            set: self,
            state: self.start,
            matched: false,
            log: Vec::new(),
        }
    }

    /// Choose the winning pattern among those ending in `sid`.
    fn select(&self, sid: StateID) -> Option<usize> {
        let candidates =
            (0..self.dfa.match_len(sid)).map(|i| self.dfa.match_pattern(sid, i).as_usize());
        match self.policy {
            MatchPolicy::FirstInTable => candidates.min(),
            MatchPolicy::LongestTerm => candidates
                .max_by(|&a, &b| self.term_chars[a].cmp(&self.term_chars[b]).then(b.cmp(&a))),
        }
    }
}

/// Per-inspection scanner state.
#[derive(Debug, Clone)]
pub struct SignatureScanner<'s> {
    set: &'s SignatureSet,
    state: StateID,
    matched: bool,
    log: Vec<SignatureEntry>,
}

impl<'s> SignatureScanner<'s> {
    /// Consume the normalized character at `position`. `raw` holds the raw
    /// payload characters up to and including `position`.
    pub fn feed(&mut self, position: usize, normalized: char, raw: &[char]) {
        let mut buf = [0u8; 4];
        for &byte in normalized.encode_utf8(&mut buf).as_bytes() {
            self.state = self.set.dfa.next_state(Anchored::No, self.state, byte);
        }

        if !self.set.dfa.is_match(self.state) {
            return;
        }
        let Some(pid) = self.set.select(self.state) else {
            return;
        };

        let term = &self.set.terms[pid];
        let start = (position + 1).saturating_sub(self.set.term_chars[pid]);
        let snippet: String = raw[start..=position].iter().collect();
        trace!(position, term = %term, snippet = %snippet, "signature matched");

        self.matched = true;
        self.log.push(SignatureEntry::new(position, term.as_str(), snippet));
    }

    /// Whether any term has matched so far.
    pub fn matched(&self) -> bool {
        self.matched
    }

    /// Entries recorded so far.
    pub fn log(&self) -> &[SignatureEntry] {
        &self.log
    }

    /// Consume the scanner, returning (matched, log).
    pub fn into_parts(self) -> (bool, Vec<SignatureEntry>) {
        (self.matched, self.log)
    }
}
