//! Rules file parsing.
//!
//! A rules file replaces the built-in tables without touching the engine.
//!
//! ```text
//! # leet-speak folding
//! substitute 0 o
//! substitute 4 a
//!
//! # blocklist, in priority order
//! signature paypal
//! signature "union select"
//!
//! match_policy first
//! ```
//!
//! Keywords are case-insensitive. A file without `substitute` lines keeps the
//! default substitution table, and one without `signature` lines keeps the
//! default blocklist.

use crate::error::{Error, Result, SourceLocation};
use crate::signature::MatchPolicy;
use crate::tables::{Blocklist, SubstitutionTable};
use std::path::Path;
use tracing::warn;

/// Configuration for building a [`Firewall`](crate::Firewall).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RulesConfig {
    /// Substitution entries; `None` keeps the default table.
    pub substitutions: Option<Vec<(char, char)>>,
    /// Blocklist terms in priority order; `None` keeps the default blocklist.
    pub signatures: Option<Vec<String>>,
    /// Tie-break policy for terms ending at the same position.
    pub policy: MatchPolicy,
}

impl RulesConfig {
    /// Parse a rules string.
    pub fn from_string(input: &str) -> Result<Self> {
        Self::parse_with_location(input, None)
    }

    /// Load and parse a rules file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::RuleFileLoad {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse_with_location(&content, Some(path))
    }

    /// Parse a rules string, attributing errors to `file` when given.
    pub fn parse_with_location(input: &str, file: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();
        let mut location = SourceLocation {
            file: file.map(|p| p.to_path_buf()),
            line: 1,
            column: 1,
        };

        for (index, raw_line) in input.lines().enumerate() {
            location.line = index + 1;
            let indent = raw_line.len() - raw_line.trim_start().len();
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            location.column = raw_line[..indent].chars().count() + 1;

            let (keyword, rest) = match line.split_once(char::is_whitespace) {
                Some((k, r)) => (k, r.trim()),
                None => (line, ""),
            };
            let arg_column = location.column + line[..line.len() - rest.len()].chars().count();

            match keyword.to_lowercase().as_str() {
                "substitute" => {
                    let (from, to) = parse_substitution(rest).map_err(|message| {
                        location.column = arg_column;
                        Error::parse_with_source(message, location.to_string(), raw_line)
                    })?;
                    config.substitutions.get_or_insert_with(Vec::new).push((from, to));
                }
                "signature" => {
                    let term = unquote(rest);
                    if term.is_empty() {
                        location.column = arg_column;
                        return Err(Error::parse_with_source(
                            "signature requires a term",
                            location.to_string(),
                            raw_line,
                        ));
                    }
                    config.signatures.get_or_insert_with(Vec::new).push(term.to_string());
                }
                "match_policy" => {
                    config.policy = rest.parse().map_err(|message: String| {
                        location.column = arg_column;
                        Error::parse_with_source(message, location.to_string(), raw_line)
                    })?;
                }
                _ => {
                    warn!(
                        keyword = keyword,
                        location = %location,
                        "unknown rules keyword, skipping"
                    );
                }
            }
        }

        Ok(config)
    }

    /// Build the substitution table this configuration describes.
    pub fn substitution_table(&self) -> Result<SubstitutionTable> {
        match &self.substitutions {
            Some(entries) => SubstitutionTable::new(entries.iter().copied()),
            None => Ok(SubstitutionTable::default()),
        }
    }

    /// Build the blocklist this configuration describes.
    pub fn blocklist(&self) -> Result<Blocklist> {
        match &self.signatures {
            Some(terms) => Blocklist::new(terms.iter().cloned()),
            None => Ok(Blocklist::default()),
        }
    }
}

/// Parse `<from> <to>`, each a single character.
fn parse_substitution(args: &str) -> std::result::Result<(char, char), String> {
    let mut parts = args.split_whitespace();
    let (Some(from), Some(to), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err("substitute expects exactly two characters".to_string());
    };
    Ok((single_char(from)?, single_char(to)?))
}

fn single_char(token: &str) -> std::result::Result<char, String> {
    let token = unquote(token);
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("expected a single character, found '{}'", token)),
    }
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_file() {
        let config = RulesConfig::from_string(
            r#"
            # comment
            substitute 0 o
            SUBSTITUTE 8 b
            signature paypal
            signature "union select"
            match_policy longest
            "#,
        )
        .unwrap();

        assert_eq!(config.substitutions, Some(vec![('0', 'o'), ('8', 'b')]));
        assert_eq!(
            config.signatures,
            Some(vec!["paypal".to_string(), "union select".to_string()])
        );
        assert_eq!(config.policy, MatchPolicy::LongestTerm);
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = RulesConfig::from_string("signature bank\n").unwrap();
        assert_eq!(config.substitutions, None);
        assert_eq!(config.policy, MatchPolicy::FirstInTable);
        assert_eq!(config.substitution_table().unwrap(), SubstitutionTable::default());
        assert_eq!(config.blocklist().unwrap().terms(), &["bank".to_string()]);
    }

    #[test]
    fn test_quoted_characters() {
        let config = RulesConfig::from_string("substitute \"$\" s\n").unwrap();
        assert_eq!(config.substitutions, Some(vec![('$', 's')]));
    }

    #[test]
    fn test_bad_substitution_location() {
        let err = RulesConfig::from_string("signature bank\n  substitute 10 o\n").unwrap_err();
        match err {
            Error::Parse {
                location,
                source_text,
                ..
            } => {
                assert_eq!(location, "2:14");
                assert_eq!(source_text.as_deref(), Some("  substitute 10 o"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_signature_term() {
        let err = RulesConfig::from_string("signature\n").unwrap_err();
        assert!(err.to_string().contains("signature requires a term"));
    }

    #[test]
    fn test_bad_policy() {
        let err = RulesConfig::from_string("match_policy random\n").unwrap_err();
        assert!(err.to_string().contains("unknown match policy"));
    }

    #[test]
    fn test_unknown_keyword_skipped() {
        let config = RulesConfig::from_string("frobnicate 1 2\nsignature bank\n").unwrap();
        assert_eq!(config.signatures, Some(vec!["bank".to_string()]));
    }

    #[test]
    fn test_table_validation_happens_at_build() {
        let config = RulesConfig::from_string("substitute 4 a\nsubstitute 4 e\n").unwrap();
        assert!(config.substitution_table().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = RulesConfig::from_file("/nonexistent/unified-waf.rules").unwrap_err();
        assert!(matches!(err, Error::RuleFileLoad { .. }));
    }

    #[test]
    fn test_load_file_and_error_location() {
        let dir = std::env::temp_dir().join(format!("unified-waf-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let good = dir.join("good.rules");
        std::fs::write(&good, "substitute 8 b\nsignature b0b\nmatch_policy longest\n").unwrap();
        let config = RulesConfig::from_file(&good).unwrap();
        assert_eq!(config.substitutions, Some(vec![('8', 'b')]));
        assert_eq!(config.policy, MatchPolicy::LongestTerm);

        let firewall = crate::Firewall::from_file(&good).unwrap();
        assert!(firewall.inspect("808").is_blocked());

        let bad = dir.join("bad.rules");
        std::fs::write(&bad, "# header\nsignature bank\nsubstitute xy z\n").unwrap();
        let err = RulesConfig::from_file(&bad).unwrap_err();
        match err {
            Error::Parse { location, .. } => {
                assert_eq!(location, format!("{}:3:12", bad.display()));
            }
            other => panic!("unexpected error: {other}"),
        }

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
