//! Inspection engine.
//!
//! A [`Firewall`] owns the compiled tables and is cheap to clone; every call
//! to [`Firewall::inspect`] runs with its own validator, scanner and logs, so
//! one firewall can serve any number of threads.

pub mod inspection;
pub mod verdict;

pub use inspection::Inspection;
pub use verdict::{Decision, Reason, Verdict};

use crate::config::RulesConfig;
use crate::error::Result;
use crate::normalize::Normalizer;
use crate::signature::{MatchPolicy, SignatureSet};
use crate::tables::{Blocklist, SubstitutionTable};
use once_cell::sync::Lazy;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Tables compiled for inspection.
#[derive(Debug)]
pub(crate) struct CompiledRules {
    pub(crate) normalizer: Normalizer,
    pub(crate) signatures: SignatureSet,
}

/// Main inspection engine.
#[derive(Clone)]
pub struct Firewall {
    rules: Arc<CompiledRules>,
}

static DEFAULT_FIREWALL: Lazy<Firewall> = Lazy::new(Firewall::new);

impl Firewall {
    /// Create a firewall with the built-in substitution table and blocklist.
    pub fn new() -> Self {
        let normalizer = Normalizer::default();
        // The default blocklist is non-empty with no empty terms, which is all
        // automaton construction requires.
        let signatures =
            SignatureSet::new(&Blocklist::default(), &normalizer, MatchPolicy::default())
                .expect("default blocklist compiles");
        Self {
            rules: Arc::new(CompiledRules {
                normalizer,
                signatures,
            }),
        }
    }

    /// Create a firewall from explicit tables.
    pub fn with_tables(
        substitutions: SubstitutionTable,
        blocklist: &Blocklist,
        policy: MatchPolicy,
    ) -> Result<Self> {
        let normalizer = Normalizer::new(substitutions);
        let signatures = SignatureSet::new(blocklist, &normalizer, policy)?;
        info!(
            substitutions = normalizer.table().len(),
            signatures = signatures.terms().len(),
            policy = policy.name(),
            "compiled inspection tables"
        );
        Ok(Self {
            rules: Arc::new(CompiledRules {
                normalizer,
                signatures,
            }),
        })
    }

    /// Create a firewall from a parsed configuration.
    pub fn from_config(config: &RulesConfig) -> Result<Self> {
        Self::with_tables(
            config.substitution_table()?,
            &config.blocklist()?,
            config.policy,
        )
    }

    /// Load tables from a rules file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_config(&RulesConfig::from_file(path)?)
    }

    /// Load tables from a rules string.
    pub fn from_string(rules: &str) -> Result<Self> {
        Self::from_config(&RulesConfig::from_string(rules)?)
    }

    /// Inspect one payload.
    pub fn inspect(&self, payload: &str) -> Inspection {
        Inspection::run(payload, &self.rules)
    }

    /// Normalize one character with this firewall's substitution table.
    pub fn normalize(&self, c: char) -> char {
        self.rules.normalizer.normalize(c)
    }

    /// Canonical blocklist terms, in priority order.
    pub fn signatures(&self) -> &[String] {
        self.rules.signatures.terms()
    }

    /// The substitution table in use.
    pub fn substitutions(&self) -> &SubstitutionTable {
        self.rules.normalizer.table()
    }

    /// The tie-break policy in use.
    pub fn policy(&self) -> MatchPolicy {
        self.rules.signatures.policy()
    }
}

impl Default for Firewall {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Firewall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Firewall")
            .field("substitutions", &self.substitutions().len())
            .field("signatures", &self.signatures().len())
            .field("policy", &self.policy())
            .finish()
    }
}

/// Inspect one payload with the built-in tables.
pub fn inspect(payload: &str) -> Inspection {
    DEFAULT_FIREWALL.inspect(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{Delimiter, StructuralAction};

    #[test]
    fn test_balanced_neutral() {
        let result = inspect("(a(b)c)");
        assert_eq!(result.verdict.decision, Decision::Allowed);
        assert_eq!(result.verdict.reason, Reason::Clean);
        assert!(result.structural_log.last().unwrap().stack.is_empty());
        assert!(result.final_stack.is_empty());
        assert!(result.signature_log.is_empty());
    }

    #[test]
    fn test_unexpected_closer() {
        let result = inspect(")");
        assert_eq!(result.structural_log.len(), 1);
        assert_eq!(result.structural_log[0].position, 0);
        assert_eq!(
            result.structural_log[0].action,
            StructuralAction::UnexpectedClosing {
                close: Delimiter::Paren
            }
        );
        assert_eq!(result.verdict.decision, Decision::Blocked);
        assert_eq!(result.verdict.reason, Reason::MalformedInjection);
    }

    #[test]
    fn test_mismatched_pair() {
        let result = inspect("<a}");
        let anomaly = result.anomaly().unwrap();
        assert_eq!(anomaly.position, 2);
        assert_eq!(
            anomaly.action,
            StructuralAction::Mismatch {
                open: Delimiter::Angle,
                close: Delimiter::Brace
            }
        );
        assert!(result.is_blocked());
    }

    #[test]
    fn test_truncation() {
        let result = inspect("<a");
        assert_eq!(result.structural_log.len(), 2);
        assert!(!result.structural_log[0].action.is_anomaly());
        let eof = &result.structural_log[1];
        assert_eq!(eof.position, 2);
        assert_eq!(eof.character, None);
        assert_eq!(eof.description, "Truncated Request: Unclosed tag '<'");
        assert_eq!(result.final_stack, vec![Delimiter::Angle]);
        assert_eq!(result.verdict.reason, Reason::MalformedInjection);
    }

    #[test]
    fn test_leet_speak_detection() {
        let result = inspect("P4YPAL-S3CUR3");
        let first = &result.signature_log[0];
        assert_eq!(first.term, "paypal");
        assert_eq!(first.snippet, "P4YPAL");
        assert_eq!(first.position, 5);
        assert_eq!(result.verdict.decision, Decision::Blocked);
        assert_eq!(result.verdict.reason, Reason::PhishingSignature);
    }

    #[test]
    fn test_balanced_and_malicious() {
        let result = inspect("(SELECT * FROM users)");
        let actions: Vec<_> = result.structural_log.iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![
                StructuralAction::Push {
                    open: Delimiter::Paren
                },
                StructuralAction::Pop {
                    open: Delimiter::Paren
                },
            ]
        );
        assert!(result.final_stack.is_empty());
        assert!(result.structurally_valid);
        assert_eq!(result.signature_log.len(), 1);
        assert_eq!(result.signature_log[0].term, "select");
        assert_eq!(result.signature_log[0].snippet, "SELECT");
        assert_eq!(result.verdict.reason, Reason::PhishingSignature);
    }

    #[test]
    fn test_malformed_and_malicious_reports_both() {
        let result = inspect("http://site.com/id=5) OR 1=1 union");
        assert!(!result.structurally_valid);
        assert!(result.signature_matched);
        assert_eq!(result.signature_log[0].term, "union");
        assert_eq!(result.verdict.reason, Reason::MalformedInjection);
    }

    #[test]
    fn test_idempotent() {
        let payload = "http://site.com/comment?msg=<script>alert(1)</script>";
        let a = inspect(payload);
        let b = inspect(payload);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_unrelated_matches_in_order() {
        let result = inspect("b4nk then 4dm!n");
        let terms: Vec<_> = result.signature_log.iter().map(|e| e.term.as_str()).collect();
        assert_eq!(terms, vec!["bank", "admin"]);
        assert!(result.signature_log[0].position < result.signature_log[1].position);
    }

    #[test]
    fn test_sample_payloads() {
        let cases = [
            ("http://www.P4YPAL-S3CUR3.com/l0g1n", Reason::PhishingSignature),
            (
                "http://site.com/search?q=(SELECT * FROM users)",
                Reason::PhishingSignature,
            ),
            ("http://site.com/id=5) OR 1=1", Reason::MalformedInjection),
            (
                "http://site.com/comment?msg=<script>alert(1)</script>",
                Reason::PhishingSignature,
            ),
            ("http://www.google.com/search?q=hello+world", Reason::Clean),
        ];
        for (payload, expected) in cases {
            assert_eq!(inspect(payload).verdict.reason, expected, "{}", payload);
        }
    }

    #[test]
    fn test_script_tags_are_balanced() {
        let result = inspect("<script>alert(1)</script>");
        assert!(result.structurally_valid);
        assert_eq!(result.signature_log.len(), 2);
        assert_eq!(result.verdict.reason, Reason::PhishingSignature);
    }

    #[test]
    fn test_empty_payload() {
        let result = inspect("");
        assert_eq!(result.verdict.decision, Decision::Allowed);
        assert!(result.structural_log.is_empty());
        assert!(result.signature_log.is_empty());
    }

    #[test]
    fn test_custom_rules() {
        let firewall = Firewall::from_string(
            "substitute 8 b\nsignature bob\nsignature \"d0g\"\n",
        )
        .unwrap();
        assert_eq!(firewall.signatures(), &["bob".to_string(), "d0g".to_string()]);
        let result = firewall.inspect("B08");
        assert_eq!(result.signature_log.len(), 0);
        let result = firewall.inspect("8o8");
        assert_eq!(result.signature_log[0].snippet, "8o8");
        // Only the custom table is active: '4' is not folded.
        assert_eq!(firewall.normalize('4'), '4');
        assert!(!firewall.inspect("p4yp4l").is_blocked());
    }

    #[test]
    fn test_bad_rules_fail_before_inspection() {
        assert!(Firewall::from_string("substitute A a\n").is_err());
        assert!(Firewall::from_string("signature \"\"\n").is_err());
    }

    #[test]
    fn test_format_log() {
        let log = inspect("<a").format_log();
        assert!(log.contains("[decision BLOCKED]"));
        assert!(log.contains("[reason: Malformed/Injection]"));
        assert!(log.contains("[anomaly at 2: Truncated Request: Unclosed tag '<']"));
        assert!(log.contains("[open: <]"));

        let log = inspect("P4YPAL-S3CUR3").format_log();
        assert!(log.contains("[signatures: paypal, secure]"));
    }

    #[test]
    fn test_concurrent_inspections() {
        let firewall = Firewall::new();
        let payloads = [
            "P4YPAL-S3CUR3",
            "(a(b)c)",
            "<a}",
            "(SELECT * FROM users)",
            "b4nk then 4dm!n",
        ];
        let expected: Vec<_> = payloads.iter().map(|p| firewall.inspect(p)).collect();

        std::thread::scope(|s| {
            let handles: Vec<_> = payloads
                .iter()
                .map(|p| {
                    let fw = firewall.clone();
                    s.spawn(move || fw.inspect(p))
                })
                .collect();
            for (handle, want) in handles.into_iter().zip(&expected) {
                assert_eq!(&handle.join().unwrap(), want);
            }
        });
    }
}
