//! Final admit/block decision.

use serde::Serialize;
use std::fmt;

/// Admit or block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    /// The payload may pass.
    Allowed,
    /// The payload must be rejected.
    Blocked,
}

impl Decision {
    /// Upper-case name, as shown in reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Allowed => "ALLOWED",
            Self::Blocked => "BLOCKED",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Reason {
    /// Structural fault: unexpected closer, mismatched pair or truncation.
    #[serde(rename = "Malformed/Injection")]
    MalformedInjection,
    /// A blocklist term matched.
    #[serde(rename = "Phishing Signature")]
    PhishingSignature,
    /// Nothing found.
    #[serde(rename = "Clean")]
    Clean,
}

impl Reason {
    /// Human-readable reason.
    pub fn description(&self) -> &'static str {
        match self {
            Self::MalformedInjection => "Malformed/Injection",
            Self::PhishingSignature => "Phishing Signature",
            Self::Clean => "Clean",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// The outcome of one inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Verdict {
    /// Admit or block.
    pub decision: Decision,
    /// Why.
    pub reason: Reason,
}

impl Verdict {
    /// Combine the two analyses. A structural fault outranks a signature
    /// match.
    pub fn from_analyses(structurally_valid: bool, signature_matched: bool) -> Self {
        if !structurally_valid {
            Self {
                decision: Decision::Blocked,
                reason: Reason::MalformedInjection,
            }
        } else if signature_matched {
            Self {
                decision: Decision::Blocked,
                reason: Reason::PhishingSignature,
            }
        } else {
            Self {
                decision: Decision::Allowed,
                reason: Reason::Clean,
            }
        }
    }

    /// Whether the payload is blocked.
    pub fn is_blocked(&self) -> bool {
        self.decision == Decision::Blocked
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.decision, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let v = Verdict::from_analyses(false, true);
        assert_eq!(v.decision, Decision::Blocked);
        assert_eq!(v.reason, Reason::MalformedInjection);

        let v = Verdict::from_analyses(true, true);
        assert_eq!(v.reason, Reason::PhishingSignature);
        assert!(v.is_blocked());

        let v = Verdict::from_analyses(true, false);
        assert_eq!(v.decision, Decision::Allowed);
        assert_eq!(v.reason, Reason::Clean);
    }

    #[test]
    fn test_display() {
        let v = Verdict::from_analyses(false, false);
        assert_eq!(v.to_string(), "BLOCKED (Malformed/Injection)");
    }

    #[test]
    fn test_serialize() {
        let v = Verdict::from_analyses(true, true);
        let json = serde_json::to_value(v).unwrap();
        assert_eq!(json["decision"], "BLOCKED");
        assert_eq!(json["reason"], "Phishing Signature");
    }
}
