//! The single inspection pass and its result.

use super::verdict::Verdict;
use super::CompiledRules;
use crate::audit::{format_stack, Delimiter, SignatureEntry, StructuralEntry};
use crate::structural::StructuralValidator;
use serde::Serialize;
use tracing::debug;

/// Everything one inspection produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inspection {
    /// The inspected payload.
    pub payload: String,
    /// Final decision and reason.
    pub verdict: Verdict,
    /// Structural validator log, in position order.
    pub structural_log: Vec<StructuralEntry>,
    /// Signature scanner log, in position order.
    pub signature_log: Vec<SignatureEntry>,
    /// Validator stack at the end of the pass, bottom first.
    pub final_stack: Vec<Delimiter>,
    /// Whether the structural analysis passed.
    pub structurally_valid: bool,
    /// Whether any signature matched.
    pub signature_matched: bool,
}

impl Inspection {
    /// Run both analyses over `payload` in one left-to-right pass.
    pub(crate) fn run(payload: &str, rules: &CompiledRules) -> Self {
        let mut validator = StructuralValidator::new();
        let mut scanner = rules.signatures.scanner();
        let mut raw: Vec<char> = Vec::with_capacity(payload.len());

        for (position, c) in payload.chars().enumerate() {
            raw.push(c);
            validator.feed(position, c);
            scanner.feed(position, rules.normalizer.normalize(c), &raw);
        }
        validator.finish(raw.len());

        let (structurally_valid, final_stack, structural_log) = validator.into_parts();
        let (signature_matched, signature_log) = scanner.into_parts();
        let verdict = Verdict::from_analyses(structurally_valid, signature_matched);

        debug!(
            decision = %verdict.decision,
            reason = %verdict.reason,
            structural_entries = structural_log.len(),
            signature_entries = signature_log.len(),
            "inspection complete"
        );

        Self {
            payload: payload.to_string(),
            verdict,
            structural_log,
            signature_log,
            final_stack,
            structurally_valid,
            signature_matched,
        }
    }

    /// Whether the payload is blocked.
    pub fn is_blocked(&self) -> bool {
        self.verdict.is_blocked()
    }

    /// The first structural anomaly, if any.
    pub fn anomaly(&self) -> Option<&StructuralEntry> {
        self.structural_log.iter().find(|e| e.action.is_anomaly())
    }

    /// Format as a single log line.
    pub fn format_log(&self) -> String {
        let mut parts = vec![
            format!("[decision {}]", self.verdict.decision),
            format!("[reason: {}]", self.verdict.reason),
        ];

        if let Some(anomaly) = self.anomaly() {
            parts.push(format!(
                "[anomaly at {}: {}]",
                anomaly.position, anomaly.description
            ));
        }

        if !self.signature_log.is_empty() {
            let terms: Vec<&str> = self.signature_log.iter().map(|e| e.term.as_str()).collect();
            parts.push(format!("[signatures: {}]", terms.join(", ")));
        }

        if !self.final_stack.is_empty() {
            parts.push(format!("[open: {}]", format_stack(&self.final_stack)));
        }

        parts.join(" ")
    }
}
