//! # unified-waf
//!
//! Single-pass payload inspection for URLs, request lines and similar
//! packet fragments.
//!
//! Two analyses run side by side over one left-to-right pass:
//!
//! - a pushdown automaton over `<`, `{`, `(` and their closers that flags
//!   unexpected closers, crossed nesting and truncated input;
//! - a signature scanner that folds case and leet-speak substitutions
//!   (`P4YPAL` → `paypal`) before matching a blocklist of terms.
//!
//! Both produce an ordered audit trail, and the two results are merged into
//! an ALLOWED/BLOCKED verdict.
//!
//! ## Quick Start
//!
//! ```
//! use unified_waf::{Decision, Firewall, Reason};
//!
//! let firewall = Firewall::new();
//! let result = firewall.inspect("http://www.P4YPAL-S3CUR3.com/l0g1n");
//!
//! assert_eq!(result.verdict.decision, Decision::Blocked);
//! assert_eq!(result.verdict.reason, Reason::PhishingSignature);
//! assert_eq!(result.signature_log[0].snippet, "P4YPAL");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod signature;
pub mod structural;
pub mod tables;

// Re-export main types at crate root
pub use audit::{Delimiter, SignatureEntry, StructuralAction, StructuralEntry};
pub use config::RulesConfig;
pub use engine::{inspect, Decision, Firewall, Inspection, Reason, Verdict};
pub use error::{Error, Result};
pub use signature::MatchPolicy;
pub use tables::{Blocklist, SubstitutionTable};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
