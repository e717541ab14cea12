//! Audit trail entries produced during an inspection.
//!
//! Each analysis appends to its own log. Entries are plain values: the stack
//! snapshot in a [`StructuralEntry`] is an independent copy taken when the
//! entry was recorded.

use serde::Serialize;
use std::fmt;

/// A delimiter family tracked by the structural validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    /// `<` ... `>`
    Angle,
    /// `{` ... `}`
    Brace,
    /// `(` ... `)`
    Paren,
}

impl Delimiter {
    /// Classify an opening character.
    #[inline]
    pub fn from_opener(c: char) -> Option<Self> {
        match c {
            '<' => Some(Self::Angle),
            '{' => Some(Self::Brace),
            '(' => Some(Self::Paren),
            _ => None,
        }
    }

    /// Classify a closing character.
    #[inline]
    pub fn from_closer(c: char) -> Option<Self> {
        match c {
            '>' => Some(Self::Angle),
            '}' => Some(Self::Brace),
            ')' => Some(Self::Paren),
            _ => None,
        }
    }

    /// The opening character.
    pub fn opener(self) -> char {
        match self {
            Self::Angle => '<',
            Self::Brace => '{',
            Self::Paren => '(',
        }
    }

    /// The closing character.
    pub fn closer(self) -> char {
        match self {
            Self::Angle => '>',
            Self::Brace => '}',
            Self::Paren => ')',
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opener())
    }
}

/// What the structural validator did at a given position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuralAction {
    /// An opener was pushed.
    Push {
        /// Pushed delimiter.
        open: Delimiter,
    },
    /// A closer matched the top of the stack, which was popped.
    Pop {
        /// Popped delimiter.
        open: Delimiter,
    },
    /// A closer arrived with nothing open.
    UnexpectedClosing {
        /// The closing delimiter.
        close: Delimiter,
    },
    /// A closer did not match the top of the stack.
    Mismatch {
        /// Delimiter on top of the stack.
        open: Delimiter,
        /// The closing delimiter that arrived.
        close: Delimiter,
    },
    /// Input ended with delimiters still open.
    Truncated {
        /// Innermost unclosed delimiter.
        open: Delimiter,
    },
}

impl StructuralAction {
    /// Whether this action is a structural fault.
    pub fn is_anomaly(&self) -> bool {
        !matches!(self, Self::Push { .. } | Self::Pop { .. })
    }

    /// Human-readable description.
    pub fn description(&self) -> String {
        match *self {
            Self::Push { open } => format!("Push '{}' onto stack", open.opener()),
            Self::Pop { open } => format!("Pop '{}' - Match found", open.opener()),
            Self::UnexpectedClosing { close } => {
                format!("Injection Suspected: Unexpected closing '{}'", close.closer())
            }
            Self::Mismatch { open, close } => format!(
                "Syntax Error: Mismatched '{}' vs '{}'",
                open.opener(),
                close.closer()
            ),
            Self::Truncated { open } => {
                format!("Truncated Request: Unclosed tag '{}'", open.opener())
            }
        }
    }
}

/// One structural log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuralEntry {
    /// Character index in the payload; the payload length for end of input.
    pub position: usize,
    /// The raw character, or `None` for the end-of-input entry.
    pub character: Option<char>,
    /// The transition taken.
    pub action: StructuralAction,
    /// Human-readable description of the transition.
    pub description: String,
    /// Stack contents right after the transition, bottom first.
    pub stack: Vec<Delimiter>,
    /// Structural validity right after the transition.
    pub valid: bool,
}

impl StructuralEntry {
    /// Record a transition, snapshotting the stack.
    pub fn new(
        position: usize,
        character: Option<char>,
        action: StructuralAction,
        stack: &[Delimiter],
        valid: bool,
    ) -> Self {
        Self {
            position,
            character,
            action,
            description: action.description(),
            stack: stack.to_vec(),
            valid,
        }
    }
}

impl fmt::Display for StructuralEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.character {
            Some(c) => write!(f, "[{}] '{}' ", self.position, c)?,
            None => write!(f, "[{}] EOF ", self.position)?,
        }
        write!(f, "{} stack=[{}]", self.description, format_stack(&self.stack))
    }
}

/// One signature log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureEntry {
    /// Character index of the last character of the match.
    pub position: usize,
    /// The canonical (normalized) blocklist term.
    pub term: String,
    /// The raw payload text covering the match.
    pub snippet: String,
    /// Human-readable description.
    pub description: String,
}

impl SignatureEntry {
    /// Record a match.
    pub fn new(position: usize, term: impl Into<String>, snippet: impl Into<String>) -> Self {
        let term = term.into();
        let snippet = snippet.into();
        let description = format!("Phishing Pattern: '{}' (Normalized: {})", snippet, term);
        Self {
            position,
            term,
            snippet,
            description,
        }
    }
}

impl fmt::Display for SignatureEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.position, self.description)
    }
}

/// Render a stack as comma-separated openers, bottom first.
pub fn format_stack(stack: &[Delimiter]) -> String {
    stack
        .iter()
        .map(|d| d.opener().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
