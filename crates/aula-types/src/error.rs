use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic category, determined by error code range.
///
/// The parser produces `Lexical` and `Syntactic` diagnostics; the
/// evaluator only ever emits `Semantic` ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Lexical,
    Syntactic,
    Semantic,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lexical => write!(f, "lexical"),
            Self::Syntactic => write!(f, "syntactic"),
            Self::Semantic => write!(f, "semantic"),
        }
    }
}

/// Numeric diagnostic code (E100–E399).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Lexical errors (E100–E199) ──
    pub const UNEXPECTED_CHARACTER: Self = Self(100);
    pub const UNTERMINATED_LITERAL: Self = Self(101);

    // ── Syntactic errors (E200–E299) ──
    pub const UNEXPECTED_TOKEN: Self = Self(200);
    pub const UNEXPECTED_END: Self = Self(201);

    // ── Semantic errors (E300–E399) ──
    pub const UNDECLARED_IDENTIFIER: Self = Self(300);
    pub const DUPLICATE_DECLARATION: Self = Self(301);
    pub const CONST_VIOLATION: Self = Self(302);
    pub const TYPE_MISMATCH: Self = Self(303);
    pub const INCOMPATIBLE_TYPES: Self = Self(304);
    pub const UNSUPPORTED_OPERATOR: Self = Self(305);
    pub const UNSUPPORTED_CAST: Self = Self(306);
    pub const DIVISION_BY_ZERO: Self = Self(307);
    pub const INVALID_ROOT_INDEX: Self = Self(308);
    pub const INDEX_OUT_OF_BOUNDS: Self = Self(309);
    pub const INVALID_INDEX_TYPE: Self = Self(310);
    pub const EMPTY_ARRAY: Self = Self(311);
    pub const CONDITION_TYPE_ERROR: Self = Self(312);
    pub const DUPLICATE_FUNCTION: Self = Self(313);
    pub const UNDEFINED_FUNCTION: Self = Self(314);
    pub const TOO_MANY_ARGUMENTS: Self = Self(315);
    pub const MISSING_ARGUMENT: Self = Self(316);
    pub const RETURN_TYPE_MISMATCH: Self = Self(317);
    pub const MISSING_RETURN_VALUE: Self = Self(318);
    pub const UNINITIALIZED_CONSTANT: Self = Self(319);
    pub const UNKNOWN_PARAMETER: Self = Self(320);
    pub const INVALID_DIMENSIONS: Self = Self(321);
    pub const ARITHMETIC_TRAP: Self = Self(322);
    pub const MISPLACED_TRANSFER: Self = Self(323);

    // Run aborted
    pub const STEP_LIMIT_EXCEEDED: Self = Self(390);
    pub const CALL_DEPTH_EXCEEDED: Self = Self(391);

    /// Get the category for this error code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Lexical,
            200..=299 => ErrorCategory::Syntactic,
            _ => ErrorCategory::Semantic,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A single reported problem, positioned at the node that caused it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: ErrorCode,
    /// Derived from `code`.
    #[serde(rename = "kind")]
    pub category: ErrorCategory,
    pub message: String,
    #[serde(flatten)]
    pub span: Span,
}

impl Diagnostic {
    pub fn new(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            category: code.category(),
            message: message.into(),
            span,
        }
    }

    pub fn line(&self) -> u32 {
        self.span.start_line
    }

    pub fn column(&self) -> u32 {
        self.span.start_col
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.span, self.code, self.category, self.message
        )
    }
}

impl std::error::Error for Diagnostic {}

/// Ordered diagnostics of one run. Nothing is ever dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.items.iter().any(|d| d.code == code)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
