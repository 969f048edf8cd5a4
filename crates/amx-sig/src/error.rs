use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// A signature value violates a construction rule.
    Model,
    /// A mangled name could not be decoded.
    Parse,
    /// A decoded candidate does not match the expected signature.
    Bind,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => write!(f, "model"),
            Self::Parse => write!(f, "parse"),
            Self::Bind => write!(f, "bind"),
        }
    }
}

/// Numeric error code (E100–E399).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Model errors (E100–E199) ──
    pub const INVALID_BASE_NAME: Self = Self(100);
    pub const INVALID_TAG_NAME: Self = Self(101);
    pub const TAGS_NOT_ASCENDING: Self = Self(102);
    pub const IMPLICIT_TAG: Self = Self(103);
    pub const ZERO_LENGTH: Self = Self(104);
    pub const ZERO_DEPTH: Self = Self(105);
    pub const INDEX_OUT_OF_RANGE: Self = Self(106);
    pub const FORWARD_REFERENCE: Self = Self(107);
    pub const AMBIGUOUS_SHAPE: Self = Self(108);
    pub const INVALID_DEFAULT: Self = Self(109);
    pub const MISSING_PROTOTYPE: Self = Self(110);

    // ── Parse errors (E200–E299) ──
    pub const MISSING_SEPARATOR: Self = Self(200);
    pub const MALFORMED_DECIMAL: Self = Self(201);
    pub const COUNT_MISMATCH: Self = Self(202);
    pub const UNKNOWN_TYPE_CODE: Self = Self(203);
    pub const UNEXPECTED_END: Self = Self(204);
    pub const TRAILING_CHARACTERS: Self = Self(205);
    pub const INCOMPLETE_OPTCALL: Self = Self(206);
    pub const EMPTY_BASE_NAME: Self = Self(209);
    pub const BAD_BASE_NAME: Self = Self(210);
    pub const BAD_TAG_NAME: Self = Self(211);
    pub const BAD_TAG_ORDER: Self = Self(212);
    pub const EXPLICIT_IMPLICIT_TAG: Self = Self(213);
    pub const BAD_INDEX: Self = Self(214);
    pub const BAD_FORWARD_INDEX: Self = Self(215);
    pub const REJECTED_SIGNATURE: Self = Self(299);

    // ── Bind errors (E300–E399) ──
    pub const UNDECODABLE_CANDIDATE: Self = Self(300);
    pub const NAME_MISMATCH: Self = Self(301);
    pub const CONVENTION_MISMATCH: Self = Self(302);
    pub const PARAM_COUNT_MISMATCH: Self = Self(303);
    pub const SHAPE_MISMATCH: Self = Self(304);
    pub const TYPE_MISMATCH: Self = Self(305);
    pub const TAG_MISMATCH: Self = Self(306);
    pub const DEFAULT_MISMATCH: Self = Self(307);
    pub const VARIADIC_MISMATCH: Self = Self(308);
    pub const RETURN_MISMATCH: Self = Self(309);

    /// Get the category for this error code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Model,
            200..=299 => ErrorCategory::Parse,
            _ => ErrorCategory::Bind,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A rule violated while constructing a signature value.
///
/// Construction is the only place these arise: once a [`crate::Signature`]
/// exists, encoding it cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("invalid base name '{0}': expected one or more of [A-Za-z0-9_@]")]
    InvalidBaseName(String),

    #[error("invalid tag name '{0}': expected [A-Za-z0-9_]")]
    InvalidTagName(String),

    #[error("tags not in ascending order: '{previous}' is followed by '{next}'")]
    TagsNotAscending { previous: String, next: String },

    #[error("tag set {{{0}}} is implied and cannot be written explicitly")]
    ImplicitTag(String),

    #[error("parameter {param}: fixed array length must be at least 1")]
    ZeroLength { param: usize },

    #[error("parameter {param}: sizeof depth must be at least 1")]
    ZeroDepth { param: usize },

    #[error("parameter {param}: refers to parameter {target}, but there are only {count}")]
    IndexOutOfRange {
        param: usize,
        target: usize,
        count: usize,
    },

    // Only backward references are accepted.
    #[error("parameter {param}: refers to parameter {target}, which does not precede it")]
    ForwardReference { param: usize, target: usize },

    #[error("parameter {param}: output array of length 1 must be declared as a reference")]
    AmbiguousShape { param: usize },

    #[error("parameter {param}: a derived default requires an untagged int parameter")]
    InvalidDefault { param: usize },

    #[error("the standard calling convention requires a prototype")]
    MissingPrototype,
}

impl SignatureError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidBaseName(_) => ErrorCode::INVALID_BASE_NAME,
            Self::InvalidTagName(_) => ErrorCode::INVALID_TAG_NAME,
            Self::TagsNotAscending { .. } => ErrorCode::TAGS_NOT_ASCENDING,
            Self::ImplicitTag(_) => ErrorCode::IMPLICIT_TAG,
            Self::ZeroLength { .. } => ErrorCode::ZERO_LENGTH,
            Self::ZeroDepth { .. } => ErrorCode::ZERO_DEPTH,
            Self::IndexOutOfRange { .. } => ErrorCode::INDEX_OUT_OF_RANGE,
            Self::ForwardReference { .. } => ErrorCode::FORWARD_REFERENCE,
            Self::AmbiguousShape { .. } => ErrorCode::AMBIGUOUS_SHAPE,
            Self::InvalidDefault { .. } => ErrorCode::INVALID_DEFAULT,
            Self::MissingPrototype => ErrorCode::MISSING_PROTOTYPE,
        }
    }

    /// Render as a diagnostic about `subject` (usually the base name).
    pub fn to_diagnostic(&self, subject: impl Into<String>) -> Diagnostic {
        let diag = Diagnostic::new(self.code(), self.to_string(), subject);
        match self {
            Self::ImplicitTag(_) => {
                diag.with_suggestion("use the `f`/`b` type code, or leave the element untagged")
            }
            Self::AmbiguousShape { .. } => diag.with_suggestion("use ParamShape::Reference"),
            Self::TagsNotAscending { .. } => {
                diag.with_suggestion("build the set with TagSet::sorted")
            }
            _ => diag,
        }
    }
}

/// A structured diagnostic for logs, the CLI and the JSON surfaces.
///
/// Tools render these; they must not parse the `message` text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Error code (e.g., E203).
    pub code: ErrorCode,
    /// Error category (derived from code).
    pub category: ErrorCategory,
    /// Human-readable error message.
    pub message: String,
    /// The mangled name or base name the diagnostic is about.
    pub subject: String,
    /// Location inside `subject`, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Optional fix suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(code: ErrorCode, message: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            code,
            category: code.category(),
            message: message.into(),
            subject: subject.into(),
            span: None,
            suggestion: None,
        }
    }

    /// Attach a location inside the subject.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Multi-line rendering with the subject and a caret under the span.
    pub fn render(&self) -> String {
        let mut out = format!("{self}\n  {}", self.subject);
        if let Some(span) = self.span {
            out.push_str("\n  ");
            out.push_str(&span.underline(&self.subject));
        }
        if let Some(suggestion) = &self.suggestion {
            out.push_str("\n  help: ");
            out.push_str(suggestion);
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.code, self.category, self.message)
    }
}
