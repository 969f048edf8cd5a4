//! Decode and bind-time error types.

use amx_sig::{
    CallingConvention, DefaultValue, Diagnostic, ElementType, ErrorCode, Parameter, SignatureError,
    SimpleType, Span, TagSet, VariadicTail,
};
use thiserror::Error;

/// Why a mangled name failed to decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("no '@' separates a base name from a signature")]
    MissingSeparator,

    #[error("empty base name")]
    EmptyBaseName,

    #[error("invalid base name '{0}'")]
    InvalidBaseName(String),

    /// Empty, non-digit, leading zero, or too large.
    #[error("malformed decimal: {0}")]
    MalformedDecimal(&'static str),

    #[error("declared {declared} parameters, found {found}")]
    CountMismatch { declared: usize, found: usize },

    #[error("unknown type code '{0}'")]
    UnknownTypeCode(char),

    #[error("unexpected end of name")]
    UnexpectedEnd,

    #[error("invalid tag name '{0}'")]
    InvalidTagName(String),

    #[error("tag set {{{0}}} is implied and cannot be written explicitly")]
    ImplicitTag(String),

    #[error("tags not in ascending order: '{previous}' is followed by '{next}'")]
    TagsNotAscending { previous: String, next: String },

    #[error("parameter {param} refers to parameter {target}, but only {count} are declared")]
    IndexOutOfRange {
        param: usize,
        target: usize,
        count: usize,
    },

    // Forward references are rejected until a native is known to need one.
    #[error("parameter {param} refers to parameter {target}, which does not precede it")]
    ForwardReference { param: usize, target: usize },

    #[error("unexpected trailing characters '{0}'")]
    TrailingCharacters(String),

    #[error("'O' must be followed by the end of the name or a parameter count")]
    IncompleteOptcall,

    /// The decoded structure broke a model rule the grammar cannot express.
    #[error("{0}")]
    Rejected(SignatureError),
}

impl From<SignatureError> for ParseErrorKind {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::InvalidBaseName(name) => Self::InvalidBaseName(name),
            SignatureError::InvalidTagName(name) => Self::InvalidTagName(name),
            SignatureError::TagsNotAscending { previous, next } => {
                Self::TagsNotAscending { previous, next }
            }
            SignatureError::ImplicitTag(tag) => Self::ImplicitTag(tag),
            SignatureError::IndexOutOfRange {
                param,
                target,
                count,
            } => Self::IndexOutOfRange {
                param,
                target,
                count,
            },
            SignatureError::ForwardReference { param, target } => {
                Self::ForwardReference { param, target }
            }
            other => Self::Rejected(other),
        }
    }
}

/// A decode failure and where in the mangled name it happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {span}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

impl ParseError {
    pub fn new(kind: impl Into<ParseErrorKind>, span: Span) -> Self {
        Self {
            kind: kind.into(),
            span,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match &self.kind {
            ParseErrorKind::MissingSeparator => ErrorCode::MISSING_SEPARATOR,
            ParseErrorKind::EmptyBaseName => ErrorCode::EMPTY_BASE_NAME,
            ParseErrorKind::InvalidBaseName(_) => ErrorCode::BAD_BASE_NAME,
            ParseErrorKind::MalformedDecimal(_) => ErrorCode::MALFORMED_DECIMAL,
            ParseErrorKind::CountMismatch { .. } => ErrorCode::COUNT_MISMATCH,
            ParseErrorKind::UnknownTypeCode(_) => ErrorCode::UNKNOWN_TYPE_CODE,
            ParseErrorKind::UnexpectedEnd => ErrorCode::UNEXPECTED_END,
            ParseErrorKind::InvalidTagName(_) => ErrorCode::BAD_TAG_NAME,
            ParseErrorKind::ImplicitTag(_) => ErrorCode::EXPLICIT_IMPLICIT_TAG,
            ParseErrorKind::TagsNotAscending { .. } => ErrorCode::BAD_TAG_ORDER,
            ParseErrorKind::IndexOutOfRange { .. } => ErrorCode::BAD_INDEX,
            ParseErrorKind::ForwardReference { .. } => ErrorCode::BAD_FORWARD_INDEX,
            ParseErrorKind::TrailingCharacters(_) => ErrorCode::TRAILING_CHARACTERS,
            ParseErrorKind::IncompleteOptcall => ErrorCode::INCOMPLETE_OPTCALL,
            ParseErrorKind::Rejected(_) => ErrorCode::REJECTED_SIGNATURE,
        }
    }

    /// Diagnostic pointing into `mangled`, the name that failed to decode.
    pub fn to_diagnostic(&self, mangled: &str) -> Diagnostic {
        let diag = Diagnostic::new(self.code(), self.kind.to_string(), mangled).with_span(self.span);
        match &self.kind {
            ParseErrorKind::ImplicitTag(_) => {
                diag.with_suggestion("drop the `t` block; the type code already implies the tag")
            }
            ParseErrorKind::MalformedDecimal("leading zero") => {
                diag.with_suggestion("decimals are written without leading zeros")
            }
            _ => diag,
        }
    }
}

/// Why a candidate native does not satisfy the expected signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Mismatch {
    #[error("candidate cannot be decoded: {0}")]
    Undecodable(ParseError),

    #[error("base name: expected '{expected}', found '{found}'")]
    Name { expected: String, found: String },

    #[error("calling convention: expected {expected}, found {found}")]
    Convention {
        expected: CallingConvention,
        found: CallingConvention,
    },

    #[error("parameter count: expected {expected}, found {found}")]
    Count { expected: usize, found: usize },

    #[error("parameter {index}: expected `{expected}`, found `{found}`")]
    Shape {
        index: usize,
        expected: Parameter,
        found: Parameter,
    },

    #[error("parameter {index}: expected type {expected}, found {found}")]
    Type {
        index: usize,
        expected: SimpleType,
        found: SimpleType,
    },

    #[error("parameter {index}: expected tags {expected}, found {found}")]
    Tag {
        index: usize,
        expected: TagSet,
        found: TagSet,
    },

    #[error(
        "parameter {index}: expected default {}, found {}",
        describe(.expected),
        describe(.found)
    )]
    Default {
        index: usize,
        expected: Option<DefaultValue>,
        found: Option<DefaultValue>,
    },

    #[error(
        "variadic tail: expected {}, found {}",
        describe(.expected),
        describe(.found)
    )]
    Variadic {
        expected: Option<VariadicTail>,
        found: Option<VariadicTail>,
    },

    #[error("return type: expected {expected}, found {}", describe(.found))]
    Return {
        expected: ElementType,
        found: Option<ElementType>,
    },
}

fn describe<T: std::fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => format!("`{v}`"),
        None => "none".to_string(),
    }
}

impl Mismatch {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Undecodable(_) => ErrorCode::UNDECODABLE_CANDIDATE,
            Self::Name { .. } => ErrorCode::NAME_MISMATCH,
            Self::Convention { .. } => ErrorCode::CONVENTION_MISMATCH,
            Self::Count { .. } => ErrorCode::PARAM_COUNT_MISMATCH,
            Self::Shape { .. } => ErrorCode::SHAPE_MISMATCH,
            Self::Type { .. } => ErrorCode::TYPE_MISMATCH,
            Self::Tag { .. } => ErrorCode::TAG_MISMATCH,
            Self::Default { .. } => ErrorCode::DEFAULT_MISMATCH,
            Self::Variadic { .. } => ErrorCode::VARIADIC_MISMATCH,
            Self::Return { .. } => ErrorCode::RETURN_MISMATCH,
        }
    }

    /// Parameter the mismatch is about, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Shape { index, .. }
            | Self::Type { index, .. }
            | Self::Tag { index, .. }
            | Self::Default { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Diagnostic about `candidate`, the mangled name that was checked.
    pub fn to_diagnostic(&self, candidate: &str) -> Diagnostic {
        let diag = Diagnostic::new(self.code(), self.to_string(), candidate);
        match self {
            Self::Undecodable(err) => diag.with_span(err.span),
            _ => diag,
        }
    }
}
