//! Signature model for AMX native functions.
//!
//! This crate defines the value types describing a native's formal
//! signature (parameter shapes, tag sets, derived defaults, variadic tail,
//! calling convention, return type), the validity rules enforced when they
//! are constructed, and the shared diagnostic types used by the codec.

mod error;
mod span;
pub mod signature;

pub use error::{Diagnostic, ErrorCategory, ErrorCode, SignatureError};
pub use signature::{
    ArrayLen, CallingConvention, DefaultValue, ElementType, ParamShape, Parameter, Prototype,
    Signature, SimpleType, TagSet, VariadicTail, BOOL_TAG, FLOAT_TAG,
};
pub use span::Span;

/// Result type used by the signature constructors.
pub type Result<T> = std::result::Result<T, SignatureError>;
