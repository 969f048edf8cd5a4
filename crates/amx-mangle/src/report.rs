//! Serialisable results for tool surfaces (the CLI and the WASM module).
//!
//! Each report is self-contained: tools print or ship it as JSON and never
//! need to inspect the codec's error types directly.

use amx_sig::{Diagnostic, Signature};
use serde::Serialize;

use crate::decoder::decode;
use crate::encoder::encode;
use crate::validate::validate;

/// Result of demangling one export name.
#[derive(Debug, Clone, Serialize)]
pub struct DemangleReport {
    pub name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    /// Pawn-like rendering of `signature`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prototype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Diagnostic>,
}

impl DemangleReport {
    pub fn new(name: &str) -> Self {
        match decode(name) {
            Ok(signature) => Self {
                name: name.to_string(),
                success: true,
                prototype: Some(signature.to_string()),
                signature: Some(signature),
                error: None,
            },
            Err(err) => Self {
                name: name.to_string(),
                success: false,
                signature: None,
                prototype: None,
                error: Some(err.to_diagnostic(name)),
            },
        }
    }
}

/// Result of checking a candidate export against an expected mangled name.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub expected: String,
    pub candidate: String,
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Diagnostic>,
}

impl CheckReport {
    pub fn new(expected: &str, candidate: &str) -> Self {
        let error = match decode(expected) {
            Err(err) => Some(err.to_diagnostic(expected)),
            Ok(signature) => validate(&signature, candidate)
                .err()
                .map(|mismatch| mismatch.to_diagnostic(candidate)),
        };
        Self {
            expected: expected.to_string(),
            candidate: candidate.to_string(),
            matched: error.is_none(),
            error,
        }
    }
}

/// Result of mangling a JSON signature description.
#[derive(Debug, Clone, Serialize)]
pub struct MangleReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mangled: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MangleReport {
    /// Parse `json` as a [`Signature`] (validating it) and encode it.
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Signature>(json) {
            Ok(signature) => Self {
                success: true,
                mangled: Some(encode(&signature)),
                error: None,
            },
            Err(err) => Self {
                success: false,
                mangled: None,
                error: Some(err.to_string()),
            },
        }
    }
}
