//! AMX native name codec as a WASM module.
//!
//! Exposes demangling, bind-time checking and mangling via `wasm-bindgen`
//! for binding generators and editor integrations running in a browser.
//!
//! # Usage (JavaScript)
//!
//! ```js
//! import init, { demangle, check } from 'amx-mangle-wasm';
//!
//! await init();
//!
//! console.log(JSON.parse(demangle("SetTimer@3sib@i")).prototype);
//! // "native SetTimer(string, int, bool) -> int"
//! console.log(JSON.parse(check("SetTimer@3sib@i", "SetTimer@3sfb@i")).matched);
//! // false
//! ```

use amx_mangle::report::{CheckReport, DemangleReport, MangleReport};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Decode a mangled export name.
///
/// Returns a JSON `DemangleReport`:
/// ```json
/// { "name": "X@1i", "success": true, "signature": { ... }, "prototype": "native X(int)" }
/// ```
///
/// On failure, `success` is `false` and `error` holds a diagnostic with its
/// code, category, message and span.
#[wasm_bindgen]
pub fn demangle(name: &str) -> String {
    to_json(&DemangleReport::new(name), "name", name)
}

/// Check `candidate` against the signature encoded by `expected`.
///
/// Returns a JSON `CheckReport` whose `matched` field is the verdict.
#[wasm_bindgen]
pub fn check(expected: &str, candidate: &str) -> String {
    to_json(&CheckReport::new(expected, candidate), "candidate", candidate)
}

/// Mangle a JSON signature description.
///
/// Returns a JSON `MangleReport` with the `mangled` name on success.
#[wasm_bindgen]
pub fn mangle(signature_json: &str) -> String {
    to_json(&MangleReport::from_json(signature_json), "input", signature_json)
}

/// Return the codec version string.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_json(report: &impl Serialize, key: &str, subject: &str) -> String {
    serde_json::to_string(report).unwrap_or_else(|e| {
        serde_json::json!({
            "success": false,
            key: subject,
            "error": format!("Serialization error: {e}"),
        })
        .to_string()
    })
}
