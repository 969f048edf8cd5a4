//! Tool-facing report tests (JSON shape as consumed by the CLI and WASM).

use amx_mangle::report::{CheckReport, DemangleReport, MangleReport};
use amx_sig::{ErrorCategory, ErrorCode};

const SET_TIMER_JSON: &str = r#"{
    "base_name": "SetTimer",
    "prototype": {
        "parameters": [
            { "shape": { "scalar": { "ty": "string" } } },
            { "shape": { "scalar": { "ty": "signed_int" } } },
            { "shape": { "scalar": { "ty": "bool" } } }
        ],
        "return_type": { "ty": "signed_int" }
    }
}"#;

// ─────────────────────────────────────────────────────────────────────
// Demangle
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_demangle_report_success() {
    let report = DemangleReport::new("SetTimer@3sib@i");
    assert!(report.success);
    assert!(report.error.is_none());
    assert_eq!(
        report.prototype.as_deref(),
        Some("native SetTimer(string, int, bool) -> int")
    );

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["signature"]["base_name"], "SetTimer");
    assert_eq!(json["signature"]["convention"], "standard");
    assert!(json.get("error").is_none());
}

#[test]
fn test_demangle_report_failure() {
    let report = DemangleReport::new("f@2iii");
    assert!(!report.success);
    assert!(report.signature.is_none());
    let error = report.error.as_ref().unwrap();
    assert_eq!(error.code, ErrorCode::COUNT_MISMATCH);
    assert_eq!(error.category, ErrorCategory::Parse);
    assert_eq!(error.subject, "f@2iii");

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["error"]["code"], 202);
    assert_eq!(json["error"]["category"], "parse");
    assert!(json.get("signature").is_none());
}

// ─────────────────────────────────────────────────────────────────────
// Check
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_check_report_match() {
    let report = CheckReport::new("SetTimer@3sib@i", "SetTimer@3sib@i");
    assert!(report.matched);
    assert!(report.error.is_none());
}

#[test]
fn test_check_report_mismatch() {
    let report = CheckReport::new("SetTimer@3sib@i", "SetTimer@3sfb@i");
    assert!(!report.matched);
    let error = report.error.unwrap();
    assert_eq!(error.code, ErrorCode::TYPE_MISMATCH);
    assert_eq!(error.category, ErrorCategory::Bind);
    assert_eq!(error.subject, "SetTimer@3sfb@i");
}

#[test]
fn test_check_report_bad_expectation() {
    let report = CheckReport::new("SetTimer", "SetTimer@3sib@i");
    assert!(!report.matched);
    let error = report.error.unwrap();
    assert_eq!(error.code, ErrorCode::MISSING_SEPARATOR);
    assert_eq!(error.subject, "SetTimer");
}

// ─────────────────────────────────────────────────────────────────────
// Mangle
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_mangle_report_success() {
    let report = MangleReport::from_json(SET_TIMER_JSON);
    assert!(report.success);
    assert_eq!(report.mangled.as_deref(), Some("SetTimer@3sib@i"));
}

#[test]
fn test_mangle_report_rejects_invalid_signature() {
    let report = MangleReport::from_json(r#"{ "base_name": "NoProto" }"#);
    assert!(!report.success);
    assert!(report.mangled.is_none());
    assert!(report.error.is_some());

    let report = MangleReport::from_json("not json");
    assert!(!report.success);
}

#[test]
fn test_mangle_demangle_agree() {
    let mangled = MangleReport::from_json(SET_TIMER_JSON).mangled.unwrap();
    let demangled = DemangleReport::new(&mangled);
    let original: serde_json::Value = serde_json::from_str(SET_TIMER_JSON).unwrap();
    let decoded = serde_json::to_value(demangled.signature.unwrap()).unwrap();
    assert_eq!(decoded["base_name"], original["base_name"]);
    assert_eq!(
        decoded["prototype"]["parameters"],
        original["prototype"]["parameters"]
    );
}
