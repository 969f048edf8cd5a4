//! Bind-time validation and native table tests.

use amx_mangle::{validate, Mismatch, NativeEntry, NativeTable, ParseErrorKind, TableError};
use amx_sig::{
    ArrayLen, CallingConvention, DefaultValue, ElementType, ErrorCategory, ErrorCode, Parameter,
    Prototype, Signature, SimpleType, TagSet, VariadicTail,
};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn int() -> Parameter {
    Parameter::scalar(SimpleType::SignedInt)
}

fn native(name: &str, params: Vec<Parameter>) -> Signature {
    Signature::new(name, Prototype::new(params).unwrap()).unwrap()
}

fn set_timer_params() -> Vec<Parameter> {
    vec![
        Parameter::scalar(SimpleType::String),
        int(),
        Parameter::scalar(SimpleType::Bool),
    ]
}

fn set_timer() -> Signature {
    let proto = Prototype::new(set_timer_params())
        .unwrap()
        .with_return(SimpleType::SignedInt);
    Signature::new("SetTimer", proto).unwrap()
}

fn mismatch(expected: &Signature, candidate: &str) -> Mismatch {
    match validate(expected, candidate) {
        Ok(_) => panic!("'{candidate}' unexpectedly satisfied {expected}"),
        Err(err) => err,
    }
}

// ─────────────────────────────────────────────────────────────────────
// Matches
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_exact_match() {
    let found = validate(&set_timer(), "SetTimer@3sib@i").unwrap();
    assert_eq!(found, set_timer());
}

#[test]
fn test_expected_without_return_accepts_any_return() {
    let expected = native("SetTimer", set_timer_params());
    assert!(validate(&expected, "SetTimer@3sib@i").is_ok());
    assert!(validate(&expected, "SetTimer@3sib").is_ok());
}

#[test]
fn test_undescribed_optcall_matches_on_name_and_convention() {
    let described = Signature::optcall(
        "Opt",
        Some(Prototype::new(vec![Parameter::scalar(SimpleType::Float)]).unwrap()),
    )
    .unwrap();
    assert!(validate(&described, "Opt@O").is_ok());

    let opaque = Signature::optcall("Opt", None).unwrap();
    assert!(validate(&opaque, "Opt@O1f").is_ok());
}

// ─────────────────────────────────────────────────────────────────────
// Mismatches
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_type_mismatch() {
    let err = mismatch(&set_timer(), "SetTimer@3sfb@i");
    assert_eq!(
        err,
        Mismatch::Type {
            index: 1,
            expected: SimpleType::SignedInt,
            found: SimpleType::Float,
        }
    );
    assert_eq!(err.index(), Some(1));
    assert_eq!(err.code(), ErrorCode::TYPE_MISMATCH);
    assert_eq!(err.to_string(), "parameter 1: expected type int, found Float");
}

#[test]
fn test_name_mismatch() {
    assert!(matches!(
        mismatch(&set_timer(), "KillTimer@1i"),
        Mismatch::Name { .. }
    ));
}

#[test]
fn test_convention_mismatch() {
    assert_eq!(
        mismatch(&set_timer(), "SetTimer@O"),
        Mismatch::Convention {
            expected: CallingConvention::Standard,
            found: CallingConvention::Optcall,
        }
    );
}

#[test]
fn test_count_mismatch() {
    assert_eq!(
        mismatch(&set_timer(), "SetTimer@2si@i"),
        Mismatch::Count {
            expected: 3,
            found: 2
        }
    );
}

#[test]
fn test_shape_mismatch() {
    let expected = native(
        "X",
        vec![Parameter::input_array(SimpleType::Char, ArrayLen::Unbounded)],
    );
    let err = mismatch(&expected, "X@1a0c");
    assert!(matches!(err, Mismatch::Shape { index: 0, .. }));
    assert_eq!(err.code(), ErrorCode::SHAPE_MISMATCH);
}

#[test]
fn test_array_length_is_part_of_shape() {
    let expected = native(
        "X",
        vec![Parameter::input_array(SimpleType::Char, ArrayLen::Fixed(32))],
    );
    assert!(matches!(
        mismatch(&expected, "X@1A16c"),
        Mismatch::Shape { index: 0, .. }
    ));
}

#[test]
fn test_tag_mismatch() {
    let tags = TagSet::new(["", "Float"]).unwrap();
    let expected = native(
        "X",
        vec![Parameter::scalar(ElementType::tagged(SimpleType::SignedInt, tags))],
    );
    assert!(matches!(
        mismatch(&expected, "X@1it0t4Text"),
        Mismatch::Tag { index: 0, .. }
    ));
    assert!(validate(&expected, "X@1it0t5Float").is_ok());
}

#[test]
fn test_default_mismatch() {
    let expected = native(
        "X",
        vec![
            Parameter::output_array(SimpleType::Char, ArrayLen::Unbounded),
            Parameter::size_of(0, 1),
        ],
    );
    assert_eq!(
        mismatch(&expected, "X@2a0ci"),
        Mismatch::Default {
            index: 1,
            expected: Some(DefaultValue::SizeOf { param: 0, depth: 1 }),
            found: None,
        }
    );
}

#[test]
fn test_variadic_mismatch() {
    let expected = Signature::new(
        "printf",
        Prototype::new(vec![Parameter::input_array(
            SimpleType::Char,
            ArrayLen::Unbounded,
        )])
        .unwrap()
        .with_variadic(VariadicTail::any()),
    )
    .unwrap();
    assert_eq!(
        mismatch(&expected, "printf@1A0c"),
        Mismatch::Variadic {
            expected: Some(VariadicTail::any()),
            found: None,
        }
    );
    assert!(validate(&expected, "printf@1A0cx").is_ok());
}

#[test]
fn test_return_mismatch() {
    assert_eq!(
        mismatch(&set_timer(), "SetTimer@3sib"),
        Mismatch::Return {
            expected: ElementType::new(SimpleType::SignedInt),
            found: None,
        }
    );
    assert_eq!(
        mismatch(&set_timer(), "SetTimer@3sib@f"),
        Mismatch::Return {
            expected: ElementType::new(SimpleType::SignedInt),
            found: Some(ElementType::new(SimpleType::Float)),
        }
    );
}

#[test]
fn test_undecodable_candidate() {
    let err = mismatch(&set_timer(), "SetTimer@3sqb@i");
    let Mismatch::Undecodable(parse) = &err else {
        panic!("expected an undecodable candidate, got {err:?}");
    };
    assert_eq!(parse.kind, ParseErrorKind::UnknownTypeCode('q'));

    let diag = err.to_diagnostic("SetTimer@3sqb@i");
    assert_eq!(diag.code, ErrorCode::UNDECODABLE_CANDIDATE);
    assert_eq!(diag.category, ErrorCategory::Bind);
    assert_eq!(diag.span, Some(parse.span));
}

#[test]
fn test_first_difference_wins() {
    // Parameter 0 differs in layout and parameter 1 in type; layout is reported.
    let expected = native(
        "X",
        vec![Parameter::reference(SimpleType::SignedInt), int()],
    );
    assert!(matches!(
        mismatch(&expected, "X@2if"),
        Mismatch::Shape { index: 0, .. }
    ));
}

#[test]
fn test_validate_determinism_100_iterations() {
    let expected = set_timer();
    let candidates = ["SetTimer@3sib@i", "SetTimer@3sfb@i", "SetTimer@2si", "Bad"];
    let reference: Vec<_> = candidates.iter().map(|c| validate(&expected, c)).collect();
    for _ in 0..100 {
        let again: Vec<_> = candidates.iter().map(|c| validate(&expected, c)).collect();
        assert_eq!(again, reference);
    }
}

// ─────────────────────────────────────────────────────────────────────
// Native table
// ─────────────────────────────────────────────────────────────────────

fn populated_table() -> NativeTable {
    let mut table = NativeTable::new();
    table.register("SetTimer@3sib@i").unwrap();
    table.register("KillTimer@1i").unwrap();
    table.register("print").unwrap();
    table
}

#[test]
fn test_table_register_and_lookup() {
    let table = populated_table();
    assert_eq!(table.len(), 3);
    assert!(!table.is_empty());

    let entry = table.lookup("SetTimer").unwrap();
    assert_eq!(entry.export(), "SetTimer@3sib@i");
    assert_eq!(entry.signature(), Some(&set_timer()));

    assert_eq!(
        table.lookup("print"),
        Some(&NativeEntry::Unmangled {
            export: "print".into()
        })
    );
    assert!(table.lookup("SetTimer@3sib@i").is_none());
}

#[test]
fn test_table_iterates_in_name_order() {
    let table = populated_table();
    let names: Vec<&str> = table.iter().map(|(name, _)| name).collect();
    assert_eq!(names, ["KillTimer", "SetTimer", "print"]);
}

#[test]
fn test_table_register_same_export_twice() {
    let mut table = populated_table();
    assert!(table.register("SetTimer@3sib@i").is_ok());
    assert_eq!(table.len(), 3);
}

#[test]
fn test_table_conflicting_export() {
    let mut table = populated_table();
    assert_eq!(
        table.register("SetTimer@2si"),
        Err(TableError::Conflict {
            base_name: "SetTimer".into(),
            existing: "SetTimer@3sib@i".into(),
            incoming: "SetTimer@2si".into(),
        })
    );
}

#[test]
fn test_table_undecodable_export() {
    let mut table = NativeTable::new();
    let err = table.register("Bad@q").unwrap_err();
    assert!(matches!(err, TableError::Undecodable { ref export, .. } if export == "Bad@q"));
    assert!(table.is_empty());
}

#[test]
fn test_table_resolve() {
    let table = populated_table();
    let entry = table.resolve(&set_timer()).unwrap();
    assert_eq!(entry.export(), "SetTimer@3sib@i");

    let unmangled = native("print", vec![]);
    assert!(table.resolve(&unmangled).is_ok());

    let missing = native("Missing", vec![]);
    assert_eq!(
        table.resolve(&missing),
        Err(TableError::NotFound("Missing".into()))
    );

    let wrong = native("KillTimer", vec![Parameter::scalar(SimpleType::Float)]);
    let err = table.resolve(&wrong).unwrap_err();
    assert!(matches!(
        err,
        TableError::Mismatch {
            source: Mismatch::Type { index: 0, .. },
            ..
        }
    ));
}

#[test]
fn test_table_register_unmangled() {
    let mut table = NativeTable::new();
    let entry = table.register_unmangled("GetTickCount").unwrap();
    assert!(entry.signature().is_none());

    // A mangled export for the same base name conflicts with the plain one.
    assert!(matches!(
        table.register("GetTickCount@0@i"),
        Err(TableError::Conflict { .. })
    ));
    assert_eq!(table.len(), 1);
}
