//! Bind-time check of a discovered export against the caller's expectation.

use amx_sig::{Parameter, Prototype, Signature};
use log::debug;

use crate::decoder::decode;
use crate::error::Mismatch;

/// Decode `candidate` and check it against `expected`.
///
/// Returns the decoded candidate on success. Never coerces anything; the
/// first structural difference found is reported.
pub fn validate(expected: &Signature, candidate: &str) -> Result<Signature, Mismatch> {
    let found = decode(candidate).map_err(Mismatch::Undecodable)?;
    compare(expected, &found)?;
    debug!("'{candidate}' satisfies {expected}");
    Ok(found)
}

/// Structural comparison of two decoded signatures.
///
/// Checks, in order: base name, calling convention, parameter count, then
/// per parameter its layout, type, tags and default, then the variadic tail,
/// then the return type when `expected` asserts one. If either side is an
/// optcall native without a prototype, only name and convention are checked.
pub fn compare(expected: &Signature, found: &Signature) -> Result<(), Mismatch> {
    if expected.base_name() != found.base_name() {
        return Err(Mismatch::Name {
            expected: expected.base_name().to_string(),
            found: found.base_name().to_string(),
        });
    }
    if expected.convention() != found.convention() {
        return Err(Mismatch::Convention {
            expected: expected.convention(),
            found: found.convention(),
        });
    }
    match (expected.prototype(), found.prototype()) {
        (Some(expected), Some(found)) => compare_prototypes(expected, found),
        _ => Ok(()),
    }
}

fn compare_prototypes(expected: &Prototype, found: &Prototype) -> Result<(), Mismatch> {
    if expected.parameters().len() != found.parameters().len() {
        return Err(Mismatch::Count {
            expected: expected.parameters().len(),
            found: found.parameters().len(),
        });
    }
    for (index, (e, f)) in expected
        .parameters()
        .iter()
        .zip(found.parameters())
        .enumerate()
    {
        compare_parameter(index, e, f)?;
    }

    if expected.variadic() != found.variadic() {
        return Err(Mismatch::Variadic {
            expected: expected.variadic().cloned(),
            found: found.variadic().cloned(),
        });
    }

    if let Some(ret) = expected.return_type() {
        if found.return_type() != Some(ret) {
            return Err(Mismatch::Return {
                expected: ret.clone(),
                found: found.return_type().cloned(),
            });
        }
    }
    Ok(())
}

fn compare_parameter(index: usize, expected: &Parameter, found: &Parameter) -> Result<(), Mismatch> {
    if !expected.shape.same_layout(&found.shape) {
        return Err(Mismatch::Shape {
            index,
            expected: expected.clone(),
            found: found.clone(),
        });
    }
    let (e, f) = (expected.shape.element(), found.shape.element());
    if e.ty != f.ty {
        return Err(Mismatch::Type {
            index,
            expected: e.ty,
            found: f.ty,
        });
    }
    // Tag sets are canonical (sorted, no duplicates), so this is set equality.
    if e.tags != f.tags {
        return Err(Mismatch::Tag {
            index,
            expected: e.tags.clone(),
            found: f.tags.clone(),
        });
    }
    if expected.default != found.default {
        return Err(Mismatch::Default {
            index,
            expected: expected.default,
            found: found.default,
        });
    }
    Ok(())
}
