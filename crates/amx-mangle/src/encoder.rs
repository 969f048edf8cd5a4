//! Signature → mangled name.

use amx_sig::{
    ArrayLen, CallingConvention, DefaultValue, ElementType, ParamShape, Parameter, Prototype,
    Signature, TagSet,
};
use log::trace;

/// Render `signature` as its export name.
///
/// Total over every value a [`Signature`] constructor accepts; the output
/// only uses `[A-Za-z0-9_@]`.
pub fn encode(signature: &Signature) -> String {
    let mut out = String::with_capacity(signature.base_name().len() + 16);
    out.push_str(signature.base_name());
    out.push('@');
    if signature.convention() == CallingConvention::Optcall {
        out.push('O');
    }
    if let Some(prototype) = signature.prototype() {
        write_prototype(&mut out, prototype);
    }
    trace!("encoded {} as {out}", signature.base_name());
    out
}

/// Render only the prototype part (everything after `@`, or after `@O`).
pub fn encode_prototype(prototype: &Prototype) -> String {
    let mut out = String::new();
    write_prototype(&mut out, prototype);
    out
}

fn write_prototype(out: &mut String, prototype: &Prototype) {
    push_decimal(out, prototype.parameters().len());
    for param in prototype.parameters() {
        write_parameter(out, param);
    }
    if let Some(variadic) = prototype.variadic() {
        out.push('x');
        write_tags(out, &variadic.tags);
    }
    if let Some(ret) = prototype.return_type() {
        out.push('@');
        write_element(out, ret);
    }
}

fn write_parameter(out: &mut String, param: &Parameter) {
    // A derived default stands in for the type code; the model guarantees
    // such a parameter is a plain int.
    if let Some(default) = param.default {
        match default {
            DefaultValue::SizeOf { param, depth } => write_sizeof(out, param, depth),
            DefaultValue::TagOf { param } => {
                out.push('T');
                push_decimal(out, param);
            }
        }
        return;
    }
    match &param.shape {
        ParamShape::Scalar(element) => write_element(out, element),
        ParamShape::InputArray { element, len } => {
            out.push('A');
            write_len(out, *len);
            write_element(out, element);
        }
        ParamShape::OutputArray { element, len } => {
            out.push('a');
            write_len(out, *len);
            write_element(out, element);
        }
        ParamShape::Reference(element) => {
            out.push_str("a1");
            write_element(out, element);
        }
    }
}

fn write_len(out: &mut String, len: ArrayLen) {
    match len {
        ArrayLen::Unbounded => out.push('0'),
        ArrayLen::Fixed(n) => push_decimal(out, n),
        ArrayLen::Derived { param, depth } => write_sizeof(out, param, depth),
    }
}

/// One `L` per dimension, then the parameter index.
fn write_sizeof(out: &mut String, param: usize, depth: u32) {
    for _ in 0..depth {
        out.push('L');
    }
    push_decimal(out, param);
}

fn write_element(out: &mut String, element: &ElementType) {
    out.push(element.ty.code());
    write_tags(out, &element.tags);
}

fn write_tags(out: &mut String, tags: &TagSet) {
    for tag in tags.iter() {
        out.push('t');
        push_decimal(out, tag.len());
        out.push_str(tag);
    }
}

fn push_decimal(out: &mut String, n: impl ToString) {
    out.push_str(&n.to_string());
}
