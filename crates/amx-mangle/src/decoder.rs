//! Mangled name → signature.
//!
//! Base names may themselves contain `@`, so the split point is found by
//! trying every `@` from the left and keeping the first remainder that
//! parses completely:
//!
//! ```ebnf
//! Signature  = "O" [ Prototype ] | Prototype ;
//! Prototype  = Decimal { Parameter } [ "x" Tags ] [ "@" Element ] ;
//! Parameter  = "A" Length Element | "a" Length Element
//!            | "L" { "L" } Decimal | "T" Decimal | Element ;
//! Length     = Decimal | "L" { "L" } Decimal ;
//! Element    = TypeCode Tags ;
//! Tags       = { "t" Decimal Name } ;
//! TypeCode   = "i" | "u" | "b" | "f" | "c" | "h" | "s" | "_" ;
//! ```

use amx_sig::{
    ArrayLen, ElementType, ParamShape, Parameter, Prototype, Signature, SimpleType, Span, TagSet,
    VariadicTail,
};
use log::debug;

use crate::error::{ParseError, ParseErrorKind};

/// Decode a mangled export name.
///
/// When no split parses, the error reported is the one that got furthest
/// into the name (ties go to the earlier split).
pub fn decode(mangled: &str) -> Result<Signature, ParseError> {
    let mut furthest: Option<ParseError> = None;
    let first_bad = mangled.bytes().position(|b| !Signature::is_base_name_byte(b));
    for (separator, _) in mangled.match_indices('@') {
        // Every later base name contains the same bad byte.
        if first_bad.is_some_and(|at| at < separator) {
            let err = ParseError::new(
                ParseErrorKind::InvalidBaseName(mangled[..separator].to_string()),
                Span::new(0, separator),
            );
            debug!("'{mangled}' has no valid base name past offset {separator}");
            if furthest.is_none() {
                furthest = Some(err);
            }
            break;
        }
        match Decoder::new(mangled, separator).decode() {
            Ok(signature) => {
                debug!("decoded '{mangled}' with base name '{}'", signature.base_name());
                return Ok(signature);
            }
            Err(err) => {
                debug!("split of '{mangled}' at offset {separator} rejected: {err}");
                if furthest
                    .as_ref()
                    .map_or(true, |best| err.span.start > best.span.start)
                {
                    furthest = Some(err);
                }
            }
        }
    }
    Err(furthest.unwrap_or_else(|| {
        ParseError::new(ParseErrorKind::MissingSeparator, Span::point(mangled.len()))
    }))
}

/// One complete-or-fail parse attempt for a fixed split point.
struct Decoder<'a> {
    /// The full mangled name.
    name: &'a str,
    /// The full mangled name as bytes.
    bytes: &'a [u8],
    /// Offset of the `@` ending the base name.
    separator: usize,
    /// Current byte offset into `bytes`.
    pos: usize,
}

impl<'a> Decoder<'a> {
    fn new(name: &'a str, separator: usize) -> Self {
        Self {
            name,
            bytes: name.as_bytes(),
            separator,
            pos: separator + 1,
        }
    }

    fn decode(mut self) -> Result<Signature, ParseError> {
        let name = self.name;
        let base_name = name.get(..self.separator).unwrap_or_default();
        if base_name.is_empty() {
            return Err(ParseError::new(
                ParseErrorKind::EmptyBaseName,
                Span::point(0),
            ));
        }

        if self.eat(b'O') {
            if self.at_end() {
                return Signature::optcall(base_name, None).map_err(|e| self.reject(e));
            }
            if !self.peek().is_some_and(|b| b.is_ascii_digit()) {
                return Err(ParseError::new(
                    ParseErrorKind::IncompleteOptcall,
                    Span::new(self.pos - 1, self.pos),
                ));
            }
            let prototype = self.parse_prototype()?;
            self.expect_end()?;
            return Signature::optcall(base_name, Some(prototype)).map_err(|e| self.reject(e));
        }

        let prototype = self.parse_prototype()?;
        self.expect_end()?;
        Signature::new(base_name, prototype).map_err(|e| self.reject(e))
    }

    // ── Cursor ────────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.name.get(self.pos..)?.chars().next()
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        if self.at_end() {
            return Ok(());
        }
        let rest = self.name.get(self.pos..).unwrap_or_default();
        Err(ParseError::new(
            ParseErrorKind::TrailingCharacters(rest.to_string()),
            Span::new(self.pos, self.bytes.len()),
        ))
    }

    fn reject(&self, err: amx_sig::SignatureError) -> ParseError {
        ParseError::new(err, Span::new(self.separator + 1, self.bytes.len()))
    }

    // ── Grammar ───────────────────────────────────────────────────────────────

    fn parse_prototype(&mut self) -> Result<Prototype, ParseError> {
        let count_start = self.pos;
        let declared = self.parse_decimal()?;

        // A crafted count must not drive the allocation.
        let mut parameters = Vec::with_capacity(declared.min(32));
        while let Some(c) = self.peek() {
            if c == b'x' || c == b'@' {
                break;
            }
            // Past the declared count, only keep going while the input still
            // looks like parameters, so the count error names the real total.
            if parameters.len() >= declared && !is_parameter_start(c) {
                break;
            }
            let param = self.parse_parameter(parameters.len(), declared)?;
            parameters.push(param);
        }
        if parameters.len() != declared {
            return Err(ParseError::new(
                ParseErrorKind::CountMismatch {
                    declared,
                    found: parameters.len(),
                },
                Span::new(count_start, self.pos),
            ));
        }

        let variadic = if self.eat(b'x') {
            let start = self.pos;
            let names = self.parse_tag_names()?;
            Some(
                VariadicTail::from_tags(names)
                    .map_err(|e| ParseError::new(e, Span::new(start, self.pos)))?,
            )
        } else {
            None
        };
        let return_type = if self.eat(b'@') {
            Some(self.parse_element()?)
        } else {
            None
        };

        Prototype::from_parts(parameters, variadic, return_type)
            .map_err(|e| ParseError::new(e, Span::new(count_start, self.pos)))
    }

    fn parse_parameter(&mut self, index: usize, declared: usize) -> Result<Parameter, ParseError> {
        match self.peek() {
            Some(b'A') => {
                self.pos += 1;
                let len = self.parse_length(index, declared)?;
                let element = self.parse_element()?;
                Ok(Parameter::new(ParamShape::InputArray { element, len }))
            }
            Some(b'a') => {
                self.pos += 1;
                let len = self.parse_length(index, declared)?;
                let element = self.parse_element()?;
                if len == ArrayLen::Fixed(1) {
                    Ok(Parameter::reference(element))
                } else {
                    Ok(Parameter::new(ParamShape::OutputArray { element, len }))
                }
            }
            Some(b'L') => {
                let (target, depth) = self.parse_sizeof(index, declared)?;
                Ok(Parameter::size_of(target, depth))
            }
            Some(b'T') => {
                let start = self.pos;
                self.pos += 1;
                let target = self.parse_decimal()?;
                self.check_reference(index, target, declared, start)?;
                Ok(Parameter::tag_of(target))
            }
            _ => Ok(Parameter::scalar(self.parse_element()?)),
        }
    }

    /// `0` is unbounded, other decimals are literal bounds, `L` runs are sizeof.
    fn parse_length(&mut self, index: usize, declared: usize) -> Result<ArrayLen, ParseError> {
        if self.peek() == Some(b'L') {
            let (param, depth) = self.parse_sizeof(index, declared)?;
            return Ok(ArrayLen::Derived { param, depth });
        }
        let start = self.pos;
        match self.parse_decimal()? {
            0 => Ok(ArrayLen::Unbounded),
            n => u32::try_from(n).map(ArrayLen::Fixed).map_err(|_| {
                ParseError::new(
                    ParseErrorKind::MalformedDecimal("value out of range"),
                    Span::new(start, self.pos),
                )
            }),
        }
    }

    fn parse_sizeof(&mut self, index: usize, declared: usize) -> Result<(usize, u32), ParseError> {
        let start = self.pos;
        let mut depth: u32 = 0;
        while self.eat(b'L') {
            depth = depth.saturating_add(1);
        }
        let target = self.parse_decimal()?;
        self.check_reference(index, target, declared, start)?;
        Ok((target, depth))
    }

    fn check_reference(
        &self,
        param: usize,
        target: usize,
        declared: usize,
        start: usize,
    ) -> Result<(), ParseError> {
        // Past the declared count; the count check reports it.
        if param >= declared {
            return Ok(());
        }
        let span = Span::new(start, self.pos);
        if target >= declared {
            Err(ParseError::new(
                ParseErrorKind::IndexOutOfRange {
                    param,
                    target,
                    count: declared,
                },
                span,
            ))
        } else if target >= param {
            Err(ParseError::new(
                ParseErrorKind::ForwardReference { param, target },
                span,
            ))
        } else {
            Ok(())
        }
    }

    fn parse_element(&mut self) -> Result<ElementType, ParseError> {
        let start = self.pos;
        let Some(c) = self.peek_char() else {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedEnd,
                Span::point(start),
            ));
        };
        let Some(ty) = SimpleType::from_code(c) else {
            return Err(ParseError::new(
                ParseErrorKind::UnknownTypeCode(c),
                Span::new(start, start + c.len_utf8()),
            ));
        };
        self.pos += 1;
        let tags = self.parse_tags()?;
        Ok(ElementType::tagged(ty, tags))
    }

    fn parse_tags(&mut self) -> Result<TagSet, ParseError> {
        let start = self.pos;
        let names = self.parse_tag_names()?;
        if names.is_empty() {
            return Ok(TagSet::none());
        }
        TagSet::new(names).map_err(|e| ParseError::new(e, Span::new(start, self.pos)))
    }

    /// Raw `t<len><name>` run; set rules are left to the caller.
    fn parse_tag_names(&mut self) -> Result<Vec<String>, ParseError> {
        let mut names = Vec::new();
        while self.eat(b't') {
            let len = self.parse_decimal()?;
            let name_start = self.pos;
            let Some(end) = name_start
                .checked_add(len)
                .filter(|&end| end <= self.bytes.len())
            else {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedEnd,
                    Span::new(name_start, self.bytes.len()),
                ));
            };
            let bytes = self.bytes;
            let raw = &bytes[name_start..end];
            let Some(name) = std::str::from_utf8(raw)
                .ok()
                .filter(|name| TagSet::is_valid_tag_name(name))
            else {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidTagName(String::from_utf8_lossy(raw).into_owned()),
                    Span::new(name_start, end),
                ));
            };
            names.push(name.to_string());
            self.pos = end;
        }
        Ok(names)
    }

    /// Decimal with no leading zeros, fitting in `usize`.
    fn parse_decimal(&mut self) -> Result<usize, ParseError> {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits = self.name.get(start..self.pos).unwrap_or_default();
        let span = Span::new(start, self.pos);
        if digits.is_empty() {
            let end = (start + 1).min(self.bytes.len());
            return Err(ParseError::new(
                ParseErrorKind::MalformedDecimal("expected a digit"),
                Span::new(start, end),
            ));
        }
        if digits.len() > 1 && digits.starts_with('0') {
            return Err(ParseError::new(
                ParseErrorKind::MalformedDecimal("leading zero"),
                span,
            ));
        }
        digits.parse().map_err(|_| {
            ParseError::new(ParseErrorKind::MalformedDecimal("value out of range"), span)
        })
    }
}

fn is_parameter_start(c: u8) -> bool {
    matches!(c, b'A' | b'a' | b'L' | b'T') || SimpleType::from_code(c as char).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_start_bytes() {
        for c in b"AaLTiubfchs_" {
            assert!(is_parameter_start(*c), "{}", *c as char);
        }
        for c in b"x@Ot0O9" {
            assert!(!is_parameter_start(*c), "{}", *c as char);
        }
    }

    #[test]
    fn test_decimal_rules() {
        let mut d = Decoder::new("n@120", 1);
        assert_eq!(d.parse_decimal(), Ok(120));

        let mut d = Decoder::new("n@007", 1);
        assert_eq!(
            d.parse_decimal().unwrap_err().kind,
            ParseErrorKind::MalformedDecimal("leading zero")
        );

        let mut d = Decoder::new("n@", 1);
        assert_eq!(
            d.parse_decimal().unwrap_err().kind,
            ParseErrorKind::MalformedDecimal("expected a digit")
        );

        let mut d = Decoder::new("n@99999999999999999999999999", 1);
        assert_eq!(
            d.parse_decimal().unwrap_err().kind,
            ParseErrorKind::MalformedDecimal("value out of range")
        );
    }

    #[test]
    fn test_tag_name_past_end() {
        let mut d = Decoder::new("n@t9ab", 1);
        let err = d.parse_tags().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEnd);
        assert_eq!(err.span, Span::new(4, 6));
    }
}
