//! Signature value types.
//!
//! A [`Signature`] describes one native: its base name, calling convention
//! and (optionally, for optcall) a [`Prototype`] listing parameters, the
//! variadic tail and the return type. Every type here is immutable once
//! built; the validating constructors are the only way in, and `serde`
//! deserialisation goes through them too.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Result, SignatureError};

/// Tag implied by the `f` type code.
pub const FLOAT_TAG: &str = "Float";
/// Tag implied by the `b` type code.
pub const BOOL_TAG: &str = "Bool";

// ══════════════════════════════════════════════════════════════════════════════
// SimpleType
// ══════════════════════════════════════════════════════════════════════════════

/// Underlying cell type of a parameter, array element or return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimpleType {
    SignedInt,
    UnsignedInt,
    Bool,
    Float,
    Char,
    Handle,
    String,
    /// Any tag, any representation.
    Variant,
}

impl SimpleType {
    /// Every type, in code-table order.
    pub const ALL: [SimpleType; 8] = [
        SimpleType::SignedInt,
        SimpleType::UnsignedInt,
        SimpleType::Bool,
        SimpleType::Float,
        SimpleType::Char,
        SimpleType::Handle,
        SimpleType::String,
        SimpleType::Variant,
    ];

    /// The single-letter code used in mangled names.
    pub fn code(self) -> char {
        match self {
            SimpleType::SignedInt => 'i',
            SimpleType::UnsignedInt => 'u',
            SimpleType::Bool => 'b',
            SimpleType::Float => 'f',
            SimpleType::Char => 'c',
            SimpleType::Handle => 'h',
            SimpleType::String => 's',
            SimpleType::Variant => '_',
        }
    }

    /// Inverse of [`SimpleType::code`].
    pub fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'i' => SimpleType::SignedInt,
            'u' => SimpleType::UnsignedInt,
            'b' => SimpleType::Bool,
            'f' => SimpleType::Float,
            'c' => SimpleType::Char,
            'h' => SimpleType::Handle,
            's' => SimpleType::String,
            '_' => SimpleType::Variant,
            _ => return None,
        })
    }

    /// Name used in pretty-printed prototypes.
    pub fn pawn_name(self) -> &'static str {
        match self {
            SimpleType::SignedInt => "int",
            SimpleType::UnsignedInt => "uint",
            SimpleType::Bool => "bool",
            SimpleType::Float => "Float",
            SimpleType::Char => "char",
            SimpleType::Handle => "handle",
            SimpleType::String => "string",
            SimpleType::Variant => "any",
        }
    }
}

impl fmt::Display for SimpleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pawn_name())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// TagSet
// ══════════════════════════════════════════════════════════════════════════════

/// Ordered set of tag names constraining a cell.
///
/// The empty set is the implicit form and is never written out. Names are
/// kept in strictly ascending byte order. The empty name means "explicitly
/// untagged" (`_:` in Pawn) and is only meaningful next to other tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet(Vec<String>);

impl TagSet {
    /// The implicit (tagless) set.
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// Build a set from names that are already in ascending order.
    pub fn new<I, S>(tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        if let Some(bad) = tags.iter().find(|t| !Self::is_valid_tag_name(t)) {
            return Err(SignatureError::InvalidTagName(bad.clone()));
        }
        for pair in tags.windows(2) {
            if pair[0] >= pair[1] {
                return Err(SignatureError::TagsNotAscending {
                    previous: pair[0].clone(),
                    next: pair[1].clone(),
                });
            }
        }
        if let [only] = tags.as_slice() {
            if only.is_empty() || only == FLOAT_TAG || only == BOOL_TAG {
                return Err(SignatureError::ImplicitTag(only.clone()));
            }
        }
        Ok(Self(tags))
    }

    /// Build a set from names in any order; duplicates collapse.
    pub fn sorted<I, S>(tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        tags.sort();
        tags.dedup();
        Self::new(tags)
    }

    /// Tag names use `[A-Za-z0-9_]`; the empty name is allowed.
    ///
    /// `@` is excluded even though it is legal in the outer alphabet: a tag
    /// name containing it could hide a base-name/signature boundary.
    pub fn is_valid_tag_name(name: &str) -> bool {
        name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.binary_search_by(|t| t.as_str().cmp(tag)).is_ok()
    }
}

impl TryFrom<Vec<String>> for TagSet {
    type Error = SignatureError;

    fn try_from(tags: Vec<String>) -> Result<Self> {
        Self::new(tags)
    }
}

impl From<TagSet> for Vec<String> {
    fn from(set: TagSet) -> Self {
        set.0
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(if tag.is_empty() { "_" } else { tag })?;
        }
        f.write_str("}")
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Element types and shapes
// ══════════════════════════════════════════════════════════════════════════════

/// A simple type, optionally qualified by an explicit tag set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementType {
    pub ty: SimpleType,
    #[serde(default, skip_serializing_if = "TagSet::is_empty")]
    pub tags: TagSet,
}

impl ElementType {
    pub fn new(ty: SimpleType) -> Self {
        Self {
            ty,
            tags: TagSet::none(),
        }
    }

    pub fn tagged(ty: SimpleType, tags: TagSet) -> Self {
        Self { ty, tags }
    }

    /// `true` for a plain `int` with no tags.
    pub fn is_untagged_int(&self) -> bool {
        self.ty == SimpleType::SignedInt && self.tags.is_empty()
    }
}

impl From<SimpleType> for ElementType {
    fn from(ty: SimpleType) -> Self {
        Self::new(ty)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tags.as_slice() {
            [] => write!(f, "{}", self.ty),
            [only] => write!(f, "{}:{}", if only.is_empty() { "_" } else { only }, self.ty),
            _ => write!(f, "{}:{}", self.tags, self.ty),
        }
    }
}

/// Length of an array parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayLen {
    /// No declared bound (`name[]`).
    Unbounded,
    /// A literal bound, at least 1.
    Fixed(u32),
    /// `sizeof` another parameter; `depth` 1 is the outer dimension.
    Derived { param: usize, depth: u32 },
}

impl fmt::Display for ArrayLen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayLen::Unbounded => Ok(()),
            ArrayLen::Fixed(n) => write!(f, "{n}"),
            ArrayLen::Derived { param, depth } => write_sizeof(f, *param, *depth),
        }
    }
}

fn write_sizeof(f: &mut fmt::Formatter<'_>, param: usize, depth: u32) -> fmt::Result {
    write!(f, "sizeof(arg{param}")?;
    for _ in 1..depth {
        f.write_str("[]")?;
    }
    f.write_str(")")
}

/// How a parameter is passed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamShape {
    /// Passed by value.
    Scalar(ElementType),
    /// Caller-owned array the callee must not modify.
    InputArray { element: ElementType, len: ArrayLen },
    /// Array the callee may write to.
    OutputArray { element: ElementType, len: ArrayLen },
    /// Pass by address; a mutable array of length 1.
    Reference(ElementType),
}

impl ParamShape {
    pub fn element(&self) -> &ElementType {
        match self {
            ParamShape::Scalar(element)
            | ParamShape::Reference(element)
            | ParamShape::InputArray { element, .. }
            | ParamShape::OutputArray { element, .. } => element,
        }
    }

    /// Declared length for the two array shapes.
    pub fn array_len(&self) -> Option<ArrayLen> {
        match self {
            ParamShape::InputArray { len, .. } | ParamShape::OutputArray { len, .. } => Some(*len),
            ParamShape::Scalar(_) | ParamShape::Reference(_) => None,
        }
    }

    /// `true` when both shapes are the same kind with the same length,
    /// regardless of element type.
    pub fn same_layout(&self, other: &ParamShape) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
            && self.array_len() == other.array_len()
    }
}

/// A default value computed from another parameter.
///
/// Literal defaults never appear in a mangled name, so they are not modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    /// `sizeof(argN)`, `sizeof(argN[])` for depth 2, and so on.
    SizeOf { param: usize, depth: u32 },
    /// `tagof(argN)`.
    TagOf { param: usize },
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::SizeOf { param, depth } => write_sizeof(f, *param, *depth),
            DefaultValue::TagOf { param } => write!(f, "tagof(arg{param})"),
        }
    }
}

/// One formal parameter. Its index is its position in the prototype.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub shape: ParamShape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
}

impl Parameter {
    pub fn new(shape: ParamShape) -> Self {
        Self {
            shape,
            default: None,
        }
    }

    pub fn scalar(element: impl Into<ElementType>) -> Self {
        Self::new(ParamShape::Scalar(element.into()))
    }

    pub fn input_array(element: impl Into<ElementType>, len: ArrayLen) -> Self {
        Self::new(ParamShape::InputArray {
            element: element.into(),
            len,
        })
    }

    pub fn output_array(element: impl Into<ElementType>, len: ArrayLen) -> Self {
        Self::new(ParamShape::OutputArray {
            element: element.into(),
            len,
        })
    }

    pub fn reference(element: impl Into<ElementType>) -> Self {
        Self::new(ParamShape::Reference(element.into()))
    }

    /// An untagged `int` defaulting to `sizeof(argN)` at `depth`.
    pub fn size_of(param: usize, depth: u32) -> Self {
        Self::scalar(SimpleType::SignedInt).with_default(DefaultValue::SizeOf { param, depth })
    }

    /// An untagged `int` defaulting to `tagof(argN)`.
    pub fn tag_of(param: usize) -> Self {
        Self::scalar(SimpleType::SignedInt).with_default(DefaultValue::TagOf { param })
    }

    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.shape {
            ParamShape::Scalar(element) => write!(f, "{element}")?,
            ParamShape::InputArray { element, len } => write!(f, "const {element}[{len}]")?,
            ParamShape::OutputArray { element, len } => write!(f, "{element}[{len}]")?,
            ParamShape::Reference(element) => write!(f, "&{element}")?,
        }
        if let Some(default) = &self.default {
            write!(f, " = {default}")?;
        }
        Ok(())
    }
}

/// Tag constraint on trailing variadic arguments; the empty set accepts any tag.
///
/// Unlike an element, the tail has no type code implying a tag, so the
/// singletons `{Float}`, `{Bool}` and `{_}` are ordinary constraints here
/// (`Float:...`, `Bool:...`, `_:...`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "VariadicTailRepr")]
pub struct VariadicTail {
    #[serde(skip_serializing_if = "TagSet::is_empty")]
    pub tags: TagSet,
}

#[derive(Deserialize)]
struct VariadicTailRepr {
    #[serde(default)]
    tags: Vec<String>,
}

impl TryFrom<VariadicTailRepr> for VariadicTail {
    type Error = SignatureError;

    fn try_from(repr: VariadicTailRepr) -> Result<Self> {
        Self::from_tags(repr.tags)
    }
}

impl VariadicTail {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn tagged(tags: TagSet) -> Self {
        Self { tags }
    }

    /// Build a tail from ascending tag names, accepting any single tag.
    pub fn from_tags<I, S>(tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        match <[String; 1]>::try_from(tags) {
            Ok([only]) => {
                if !TagSet::is_valid_tag_name(&only) {
                    return Err(SignatureError::InvalidTagName(only));
                }
                Ok(Self {
                    tags: TagSet(vec![only]),
                })
            }
            Err(tags) => Ok(Self::tagged(TagSet::new(tags)?)),
        }
    }
}

impl fmt::Display for VariadicTail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tags.as_slice() {
            [] => f.write_str("..."),
            [only] => write!(f, "{}:...", if only.is_empty() { "_" } else { only }),
            _ => write!(f, "{}:...", self.tags),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Prototype
// ══════════════════════════════════════════════════════════════════════════════

/// Parameter list, variadic tail and return type of a native.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PrototypeRepr")]
pub struct Prototype {
    parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    variadic: Option<VariadicTail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_type: Option<ElementType>,
}

#[derive(Deserialize)]
struct PrototypeRepr {
    #[serde(default)]
    parameters: Vec<Parameter>,
    #[serde(default)]
    variadic: Option<VariadicTail>,
    #[serde(default)]
    return_type: Option<ElementType>,
}

impl TryFrom<PrototypeRepr> for Prototype {
    type Error = SignatureError;

    fn try_from(repr: PrototypeRepr) -> Result<Self> {
        Self::from_parts(repr.parameters, repr.variadic, repr.return_type)
    }
}

impl Prototype {
    /// Validate `parameters` and build a prototype with no variadic tail and
    /// no return type.
    pub fn new(parameters: Vec<Parameter>) -> Result<Self> {
        Self::from_parts(parameters, None, None)
    }

    pub fn from_parts(
        parameters: Vec<Parameter>,
        variadic: Option<VariadicTail>,
        return_type: Option<ElementType>,
    ) -> Result<Self> {
        check_parameters(&parameters)?;
        Ok(Self {
            parameters,
            variadic,
            return_type,
        })
    }

    pub fn with_variadic(mut self, variadic: VariadicTail) -> Self {
        self.variadic = Some(variadic);
        self
    }

    pub fn with_return(mut self, return_type: impl Into<ElementType>) -> Self {
        self.return_type = Some(return_type.into());
        self
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn variadic(&self) -> Option<&VariadicTail> {
        self.variadic.as_ref()
    }

    pub fn return_type(&self) -> Option<&ElementType> {
        self.return_type.as_ref()
    }
}

fn check_parameters(parameters: &[Parameter]) -> Result<()> {
    let count = parameters.len();
    for (index, param) in parameters.iter().enumerate() {
        match &param.shape {
            ParamShape::InputArray { len, .. } | ParamShape::OutputArray { len, .. } => match *len {
                ArrayLen::Fixed(0) => return Err(SignatureError::ZeroLength { param: index }),
                ArrayLen::Derived { depth: 0, .. } => {
                    return Err(SignatureError::ZeroDepth { param: index })
                }
                ArrayLen::Derived { param: target, .. } => check_reference(index, target, count)?,
                ArrayLen::Unbounded | ArrayLen::Fixed(_) => {}
            },
            ParamShape::Scalar(_) | ParamShape::Reference(_) => {}
        }
        if let ParamShape::OutputArray {
            len: ArrayLen::Fixed(1),
            ..
        } = param.shape
        {
            return Err(SignatureError::AmbiguousShape { param: index });
        }

        let Some(default) = param.default else {
            continue;
        };
        match &param.shape {
            ParamShape::Scalar(element) if element.is_untagged_int() => {}
            _ => return Err(SignatureError::InvalidDefault { param: index }),
        }
        match default {
            DefaultValue::SizeOf { depth: 0, .. } => {
                return Err(SignatureError::ZeroDepth { param: index })
            }
            DefaultValue::SizeOf { param: target, .. } | DefaultValue::TagOf { param: target } => {
                check_reference(index, target, count)?
            }
        }
    }
    Ok(())
}

/// Derived references must name an existing parameter declared earlier.
fn check_reference(param: usize, target: usize, count: usize) -> Result<()> {
    if target >= count {
        Err(SignatureError::IndexOutOfRange {
            param,
            target,
            count,
        })
    } else if target >= param {
        Err(SignatureError::ForwardReference { param, target })
    } else {
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Signature
// ══════════════════════════════════════════════════════════════════════════════

/// How the runtime passes arguments to the native.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallingConvention {
    /// amx-call and pawn-call; indistinguishable at the signature level.
    #[default]
    Standard,
    /// A leading hidden parameter supplies defaults for omitted arguments.
    Optcall,
}

impl fmt::Display for CallingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Optcall => write!(f, "optcall"),
        }
    }
}

/// A complete native signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SignatureRepr")]
pub struct Signature {
    base_name: String,
    convention: CallingConvention,
    #[serde(skip_serializing_if = "Option::is_none")]
    prototype: Option<Prototype>,
}

#[derive(Deserialize)]
struct SignatureRepr {
    base_name: String,
    #[serde(default)]
    convention: CallingConvention,
    #[serde(default)]
    prototype: Option<Prototype>,
}

impl TryFrom<SignatureRepr> for Signature {
    type Error = SignatureError;

    fn try_from(repr: SignatureRepr) -> Result<Self> {
        match (repr.convention, repr.prototype) {
            (CallingConvention::Standard, Some(prototype)) => Self::new(repr.base_name, prototype),
            (CallingConvention::Standard, None) => Err(SignatureError::MissingPrototype),
            (CallingConvention::Optcall, prototype) => Self::optcall(repr.base_name, prototype),
        }
    }
}

impl Signature {
    /// A standard-convention signature.
    pub fn new(base_name: impl Into<String>, prototype: Prototype) -> Result<Self> {
        Self::build(base_name.into(), CallingConvention::Standard, Some(prototype))
    }

    /// An optcall signature. `prototype` excludes the hidden leading
    /// parameter; `None` means the native does not describe its arguments.
    pub fn optcall(base_name: impl Into<String>, prototype: Option<Prototype>) -> Result<Self> {
        Self::build(base_name.into(), CallingConvention::Optcall, prototype)
    }

    fn build(
        base_name: String,
        convention: CallingConvention,
        prototype: Option<Prototype>,
    ) -> Result<Self> {
        if !Self::is_valid_base_name(&base_name) {
            return Err(SignatureError::InvalidBaseName(base_name));
        }
        Ok(Self {
            base_name,
            convention,
            prototype,
        })
    }

    /// Base names are non-empty and drawn from `[A-Za-z0-9_@]`.
    pub fn is_valid_base_name(name: &str) -> bool {
        !name.is_empty() && name.bytes().all(Self::is_base_name_byte)
    }

    /// `[A-Za-z0-9_@]`, the alphabet of a whole mangled name.
    pub fn is_base_name_byte(b: u8) -> bool {
        b.is_ascii_alphanumeric() || b == b'_' || b == b'@'
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn convention(&self) -> CallingConvention {
        self.convention
    }

    pub fn prototype(&self) -> Option<&Prototype> {
        self.prototype.as_ref()
    }

    /// Fixed parameters; empty for an undescribed optcall native.
    pub fn parameters(&self) -> &[Parameter] {
        match &self.prototype {
            Some(prototype) => prototype.parameters(),
            None => &[],
        }
    }

    pub fn variadic(&self) -> Option<&VariadicTail> {
        self.prototype.as_ref()?.variadic()
    }

    pub fn return_type(&self) -> Option<&ElementType> {
        self.prototype.as_ref()?.return_type()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "native {}(", self.base_name)?;
        match &self.prototype {
            None => f.write_str("?)")?,
            Some(prototype) => {
                let mut first = true;
                for param in prototype.parameters() {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "{param}")?;
                }
                if let Some(variadic) = prototype.variadic() {
                    if !first {
                        f.write_str(", ")?;
                    }
                    write!(f, "{variadic}")?;
                }
                f.write_str(")")?;
                if let Some(ret) = prototype.return_type() {
                    write!(f, " -> {ret}")?;
                }
            }
        }
        if self.convention == CallingConvention::Optcall {
            f.write_str(" <optcall>")?;
        }
        Ok(())
    }
}
