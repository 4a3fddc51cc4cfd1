//! Type model for contract interface values.
//!
//! A [`Type`] is an owned tree: arrays box their element type and tuples own
//! their field types. The canonical string, the static/dynamic classification
//! and the head size are computed once, bottom-up, when the node is built.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::arguments::ArgumentMarshaling;
use crate::error::{AbiError, Result};

/// Size of one encoding word in bytes.
pub const WORD: usize = 32;

/// Largest length accepted for a fixed-size array type.
pub const MAX_FIXED_ARRAY_LEN: usize = 65_536;

/// Named member of a tuple type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TupleField {
    /// Component name as declared (may be empty).
    pub name: String,
    /// Component type.
    pub ty: Type,
}

impl TupleField {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Shape of a type node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeKind {
    /// Unsigned integer of the given bit width.
    Uint(usize),
    /// Two's complement signed integer of the given bit width.
    Int(usize),
    Bool,
    /// 20-byte account address.
    Address,
    /// `bytes1` .. `bytes32`.
    FixedBytes(usize),
    /// Dynamic byte string.
    Bytes,
    /// Dynamic UTF-8 string.
    String,
    /// `T[N]`.
    FixedArray(Box<Type>, usize),
    /// `T[]`.
    Array(Box<Type>),
    /// `(T1,T2,...)`.
    Tuple(Vec<TupleField>),
    /// External function pointer: address followed by a 4-byte selector.
    Function,
}

/// One value type with its derived encoding properties.
///
/// Two types with the same canonical string compare equal, regardless of
/// tuple component names.
#[derive(Clone, Debug)]
pub struct Type {
    kind: TypeKind,
    canonical: String,
    dynamic: bool,
    head_size: usize,
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl Type {
    /// Validates `kind` and derives the canonical string, classification and
    /// head size.
    ///
    /// # Errors
    /// Returns [`AbiError::Type`] for widths or lengths outside the protocol
    /// bounds and for tuples without fields.
    pub fn new(kind: TypeKind) -> Result<Self> {
        let (canonical, dynamic, head_size) = match &kind {
            TypeKind::Uint(bits) => {
                check_int_width(*bits)?;
                (format!("uint{bits}"), false, WORD)
            }
            TypeKind::Int(bits) => {
                check_int_width(*bits)?;
                (format!("int{bits}"), false, WORD)
            }
            TypeKind::Bool => ("bool".to_string(), false, WORD),
            TypeKind::Address => ("address".to_string(), false, WORD),
            TypeKind::FixedBytes(size) => {
                if !(1..=WORD).contains(size) {
                    return Err(AbiError::Type(format!(
                        "fixed bytes length {size} outside 1..=32"
                    )));
                }
                (format!("bytes{size}"), false, WORD)
            }
            TypeKind::Bytes => ("bytes".to_string(), true, WORD),
            TypeKind::String => ("string".to_string(), true, WORD),
            TypeKind::Function => ("function".to_string(), false, WORD),
            TypeKind::FixedArray(elem, len) => {
                if !(1..=MAX_FIXED_ARRAY_LEN).contains(len) {
                    return Err(AbiError::Type(format!(
                        "fixed array length {len} outside 1..={MAX_FIXED_ARRAY_LEN}"
                    )));
                }
                let head_size = if elem.dynamic {
                    WORD
                } else {
                    elem.head_size
                        .checked_mul(*len)
                        .ok_or_else(|| AbiError::Type(format!("{}[{len}] is too large", elem)))?
                };
                (format!("{}[{len}]", elem.canonical), elem.dynamic, head_size)
            }
            TypeKind::Array(elem) => (format!("{}[]", elem.canonical), true, WORD),
            TypeKind::Tuple(fields) => {
                if fields.is_empty() {
                    return Err(AbiError::Type("tuple without components".to_string()));
                }
                let inner: Vec<&str> = fields.iter().map(|f| f.ty.canonical.as_str()).collect();
                let dynamic = fields.iter().any(|f| f.ty.dynamic);
                let head_size = if dynamic {
                    WORD
                } else {
                    fields
                        .iter()
                        .try_fold(0usize, |acc, f| acc.checked_add(f.ty.head_size))
                        .ok_or_else(|| AbiError::Type("tuple is too large".to_string()))?
                };
                (format!("({})", inner.join(",")), dynamic, head_size)
            }
        };

        Ok(Self {
            kind,
            canonical,
            dynamic,
            head_size,
        })
    }

    pub fn uint(bits: usize) -> Result<Self> {
        Self::new(TypeKind::Uint(bits))
    }

    pub fn int(bits: usize) -> Result<Self> {
        Self::new(TypeKind::Int(bits))
    }

    pub fn uint256() -> Self {
        Self::elementary(TypeKind::Uint(256), "uint256")
    }

    pub fn int256() -> Self {
        Self::elementary(TypeKind::Int(256), "int256")
    }

    pub fn bool() -> Self {
        Self::elementary(TypeKind::Bool, "bool")
    }

    pub fn address() -> Self {
        Self::elementary(TypeKind::Address, "address")
    }

    pub fn function() -> Self {
        Self::elementary(TypeKind::Function, "function")
    }

    pub fn bytes() -> Self {
        Self {
            kind: TypeKind::Bytes,
            canonical: "bytes".to_string(),
            dynamic: true,
            head_size: WORD,
        }
    }

    pub fn string() -> Self {
        Self {
            kind: TypeKind::String,
            canonical: "string".to_string(),
            dynamic: true,
            head_size: WORD,
        }
    }

    pub fn fixed_bytes(size: usize) -> Result<Self> {
        Self::new(TypeKind::FixedBytes(size))
    }

    /// `elem[]`. Always dynamic.
    pub fn array(elem: Type) -> Self {
        Self {
            canonical: format!("{}[]", elem.canonical),
            kind: TypeKind::Array(Box::new(elem)),
            dynamic: true,
            head_size: WORD,
        }
    }

    pub fn fixed_array(elem: Type, len: usize) -> Result<Self> {
        Self::new(TypeKind::FixedArray(Box::new(elem), len))
    }

    pub fn tuple(fields: Vec<TupleField>) -> Result<Self> {
        Self::new(TypeKind::Tuple(fields))
    }

    fn elementary(kind: TypeKind, canonical: &str) -> Self {
        Self {
            kind,
            canonical: canonical.to_string(),
            dynamic: false,
            head_size: WORD,
        }
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Canonical form used in signatures, e.g. `(uint256,uint256)[5][]`.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Whether values of this type are encoded by reference into the tail.
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Bytes a value occupies in its enclosing head region.
    ///
    /// Static arrays and static tuples are inlined, so their head size is the
    /// sum of their members; everything else takes one word.
    pub fn head_size(&self) -> usize {
        self.head_size
    }

    /// Parses a human-readable type such as `uint`, `bytes32[2]` or
    /// `(address,(bool,string)[])[]`. Tuple components may carry names
    /// (`(uint256 amount,address to)`).
    ///
    /// # Errors
    /// Returns [`AbiError::Type`] for anything that is not a valid type.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AbiError::Type("empty type string".to_string()));
        }

        if text.ends_with(']') {
            let open = text
                .rfind('[')
                .ok_or_else(|| AbiError::Type(format!("unbalanced brackets in {text:?}")))?;
            let inner = Self::parse(&text[..open])?;
            return wrap_array(inner, &text[open + 1..text.len() - 1]);
        }

        if let Some(body) = text.strip_prefix('(') {
            let body = body
                .strip_suffix(')')
                .ok_or_else(|| AbiError::Type(format!("unbalanced parentheses in {text:?}")))?;
            if body.trim().is_empty() {
                return Err(AbiError::Type("tuple without components".to_string()));
            }
            let fields = split_top_level(body)?
                .into_iter()
                .map(parse_component)
                .collect::<Result<Vec<_>>>()?;
            return Self::tuple(fields);
        }

        parse_elementary(text)
    }

    /// Builds a type from a schema descriptor, where tuples are spelled
    /// `tuple`, `tuple[]`, `tuple[5][]` and described by `components`.
    ///
    /// # Errors
    /// Returns [`AbiError::Type`] for unknown keywords, bad bounds or a
    /// tuple descriptor without components.
    pub fn from_abi(ty: &str, components: &[ArgumentMarshaling]) -> Result<Self> {
        let Some(suffix) = ty.strip_prefix("tuple") else {
            return Self::parse(ty);
        };

        let fields = components
            .iter()
            .map(|c| Ok(TupleField::new(c.name.clone(), Self::from_abi(&c.ty, &c.components)?)))
            .collect::<Result<Vec<_>>>()?;
        let mut current = Self::tuple(fields)?;

        let mut rest = suffix;
        while !rest.is_empty() {
            let body = rest
                .strip_prefix('[')
                .ok_or_else(|| AbiError::Type(format!("invalid tuple type {ty:?}")))?;
            let close = body
                .find(']')
                .ok_or_else(|| AbiError::Type(format!("unbalanced brackets in {ty:?}")))?;
            current = wrap_array(current, &body[..close])?;
            rest = &body[close + 1..];
        }
        Ok(current)
    }
}

fn check_int_width(bits: usize) -> Result<()> {
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(AbiError::Type(format!(
            "integer width {bits} is not a multiple of 8 in 8..=256"
        )));
    }
    Ok(())
}

fn wrap_array(elem: Type, len: &str) -> Result<Type> {
    let len = len.trim();
    if len.is_empty() {
        return Ok(Type::array(elem));
    }
    Type::fixed_array(elem, parse_size(len)?)
}

fn parse_size(digits: &str) -> Result<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AbiError::Type(format!("invalid size {digits:?}")));
    }
    digits
        .parse::<usize>()
        .map_err(|_| AbiError::Type(format!("size {digits} is too large")))
}

fn parse_elementary(name: &str) -> Result<Type> {
    match name {
        "bool" => return Ok(Type::bool()),
        "address" => return Ok(Type::address()),
        "string" => return Ok(Type::string()),
        "bytes" => return Ok(Type::bytes()),
        "function" => return Ok(Type::function()),
        "uint" => return Ok(Type::uint256()),
        "int" => return Ok(Type::int256()),
        _ => {}
    }

    if let Some(width) = name.strip_prefix("uint") {
        return Type::uint(parse_size(width)?);
    }
    if let Some(width) = name.strip_prefix("int") {
        return Type::int(parse_size(width)?);
    }
    if let Some(size) = name.strip_prefix("bytes") {
        return Type::fixed_bytes(parse_size(size)?);
    }
    Err(AbiError::Type(format!("unsupported arg type: {name}")))
}

/// Splits `a,(b,c),d[]` on commas that are not nested inside parentheses.
pub(crate) fn split_top_level(body: &str) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| AbiError::Type(format!("unbalanced parentheses in {body:?}")))?;
            }
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(AbiError::Type(format!("unbalanced parentheses in {body:?}")));
    }
    parts.push(&body[start..]);
    Ok(parts)
}

/// Data-location and event keywords that may follow a type in a declaration.
const MODIFIERS: [&str; 4] = ["memory", "calldata", "storage", "indexed"];

/// Parses one `type [modifiers] [name]` component of a parameter list.
pub(crate) fn parse_component(text: &str) -> Result<TupleField> {
    let text = text.trim();
    // Type strings only contain whitespace inside parentheses, so the first
    // top-level whitespace ends the type.
    let mut depth = 0usize;
    let mut split = None;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => {
                split = Some(i);
                break;
            }
            _ => {}
        }
    }

    let (ty, rest) = match split {
        Some(i) => (&text[..i], &text[i..]),
        None => (text, ""),
    };
    let name = rest
        .split_whitespace()
        .filter(|word| !MODIFIERS.contains(word))
        .last()
        .unwrap_or_default();
    Ok(TupleField::new(name, Type::parse(ty)?))
}
