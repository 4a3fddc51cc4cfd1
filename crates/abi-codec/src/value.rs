//! Decoded and to-be-encoded values.

use alloy::primitives::{hex, Address, FixedBytes, I256, U256};
use serde_json::Value as Json;

use crate::error::{AbiError, Result};
use crate::types::{Type, TypeKind};

/// A value of some [`Type`], one variant per type family.
///
/// Fixed and dynamic arrays share [`Value::Array`]; tuples are positional.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Uint(U256),
    Int(I256),
    Bool(bool),
    Address(Address),
    /// Contents of a `bytesN` value, exactly N bytes long.
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<Value>),
    Tuple(Vec<Value>),
    /// Address followed by a 4-byte selector.
    Function(FixedBytes<24>),
}

impl Value {
    /// Short description used in mismatch errors.
    pub fn describe(&self) -> String {
        match self {
            Value::Uint(v) => format!("uint value {v}"),
            Value::Int(v) => format!("int value {v}"),
            Value::Bool(_) => "bool".to_string(),
            Value::Address(_) => "address".to_string(),
            Value::FixedBytes(b) => format!("bytes{}", b.len()),
            Value::Bytes(_) => "bytes".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Array(items) => format!("array of {} elements", items.len()),
            Value::Tuple(items) => format!("tuple of {} elements", items.len()),
            Value::Function(_) => "function".to_string(),
        }
    }

    pub fn as_uint(&self) -> Option<U256> {
        match self {
            Value::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<I256> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            Value::Address(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Contents of `bytes`, `bytesN` and `function` values.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) | Value::FixedBytes(b) => Some(b),
            Value::Function(f) => Some(f.as_slice()),
            _ => None,
        }
    }

    /// Elements of an array or tuple.
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) | Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Renders the value for display: integers as decimal strings, byte
    /// values as `0x` hex, addresses checksummed, arrays and tuples as JSON
    /// arrays.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Uint(v) => Json::String(v.to_string()),
            Value::Int(v) => Json::String(v.to_string()),
            Value::Bool(b) => Json::Bool(*b),
            Value::Address(a) => Json::String(a.to_checksum(None)),
            Value::FixedBytes(b) | Value::Bytes(b) => Json::String(hex::encode_prefixed(b)),
            Value::String(s) => Json::String(s.clone()),
            Value::Array(items) | Value::Tuple(items) => {
                Json::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Function(f) => Json::String(hex::encode_prefixed(f.as_slice())),
        }
    }

    /// Coerces JSON input into a value of type `ty`.
    ///
    /// Integers accept JSON numbers and decimal or `0x` hex strings; byte
    /// values accept `0x` hex strings; tuples accept positional arrays or
    /// objects keyed by component name. Range and length checks against the
    /// type happen when the value is packed.
    ///
    /// # Errors
    /// Returns [`AbiError::TypeMismatch`] when the JSON shape cannot
    /// represent the type.
    pub fn from_json(ty: &Type, json: &Json) -> Result<Self> {
        let mismatch = || AbiError::mismatch(ty, format!("JSON {json}"));

        match ty.kind() {
            TypeKind::Uint(_) => parse_uint(json).map(Value::Uint).ok_or_else(mismatch),
            TypeKind::Int(_) => parse_int(json).map(Value::Int).ok_or_else(mismatch),
            TypeKind::Bool => json.as_bool().map(Value::Bool).ok_or_else(mismatch),
            TypeKind::Address => json
                .as_str()
                .and_then(|s| s.parse::<Address>().ok())
                .map(Value::Address)
                .ok_or_else(mismatch),
            TypeKind::FixedBytes(_) => parse_hex(json).map(Value::FixedBytes).ok_or_else(mismatch),
            TypeKind::Bytes => parse_hex(json).map(Value::Bytes).ok_or_else(mismatch),
            TypeKind::String => json
                .as_str()
                .map(|s| Value::String(s.to_string()))
                .ok_or_else(mismatch),
            TypeKind::Function => parse_hex(json)
                .filter(|b| b.len() == 24)
                .map(|b| Value::Function(FixedBytes::from_slice(&b)))
                .ok_or_else(mismatch),
            TypeKind::Array(elem) | TypeKind::FixedArray(elem, _) => {
                let items = json.as_array().ok_or_else(mismatch)?;
                items
                    .iter()
                    .map(|item| Self::from_json(elem, item))
                    .collect::<Result<Vec<_>>>()
                    .map(Value::Array)
            }
            TypeKind::Tuple(fields) => {
                if let Some(items) = json.as_array() {
                    if items.len() != fields.len() {
                        return Err(mismatch());
                    }
                    return fields
                        .iter()
                        .zip(items)
                        .map(|(field, item)| Self::from_json(&field.ty, item))
                        .collect::<Result<Vec<_>>>()
                        .map(Value::Tuple);
                }
                let object = json.as_object().ok_or_else(mismatch)?;
                fields
                    .iter()
                    .map(|field| {
                        let item = object.get(&field.name).ok_or_else(|| {
                            AbiError::mismatch(ty, format!("JSON object without {:?}", field.name))
                        })?;
                        Self::from_json(&field.ty, item)
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(Value::Tuple)
            }
        }
    }
}

fn parse_uint(json: &Json) -> Option<U256> {
    match json {
        Json::Number(n) => n.as_u64().map(U256::from),
        Json::String(s) => match s.strip_prefix("0x") {
            Some(digits) => U256::from_str_radix(digits, 16).ok(),
            None => U256::from_str_radix(s, 10).ok(),
        },
        _ => None,
    }
}

fn parse_int(json: &Json) -> Option<I256> {
    match json {
        Json::Number(n) if n.is_i64() || n.is_u64() => I256::from_dec_str(&n.to_string()).ok(),
        Json::String(s) => match s.strip_prefix("0x") {
            // Hex input is the raw two's complement word.
            Some(digits) => U256::from_str_radix(digits, 16).ok().map(I256::from_raw),
            None => I256::from_dec_str(s).ok(),
        },
        _ => None,
    }
}

fn parse_hex(json: &Json) -> Option<Vec<u8>> {
    json.as_str().and_then(|s| hex::decode(s).ok())
}

impl From<U256> for Value {
    fn from(v: U256) -> Self {
        Value::Uint(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(U256::from(v))
    }
}

impl From<I256> for Value {
    fn from(v: I256) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Address> for Value {
    fn from(v: Address) -> Self {
        Value::Address(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use serde_json::json;

    fn ty(text: &str) -> Type {
        Type::parse(text).expect("valid type")
    }

    #[test]
    fn coerces_numbers_and_numeric_strings() {
        assert_eq!(
            Value::from_json(&ty("uint256"), &json!(42)).unwrap(),
            Value::Uint(U256::from(42))
        );
        assert_eq!(
            Value::from_json(&ty("uint256"), &json!("0xff")).unwrap(),
            Value::Uint(U256::from(255))
        );
        assert_eq!(
            Value::from_json(&ty("int8"), &json!(-3)).unwrap(),
            Value::Int(I256::from_dec_str("-3").unwrap())
        );
        assert!(Value::from_json(&ty("uint8"), &json!(-3)).is_err());
        assert!(Value::from_json(&ty("uint8"), &json!(1.5)).is_err());
    }

    #[test]
    fn coerces_tuples_from_arrays_and_objects() {
        let point = ty("(uint256 x,bool y)");
        let expected = Value::Tuple(vec![Value::Uint(U256::from(7)), Value::Bool(true)]);
        assert_eq!(Value::from_json(&point, &json!([7, true])).unwrap(), expected);
        assert_eq!(
            Value::from_json(&point, &json!({"x": "7", "y": true})).unwrap(),
            expected
        );
        assert!(Value::from_json(&point, &json!({"x": 7})).is_err());
        assert!(Value::from_json(&point, &json!([7])).is_err());
    }

    #[test]
    fn renders_values_for_display() {
        let value = Value::Tuple(vec![
            Value::Address(address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D")),
            Value::Bytes(vec![0xde, 0xad]),
            Value::Int(I256::from_dec_str("-1").unwrap()),
        ]);
        assert_eq!(
            value.to_json(),
            json!(["0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D", "0xdead", "-1"])
        );
    }
}
