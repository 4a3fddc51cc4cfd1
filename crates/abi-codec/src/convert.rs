//! Conversions from decoded [`Value`]s into caller-owned Rust types.
//!
//! [`FromValue`] covers single values; [`AbiRecord`] is a destination whose
//! fields are assigned by argument name. Plain structs get both through the
//! [`abi_record!`](crate::abi_record) macro.

use alloy::primitives::{Address, Bytes, FixedBytes, I256, U256};

use crate::error::{AbiError, Result};
use crate::packing::fits_signed;
use crate::value::Value;

/// Conversion out of a decoded value.
pub trait FromValue: Sized {
    /// # Errors
    /// Returns [`AbiError::Shape`] when `value` cannot be represented.
    fn from_value(value: Value) -> Result<Self>;
}

/// A structured destination for [`Arguments::copy`](crate::Arguments::copy).
pub trait AbiRecord {
    /// Assigns `value` to the field matching argument `name`.
    ///
    /// # Errors
    /// Returns [`AbiError::Shape`] if there is no such field or the value
    /// does not convert into the field's type.
    fn set_field(&mut self, name: &str, value: Value) -> Result<()>;
}

/// Implements [`AbiRecord`] and [`FromValue`] for a struct.
///
/// Argument names match a field either verbatim or after conversion to
/// `snake_case` (`amountIn` → `amount_in`, `_from` → `from`). The
/// [`FromValue`] impl reads a positional tuple in the listed field order and
/// needs the struct to implement `Default`.
///
/// ```ignore
/// #[derive(Default)]
/// struct Reserves { reserve0: U256, reserve1: U256, block_timestamp_last: u32 }
/// abi_record!(Reserves { reserve0, reserve1, block_timestamp_last });
/// ```
#[macro_export]
macro_rules! abi_record {
    ($ty:ident { $($field:ident),+ $(,)? }) => {
        impl $crate::AbiRecord for $ty {
            fn set_field(&mut self, name: &str, value: $crate::Value) -> $crate::Result<()> {
                let normalized = $crate::convert::to_snake_case(name);
                $(
                    if name == stringify!($field) || normalized == stringify!($field) {
                        self.$field = $crate::FromValue::from_value(value)
                            .map_err(|err| $crate::convert::in_field(stringify!($field), err))?;
                        return Ok(());
                    }
                )+
                Err($crate::AbiError::Shape(format!(
                    "field {} can't be found in {}",
                    name,
                    stringify!($ty)
                )))
            }
        }

        impl $crate::FromValue for $ty {
            fn from_value(value: $crate::Value) -> $crate::Result<Self> {
                let items = match value {
                    $crate::Value::Tuple(items) => items,
                    other => {
                        return Err($crate::AbiError::Shape(format!(
                            "{} is not a tuple for {}",
                            other.describe(),
                            stringify!($ty)
                        )))
                    }
                };
                let expected = [$(stringify!($field)),+].len();
                if items.len() != expected {
                    return Err($crate::AbiError::Shape(format!(
                        "tuple of {} elements for {} fields of {}",
                        items.len(),
                        expected,
                        stringify!($ty)
                    )));
                }
                let mut out = <Self as Default>::default();
                let mut items = items.into_iter();
                $(
                    if let Some(item) = items.next() {
                        out.$field = $crate::FromValue::from_value(item)
                            .map_err(|err| $crate::convert::in_field(stringify!($field), err))?;
                    }
                )+
                Ok(out)
            }
        }
    };
}

/// Prefixes a conversion error with the field it occurred in.
#[doc(hidden)]
pub fn in_field(field: &str, err: AbiError) -> AbiError {
    match err {
        AbiError::Shape(msg) => AbiError::Shape(format!("field {field}: {msg}")),
        other => other,
    }
}

/// `amountIn` → `amount_in`, `_to` → `to`, `tokenID` → `token_id`.
pub fn to_snake_case(name: &str) -> String {
    let trimmed = name.trim_start_matches('_');
    let chars: Vec<char> = trimmed.chars().collect();
    let mut out = String::with_capacity(trimmed.len() + 4);
    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev != '_' && (prev.is_lowercase() || prev.is_ascii_digit() || next_lower) {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}

fn shape(target: &str, value: &Value) -> AbiError {
    AbiError::shape(format!("cannot convert {} into {target}", value.describe()))
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl FromValue for U256 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uint(v) => Ok(v),
            Value::Int(v) if !v.is_negative() => Ok(v.into_raw()),
            other => Err(shape("U256", &other)),
        }
    }
}

impl FromValue for I256 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int(v) => Ok(v),
            Value::Uint(v) if v.bit_len() < 256 => Ok(I256::from_raw(v)),
            other => Err(shape("I256", &other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(shape("bool", &other)),
        }
    }
}

impl FromValue for Address {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Address(a) => Ok(a),
            other => Err(shape("Address", &other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(shape("String", &other)),
        }
    }
}

impl FromValue for Bytes {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(b) | Value::FixedBytes(b) => Ok(Bytes::from(b)),
            other => Err(shape("Bytes", &other)),
        }
    }
}

impl<const N: usize> FromValue for FixedBytes<N> {
    fn from_value(value: Value) -> Result<Self> {
        match &value {
            Value::FixedBytes(b) if b.len() == N => Ok(FixedBytes::from_slice(b)),
            Value::Function(f) if N == 24 => Ok(FixedBytes::from_slice(f.as_slice())),
            _ => Err(shape(&format!("FixedBytes<{N}>"), &value)),
        }
    }
}

fn low_u128(v: U256) -> Option<u128> {
    if v.bit_len() > 128 {
        return None;
    }
    let bytes = v.to_be_bytes::<32>();
    let mut low = [0u8; 16];
    low.copy_from_slice(&bytes[16..]);
    Some(u128::from_be_bytes(low))
}

fn low_i128(v: I256) -> Option<i128> {
    let raw = v.into_raw();
    if !fits_signed(raw, 128) {
        return None;
    }
    let bytes = raw.to_be_bytes::<32>();
    let mut low = [0u8; 16];
    low.copy_from_slice(&bytes[16..]);
    Some(i128::from_be_bytes(low))
}

macro_rules! impl_from_value_int {
    ($($t:ty),+) => {$(
        impl FromValue for $t {
            fn from_value(value: Value) -> Result<Self> {
                let converted = match &value {
                    Value::Uint(v) => low_u128(*v).and_then(|x| <$t>::try_from(x).ok()),
                    Value::Int(v) => low_i128(*v).and_then(|x| <$t>::try_from(x).ok()),
                    _ => None,
                };
                converted.ok_or_else(|| shape(stringify!($t), &value))
            }
        }
    )+};
}

impl_from_value_int!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            // Byte strings convert element-wise so `Vec<u8>` and `[u8; N]` work.
            Value::Bytes(bytes) | Value::FixedBytes(bytes) => bytes
                .into_iter()
                .map(|b| T::from_value(Value::Uint(U256::from(b))))
                .collect(),
            other => Err(shape("Vec", &other)),
        }
    }
}

impl<T: FromValue, const N: usize> FromValue for [T; N] {
    fn from_value(value: Value) -> Result<Self> {
        let items: Vec<T> = Vec::from_value(value)?;
        let len = items.len();
        <[T; N]>::try_from(items)
            .map_err(|_| AbiError::shape(format!("array of {len} elements into [_; {N}]")))
    }
}

macro_rules! impl_from_value_tuple {
    ($len:literal => $($name:ident),+) => {
        impl<$($name: FromValue),+> FromValue for ($($name,)+) {
            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Tuple(items) if items.len() == $len => {
                        let mut items = items.into_iter();
                        Ok(($(
                            $name::from_value(items.next().ok_or_else(|| {
                                AbiError::shape("tuple ended early")
                            })?)?,
                        )+))
                    }
                    other => Err(shape(concat!("tuple of ", $len), &other)),
                }
            }
        }
    };
}

impl_from_value_tuple!(1 => A);
impl_from_value_tuple!(2 => A, B);
impl_from_value_tuple!(3 => A, B, C);
impl_from_value_tuple!(4 => A, B, C, D);
impl_from_value_tuple!(5 => A, B, C, D, E);
impl_from_value_tuple!(6 => A, B, C, D, E, F);
