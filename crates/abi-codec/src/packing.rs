//! Head/tail encoding of value sequences.
//!
//! A sequence is laid out as the concatenation of every member's head
//! followed by the tails of its dynamic members. Static members are written
//! in place (static arrays and tuples inline all of their words); dynamic
//! members put a 32-byte offset in their head slot, measured from the start
//! of the sequence, and append their encoding to the tail. Array elements
//! and tuple fields form nested sequences of their own.

use alloy::primitives::{Address, FixedBytes, I256, U256};

use crate::error::{AbiError, Result};
use crate::types::{Type, TypeKind, WORD};
use crate::value::Value;

/// Encodes `values` against `types` as one head/tail sequence.
///
/// # Errors
/// Returns [`AbiError::TypeMismatch`] if the counts differ or any value does
/// not fit its type.
pub fn encode_sequence(types: &[&Type], values: &[Value]) -> Result<Vec<u8>> {
    if types.len() != values.len() {
        return Err(AbiError::mismatch(
            format!("{} values", types.len()),
            format!("{} values", values.len()),
        ));
    }

    let head_size = types
        .iter()
        .try_fold(0usize, |acc, ty| acc.checked_add(ty.head_size()))
        .ok_or_else(|| AbiError::mismatch("sequence head", "more than usize::MAX bytes"))?;
    // Buffers grow with the values actually written; the declared head size
    // of a static type can be far larger than any value that matches it.
    let mut head = Vec::new();
    let mut tail = Vec::new();

    for (ty, value) in types.iter().zip(values) {
        if ty.is_dynamic() {
            let offset = head_size
                .checked_add(tail.len())
                .ok_or_else(|| AbiError::mismatch(ty, "offset past usize::MAX"))?;
            head.extend_from_slice(&usize_word(offset));
            encode_value(ty, value, &mut tail)?;
        } else {
            encode_value(ty, value, &mut head)?;
        }
    }

    head.extend_from_slice(&tail);
    Ok(head)
}

/// Appends the encoding of a single value. Dynamic types write their full
/// body (length prefix and nested sequence) since the caller places it.
fn encode_value(ty: &Type, value: &Value, out: &mut Vec<u8>) -> Result<()> {
    let mismatch = || AbiError::mismatch(ty, value.describe());

    match (ty.kind(), value) {
        (TypeKind::Uint(bits), Value::Uint(v)) => {
            if v.bit_len() > *bits {
                return Err(mismatch());
            }
            out.extend_from_slice(&v.to_be_bytes::<32>());
        }
        (TypeKind::Int(bits), Value::Int(v)) => {
            let raw = v.into_raw();
            if !fits_signed(raw, *bits) {
                return Err(mismatch());
            }
            out.extend_from_slice(&raw.to_be_bytes::<32>());
        }
        (TypeKind::Int(bits), Value::Uint(v)) => {
            // Non-negative values are accepted for signed slots when the
            // sign bit stays clear.
            if v.bit_len() >= *bits {
                return Err(mismatch());
            }
            out.extend_from_slice(&v.to_be_bytes::<32>());
        }
        (TypeKind::Bool, Value::Bool(b)) => {
            let mut word = [0u8; WORD];
            word[WORD - 1] = u8::from(*b);
            out.extend_from_slice(&word);
        }
        (TypeKind::Address, Value::Address(addr)) => {
            let mut word = [0u8; WORD];
            word[12..].copy_from_slice(addr.as_slice());
            out.extend_from_slice(&word);
        }
        (TypeKind::FixedBytes(size), Value::FixedBytes(bytes)) => {
            if bytes.len() != *size {
                return Err(mismatch());
            }
            out.extend_from_slice(&right_pad(bytes));
        }
        (TypeKind::Function, Value::Function(func)) => {
            out.extend_from_slice(&right_pad(func.as_slice()));
        }
        (TypeKind::Bytes, Value::Bytes(bytes)) => encode_dynamic_bytes(bytes, out),
        (TypeKind::String, Value::String(s)) => encode_dynamic_bytes(s.as_bytes(), out),
        (TypeKind::Array(elem), Value::Array(items)) => {
            out.extend_from_slice(&usize_word(items.len()));
            let types = vec![elem.as_ref(); items.len()];
            out.extend_from_slice(&encode_sequence(&types, items)?);
        }
        (TypeKind::FixedArray(elem, len), Value::Array(items)) => {
            if items.len() != *len {
                return Err(mismatch());
            }
            let types = vec![elem.as_ref(); *len];
            out.extend_from_slice(&encode_sequence(&types, items)?);
        }
        (TypeKind::Tuple(fields), Value::Tuple(items)) => {
            if items.len() != fields.len() {
                return Err(mismatch());
            }
            let types: Vec<&Type> = fields.iter().map(|f| &f.ty).collect();
            out.extend_from_slice(&encode_sequence(&types, items)?);
        }
        _ => return Err(mismatch()),
    }
    Ok(())
}

/// Length word followed by the content right-padded to a word boundary.
fn encode_dynamic_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(&usize_word(bytes.len()));
    out.extend_from_slice(bytes);
    let rem = bytes.len() % WORD;
    if rem != 0 {
        out.resize(out.len() + WORD - rem, 0);
    }
}

fn right_pad(bytes: &[u8]) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[..bytes.len()].copy_from_slice(bytes);
    word
}

fn usize_word(n: usize) -> [u8; WORD] {
    U256::from(n).to_be_bytes::<32>()
}

/// Whether the two's complement word `raw` is a sign extension of its low
/// `bits` bits.
pub(crate) fn fits_signed(raw: U256, bits: usize) -> bool {
    if bits >= 256 {
        return true;
    }
    let high = raw >> (bits - 1);
    high == U256::ZERO || high == U256::MAX >> (bits - 1)
}

/// Decodes a head/tail sequence starting at the beginning of `block`.
///
/// Offsets in head slots are resolved relative to `block`. Every offset and
/// length is checked against the bytes available before it is used.
///
/// A valid encoding spends a word of its own on every elementary value,
/// byte string and array length, so decoding is limited to one such item
/// per word of `block`. Offsets that alias the same child block therefore
/// cannot expand a small input into an unbounded result.
///
/// # Errors
/// Returns [`AbiError::Decode`] for truncated or out-of-bounds input, for
/// words that are not valid encodings of their type, and for input that
/// decodes to more items than it has words.
pub fn decode_sequence(types: &[&Type], block: &[u8]) -> Result<Vec<Value>> {
    let mut budget = Budget(block.len() / WORD);
    decode_sequence_in(types, block, &mut budget)
}

/// Remaining number of word-backed items a decode may produce.
struct Budget(usize);

impl Budget {
    fn charge(&mut self, ty: &Type) -> Result<()> {
        self.0 = self.0.checked_sub(1).ok_or_else(|| {
            AbiError::decode(format!(
                "{ty} decodes to more items than the input has words"
            ))
        })?;
        Ok(())
    }
}

fn decode_sequence_in(types: &[&Type], block: &[u8], budget: &mut Budget) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(types.len());
    let mut pos = 0usize;

    for ty in types {
        let value = if ty.is_dynamic() {
            let offset = read_usize(block, pos)?;
            if offset > block.len() {
                return Err(AbiError::decode(format!(
                    "offset {offset} out of bounds for {} bytes of {ty}",
                    block.len()
                )));
            }
            decode_value(ty, &block[offset..], budget)?
        } else {
            let end = pos
                .checked_add(ty.head_size())
                .filter(|end| *end <= block.len())
                .ok_or_else(|| {
                    AbiError::decode(format!(
                        "length insufficient {} require {}",
                        block.len(),
                        pos.saturating_add(ty.head_size())
                    ))
                })?;
            decode_value(ty, &block[pos..end], budget)?
        };
        values.push(value);
        pos += ty.head_size();
    }

    Ok(values)
}

/// Decodes one value whose encoding starts at `data[0]`.
fn decode_value(ty: &Type, data: &[u8], budget: &mut Budget) -> Result<Value> {
    match ty.kind() {
        TypeKind::FixedArray(..) | TypeKind::Tuple(_) => {}
        _ => budget.charge(ty)?,
    }

    match ty.kind() {
        TypeKind::Uint(bits) => {
            let v = U256::from_be_bytes(read_word(data, 0)?);
            if v.bit_len() > *bits {
                return Err(AbiError::decode(format!("{v} overflows {ty}")));
            }
            Ok(Value::Uint(v))
        }
        TypeKind::Int(bits) => {
            let raw = U256::from_be_bytes(read_word(data, 0)?);
            if !fits_signed(raw, *bits) {
                return Err(AbiError::decode(format!("improperly sign-extended {ty}")));
            }
            Ok(Value::Int(I256::from_raw(raw)))
        }
        TypeKind::Bool => {
            let word = read_word(data, 0)?;
            if word[..WORD - 1].iter().any(|b| *b != 0) || word[WORD - 1] > 1 {
                return Err(AbiError::decode("improperly encoded boolean value"));
            }
            Ok(Value::Bool(word[WORD - 1] == 1))
        }
        TypeKind::Address => {
            let word = read_word(data, 0)?;
            check_zero(ty, &word[..12])?;
            Ok(Value::Address(Address::from_slice(&word[12..])))
        }
        TypeKind::FixedBytes(size) => {
            let word = read_word(data, 0)?;
            check_zero(ty, &word[*size..])?;
            Ok(Value::FixedBytes(word[..*size].to_vec()))
        }
        TypeKind::Function => {
            let word = read_word(data, 0)?;
            check_zero(ty, &word[24..])?;
            Ok(Value::Function(FixedBytes::from_slice(&word[..24])))
        }
        TypeKind::Bytes => read_dynamic_bytes(data).map(|b| Value::Bytes(b.to_vec())),
        TypeKind::String => {
            let bytes = read_dynamic_bytes(data)?;
            String::from_utf8(bytes.to_vec())
                .map(Value::String)
                .map_err(|_| AbiError::decode("string is not valid UTF-8"))
        }
        TypeKind::Array(elem) => {
            let count = read_usize(data, 0)?;
            let body = &data[WORD..];
            // Every element needs at least one head slot; reject counts the
            // remaining bytes cannot back before allocating for them.
            let needed = count.checked_mul(elem.head_size());
            if needed.map_or(true, |needed| needed > body.len()) {
                return Err(AbiError::decode(format!(
                    "array of {count} {elem} elements out of bounds for {} bytes",
                    body.len()
                )));
            }
            let types = vec![elem.as_ref(); count];
            decode_sequence_in(&types, body, budget).map(Value::Array)
        }
        TypeKind::FixedArray(elem, len) => {
            let types = vec![elem.as_ref(); *len];
            decode_sequence_in(&types, data, budget).map(Value::Array)
        }
        TypeKind::Tuple(fields) => {
            let types: Vec<&Type> = fields.iter().map(|f| &f.ty).collect();
            decode_sequence_in(&types, data, budget).map(Value::Tuple)
        }
    }
}

/// Padding around a value inside its word must be zero.
fn check_zero(ty: &Type, padding: &[u8]) -> Result<()> {
    if padding.iter().any(|b| *b != 0) {
        return Err(AbiError::decode(format!("non-zero padding in {ty}")));
    }
    Ok(())
}

fn read_word(data: &[u8], pos: usize) -> Result<[u8; WORD]> {
    let end = pos
        .checked_add(WORD)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| {
            AbiError::decode(format!(
                "length insufficient {} require {}",
                data.len(),
                pos.saturating_add(WORD)
            ))
        })?;
    let mut word = [0u8; WORD];
    word.copy_from_slice(&data[pos..end]);
    Ok(word)
}

/// Reads an offset or length word, rejecting values that cannot index memory.
fn read_usize(data: &[u8], pos: usize) -> Result<usize> {
    let word = read_word(data, pos)?;
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(AbiError::decode("offset or length larger than 64 bits"));
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&word[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(low))
        .map_err(|_| AbiError::decode("offset or length does not fit in memory"))
}

fn read_dynamic_bytes(data: &[u8]) -> Result<&[u8]> {
    let len = read_usize(data, 0)?;
    let end = WORD
        .checked_add(len)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| {
            AbiError::decode(format!(
                "length {len} out of bounds for {} bytes",
                data.len().saturating_sub(WORD)
            ))
        })?;
    Ok(&data[WORD..end])
}
