//! Named argument lists and their packing.

use std::collections::HashMap;
use std::ops::Deref;

use serde::Deserialize;

use crate::convert::{AbiRecord, FromValue};
use crate::error::{AbiError, Result};
use crate::packing::{decode_sequence, encode_sequence};
use crate::types::{Type, WORD};
use crate::value::Value;

/// Schema form of an argument: `{name, type, components?, indexed?}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ArgumentMarshaling {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, rename = "internalType")]
    pub internal_type: Option<String>,
    #[serde(default)]
    pub components: Vec<ArgumentMarshaling>,
    #[serde(default)]
    pub indexed: bool,
}

impl ArgumentMarshaling {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            ..Self::default()
        }
    }
}

/// A named, positioned type. `indexed` only matters for event inputs.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ArgumentMarshaling")]
pub struct Argument {
    pub name: String,
    pub ty: Type,
    pub indexed: bool,
}

impl Argument {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            indexed: false,
        }
    }

    pub fn indexed(name: impl Into<String>, ty: Type) -> Self {
        Self {
            indexed: true,
            ..Self::new(name, ty)
        }
    }
}

impl TryFrom<ArgumentMarshaling> for Argument {
    type Error = AbiError;

    fn try_from(raw: ArgumentMarshaling) -> Result<Self> {
        Ok(Self {
            ty: Type::from_abi(&raw.ty, &raw.components)?,
            name: raw.name,
            indexed: raw.indexed,
        })
    }
}

/// Ordered argument list. Order fixes both the signature and the wire layout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Arguments(Vec<Argument>);

impl Deref for Arguments {
    type Target = [Argument];

    fn deref(&self) -> &[Argument] {
        &self.0
    }
}

impl From<Vec<Argument>> for Arguments {
    fn from(args: Vec<Argument>) -> Self {
        Self(args)
    }
}

impl FromIterator<Argument> for Arguments {
    fn from_iter<I: IntoIterator<Item = Argument>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arguments that are encoded in log data rather than topics.
    pub fn non_indexed(&self) -> impl Iterator<Item = &Argument> {
        self.0.iter().filter(|arg| !arg.indexed)
    }

    /// Canonical type strings in order, e.g. for building a signature.
    pub fn canonical_types(&self) -> Vec<&str> {
        self.0.iter().map(|arg| arg.ty.canonical()).collect()
    }

    /// Packs one value per argument, in order.
    ///
    /// # Errors
    /// Returns [`AbiError::TypeMismatch`] for a wrong value count or a value
    /// that does not fit its argument's type.
    pub fn pack(&self, values: &[Value]) -> Result<Vec<u8>> {
        if values.len() != self.0.len() {
            return Err(AbiError::TypeMismatch {
                expected: format!("{} arguments", self.0.len()),
                found: format!("{} values", values.len()),
            });
        }
        let types: Vec<&Type> = self.0.iter().map(|arg| &arg.ty).collect();
        let packed = encode_sequence(&types, values)?;
        tracing::trace!(args = types.len(), bytes = packed.len(), "packed arguments");
        Ok(packed)
    }

    /// Unpacks the non-indexed arguments from `data`, in order.
    ///
    /// # Errors
    /// Returns [`AbiError::Decode`] if `data` is empty while arguments are
    /// expected, is not a whole number of words, or is malformed.
    pub fn unpack(&self, data: &[u8]) -> Result<Vec<Value>> {
        let types: Vec<&Type> = self.non_indexed().map(|arg| &arg.ty).collect();
        if data.is_empty() {
            if types.is_empty() {
                return Ok(Vec::new());
            }
            return Err(AbiError::Decode(
                "attempting to unmarshal an empty string while arguments are expected".to_string(),
            ));
        }
        if data.len() % WORD != 0 {
            return Err(AbiError::Decode(format!(
                "data length {} is not a multiple of {WORD}",
                data.len()
            )));
        }
        let values = decode_sequence(&types, data)?;
        tracing::trace!(args = values.len(), bytes = data.len(), "unpacked arguments");
        Ok(values)
    }

    /// Unpacks `data` and inserts every non-indexed value into `map` under
    /// its argument name. Nothing is inserted if decoding fails.
    ///
    /// # Errors
    /// Same as [`Arguments::unpack`].
    pub fn unpack_into_map(&self, map: &mut HashMap<String, Value>, data: &[u8]) -> Result<()> {
        let values = self.unpack(data)?;
        for (arg, value) in self.non_indexed().zip(values) {
            map.insert(arg.name.clone(), value);
        }
        Ok(())
    }

    /// Assigns unpacked `values` into the fields of `dst`, matched by
    /// argument name.
    ///
    /// Fields are written to a clone of `dst` that replaces it only once
    /// every value has been assigned, so `dst` is untouched on error.
    ///
    /// # Errors
    /// Returns [`AbiError::Shape`] when the value count differs from the
    /// non-indexed arguments, or `dst` has no field for an argument or cannot
    /// hold its value.
    pub fn copy<D: AbiRecord + Clone>(&self, dst: &mut D, values: Vec<Value>) -> Result<()> {
        let args: Vec<&Argument> = self.non_indexed().collect();
        if values.len() != args.len() {
            return Err(AbiError::Shape(format!(
                "{} values for {} arguments",
                values.len(),
                args.len()
            )));
        }
        let mut staged = dst.clone();
        for (index, (arg, value)) in args.into_iter().zip(values).enumerate() {
            let name = if arg.name.is_empty() {
                format!("arg{index}")
            } else {
                arg.name.clone()
            };
            staged.set_field(&name, value)?;
        }
        *dst = staged;
        Ok(())
    }

    /// Converts the single unpacked value of a one-output list into `T`.
    ///
    /// # Errors
    /// Returns [`AbiError::Shape`] unless exactly one value is given and it
    /// converts into `T`.
    pub fn copy_atomic<T: FromValue>(&self, values: Vec<Value>) -> Result<T> {
        let mut values = values.into_iter();
        match (values.next(), values.next()) {
            (Some(value), None) => T::from_value(value),
            _ => Err(AbiError::Shape(
                "atomic copy needs exactly one value".to_string(),
            )),
        }
    }
}
