//! Event entries of a contract interface.

use std::fmt;

use abi_codec::Arguments;
use alloy::primitives::{keccak256, B256};

/// An event declaration.
///
/// Non-indexed inputs make up the log data; indexed inputs each occupy one
/// topic after the event id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    /// Registry key; overloads carry a numeric suffix.
    pub name: String,
    /// Declared name, used in the signature.
    pub raw_name: String,
    pub anonymous: bool,
    pub inputs: Arguments,
    /// e.g. `Transfer(address,address,uint256)`.
    pub signature: String,
    /// Hash of the signature, emitted as the first topic. `None` for
    /// anonymous events, which do not emit it.
    pub id: Option<B256>,
    rendered: String,
}

impl Event {
    pub fn new(
        name: impl Into<String>,
        raw_name: impl Into<String>,
        anonymous: bool,
        inputs: Arguments,
    ) -> Self {
        let raw_name = raw_name.into();
        let signature = format!("{}({})", raw_name, inputs.canonical_types().join(","));
        let id = (!anonymous).then(|| keccak256(signature.as_bytes()));

        let params = inputs
            .iter()
            .map(|input| match (input.indexed, input.name.is_empty()) {
                (true, true) => format!("{} indexed", input.ty),
                (true, false) => format!("{} indexed {}", input.ty, input.name),
                (false, true) => input.ty.to_string(),
                (false, false) => format!("{} {}", input.ty, input.name),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let rendered = format!("event {raw_name}({params})");

        Self {
            name: name.into(),
            raw_name,
            anonymous,
            inputs,
            signature,
            id,
            rendered,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}
