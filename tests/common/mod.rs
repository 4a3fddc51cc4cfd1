//! Shared fixtures for the integration tests.
//!
//! Provides sample interface descriptions and factories for the values the
//! tests pack and unpack.

#![allow(dead_code)]

use abi_codec::{Argument, Arguments, Type, Value};
use abi_contract::Abi;
use alloy::primitives::{Address, U256};

/// Interface exercising every entry kind, tuple nesting and legacy flags.
pub const SAMPLE_ABI: &str = r#"
[
    {"type": "function", "name": "balance", "stateMutability": "view"},
    {"type": "function", "name": "send", "inputs": [{"name": "amount", "type": "uint256"}]},
    {"type": "function", "name": "send", "inputs": [{"name": "amount", "type": "uint256"}, {"name": "memo", "type": "string"}]},
    {"type": "function", "name": "transfer", "inputs": [{"name": "from", "type": "address"}, {"name": "to", "type": "address"}, {"name": "value", "type": "uint256"}], "outputs": [{"name": "success", "type": "bool"}]},
    {"constant": false, "inputs": [{"components": [{"name": "x", "type": "uint256"}, {"name": "y", "type": "uint256"}], "name": "a", "type": "tuple"}], "name": "tuple", "outputs": [], "payable": false, "stateMutability": "nonpayable", "type": "function"},
    {"constant": false, "inputs": [{"components": [{"name": "x", "type": "uint256"}, {"name": "y", "type": "uint256"}], "name": "a", "type": "tuple[]"}], "name": "tupleSlice", "outputs": [], "payable": false, "stateMutability": "nonpayable", "type": "function"},
    {"constant": false, "inputs": [{"components": [{"name": "x", "type": "uint256"}, {"name": "y", "type": "uint256"}], "name": "a", "type": "tuple[5]"}], "name": "tupleArray", "outputs": [], "payable": false, "stateMutability": "nonpayable", "type": "function"},
    {"constant": false, "inputs": [{"components": [{"name": "x", "type": "uint256"}, {"name": "y", "type": "uint256"}], "name": "a", "type": "tuple[5][]"}], "name": "complexTuple", "outputs": [], "payable": false, "stateMutability": "nonpayable", "type": "function"},
    {"constant": true, "inputs": [], "name": "getReserves", "outputs": [{"name": "reserve0", "type": "uint112"}, {"name": "reserve1", "type": "uint112"}, {"name": "blockTimestampLast", "type": "uint32"}], "payable": false, "type": "function"},
    {"type": "event", "name": "Transfer", "anonymous": false, "inputs": [{"name": "from", "type": "address", "indexed": true}, {"name": "to", "type": "address", "indexed": true}, {"name": "value", "type": "uint256", "indexed": false}]},
    {"type": "event", "name": "Transfer", "anonymous": false, "inputs": [{"name": "from", "type": "address", "indexed": true}, {"name": "to", "type": "address", "indexed": true}, {"name": "value", "type": "uint256", "indexed": false}, {"name": "data", "type": "bytes", "indexed": false}]},
    {"type": "event", "name": "Sync", "anonymous": true, "inputs": [{"name": "reserve0", "type": "uint112", "indexed": false}, {"name": "reserve1", "type": "uint112", "indexed": false}]},
    {"stateMutability": "nonpayable", "type": "fallback"},
    {"stateMutability": "payable", "type": "receive"}
]"#;

/// Parses [`SAMPLE_ABI`].
///
/// # Panics
/// Panics if the fixture no longer parses.
pub fn sample_abi() -> Abi {
    Abi::from_json_str(SAMPLE_ABI).expect("sample interface should parse")
}

/// Parses a type string, panicking on fixture typos.
pub fn ty(text: &str) -> Type {
    Type::parse(text).unwrap_or_else(|err| panic!("bad fixture type {text:?}: {err}"))
}

/// Argument list from `(name, type)` pairs.
pub fn args(pairs: &[(&str, &str)]) -> Arguments {
    pairs.iter()
        .map(|(name, text)| Argument::new(*name, ty(text)))
        .collect()
}

/// Deterministic address whose last byte is `n`.
pub fn addr(n: u8) -> Address {
    Address::with_last_byte(n)
}

pub fn uint(n: u64) -> Value {
    Value::Uint(U256::from(n))
}

/// `(uint256,uint256)` tuple value.
pub fn pair(x: u64, y: u64) -> Value {
    Value::Tuple(vec![uint(x), uint(y)])
}

/// `(uint256,uint256)[5][]` value with `rows` outer elements, every tuple
/// holding distinct contents.
pub fn tuple_grid(rows: u64) -> Value {
    Value::Array(
        (0..rows)
            .map(|r| Value::Array((0..5).map(|c| pair(r * 10 + c, r * 1_000 + c * 7)).collect()))
            .collect(),
    )
}
