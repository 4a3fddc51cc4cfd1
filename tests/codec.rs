//! Integration tests for type classification and head/tail round trips.

mod common;

use abi_codec::{AbiError, Value};
use alloy::primitives::{FixedBytes, I256, U256};
use common::{addr, args, pair, tuple_grid, ty, uint};

#[test]
fn static_and_dynamic_classification() {
    assert!(!ty("uint256[3]").is_dynamic());
    assert!(ty("string[3]").is_dynamic());
    assert!(ty("(uint256,string)").is_dynamic());
    assert!(!ty("(uint256,bool)").is_dynamic());
    assert!(ty("(uint256,bool)[]").is_dynamic());
    assert!(!ty("(uint256,(bool,address)[2])[3]").is_dynamic());

    assert_eq!(ty("uint256[3]").head_size(), 96);
    assert_eq!(ty("string[3]").head_size(), 32);
    assert_eq!(ty("(uint256,(bool,address)[2])").head_size(), 5 * 32);
}

#[test]
fn canonical_names_normalize_aliases() {
    assert_eq!(ty("uint").canonical(), "uint256");
    assert_eq!(ty("int[2][]").canonical(), "int256[2][]");
    assert_eq!(
        ty("(uint a, (bool, string)[] b)").canonical(),
        "(uint256,(bool,string)[])"
    );
}

/// Every elementary kind survives pack then unpack unchanged.
#[test]
fn elementary_round_trip() {
    let list = args(&[
        ("u8", "uint8"),
        ("u256", "uint256"),
        ("i24", "int24"),
        ("i256", "int256"),
        ("flag", "bool"),
        ("who", "address"),
        ("tag", "bytes4"),
        ("word", "bytes32"),
        ("blob", "bytes"),
        ("text", "string"),
        ("callback", "function"),
    ]);
    let values = vec![
        uint(255),
        Value::Uint(U256::MAX),
        Value::Int(I256::from_dec_str("-8388608").unwrap()),
        Value::Int(I256::MIN),
        Value::Bool(true),
        Value::Address(addr(0x42)),
        Value::FixedBytes(vec![0xde, 0xad, 0xbe, 0xef]),
        Value::FixedBytes(vec![0x11; 32]),
        Value::Bytes((0u8..=70).collect()),
        Value::from("héllo, wörld"),
        Value::Function(FixedBytes::repeat_byte(0x07)),
    ];

    let packed = list.pack(&values).unwrap();
    assert_eq!(packed.len() % 32, 0);
    assert_eq!(list.unpack(&packed).unwrap(), values);
}

#[test]
fn empty_dynamic_values_round_trip() {
    let list = args(&[("blob", "bytes"), ("text", "string"), ("items", "uint256[]")]);
    let values = vec![
        Value::Bytes(Vec::new()),
        Value::from(""),
        Value::Array(Vec::new()),
    ];

    let packed = list.pack(&values).unwrap();
    // Three offsets, then three zero length words.
    assert_eq!(packed.len(), 6 * 32);
    assert_eq!(list.unpack(&packed).unwrap(), values);
}

#[test]
fn nested_tuple_array_round_trip() {
    let list = args(&[("grid", "(uint256,uint256)[5][]")]);
    for rows in [0, 1, 3] {
        let values = vec![tuple_grid(rows)];
        let packed = list.pack(&values).unwrap();
        // Offset word, count word, then ten static words per row.
        assert_eq!(packed.len(), 64 + rows as usize * 10 * 32);
        assert_eq!(list.unpack(&packed).unwrap(), values);
    }
}

#[test]
fn dynamic_tuples_inside_arrays_round_trip() {
    let list = args(&[
        ("id", "uint64"),
        ("orders", "(address maker,string note,uint256[] amounts)[]"),
        ("fixed", "string[2]"),
    ]);
    let order = |n: u8, note: &str, amounts: &[u64]| {
        Value::Tuple(vec![
            Value::Address(addr(n)),
            Value::from(note),
            Value::Array(amounts.iter().map(|a| uint(*a)).collect()),
        ])
    };
    let values = vec![
        uint(7),
        Value::Array(vec![
            order(1, "first", &[1, 2, 3]),
            order(2, "", &[]),
            order(3, "a longer note that spans more than one word", &[u64::MAX]),
        ]),
        Value::Array(vec![Value::from("left"), Value::from("right")]),
    ];

    let packed = list.pack(&values).unwrap();
    assert_eq!(list.unpack(&packed).unwrap(), values);
}

#[test]
fn pack_rejects_shape_mismatches() {
    let list = args(&[("grid", "(uint256,uint256)[5][]")]);
    let short_row = Value::Array(vec![Value::Array(vec![pair(1, 2)])]);
    assert!(matches!(
        list.pack(&[short_row]),
        Err(AbiError::TypeMismatch { .. })
    ));

    let list = args(&[("small", "int8")]);
    assert!(matches!(
        list.pack(&[uint(128)]),
        Err(AbiError::TypeMismatch { .. })
    ));
    assert!(list.pack(&[uint(127)]).is_ok());
}

#[test]
fn truncated_data_never_panics() {
    let list = args(&[
        ("grid", "(uint256,uint256)[5][]"),
        ("text", "string"),
    ]);
    let packed = list
        .pack(&[tuple_grid(2), Value::from("trailing string")])
        .unwrap();

    for cut in (0..packed.len()).step_by(32) {
        assert!(
            matches!(list.unpack(&packed[..cut]), Err(AbiError::Decode(_))),
            "cut at {cut} should fail"
        );
    }
}

#[test]
fn json_input_coerces_into_values() {
    let grid_type = ty("(uint256 x,uint256 y)[2]");
    let json = serde_json::json!([{"x": 1, "y": "2"}, ["0x03", 4]]);
    let value = Value::from_json(&grid_type, &json).unwrap();
    assert_eq!(value, Value::Array(vec![pair(1, 2), pair(3, 4)]));

    let rendered = value.to_json();
    assert_eq!(rendered, serde_json::json!([["1", "2"], ["3", "4"]]));

    assert!(Value::from_json(&ty("bool"), &serde_json::json!("yes")).is_err());
}
