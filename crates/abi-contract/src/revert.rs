//! Decoding of `Error(string)` revert payloads.

use abi_codec::{AbiError, Argument, Arguments, Result, Type, Value};
use alloy::primitives::{keccak256, Selector};

/// Signature Solidity encodes `require`/`revert` reasons with.
pub const REVERT_SIGNATURE: &str = "Error(string)";

/// `0x08c379a0`.
pub fn revert_selector() -> Selector {
    Selector::from_slice(&keccak256(REVERT_SIGNATURE.as_bytes())[..4])
}

/// Extracts the reason string from revert data.
///
/// # Errors
/// Returns [`AbiError::InvalidRevertData`] if `data` does not start with the
/// `Error(string)` selector, or [`AbiError::Decode`] if the remainder is not
/// a valid string encoding.
pub fn unpack_revert(data: &[u8]) -> Result<String> {
    let Some((prefix, body)) = data.split_first_chunk::<4>() else {
        return Err(AbiError::InvalidRevertData(format!(
            "{} bytes is too short for a selector",
            data.len()
        )));
    };
    if prefix != &revert_selector().0 {
        return Err(AbiError::InvalidRevertData(format!(
            "unexpected selector 0x{}",
            alloy::primitives::hex::encode(prefix)
        )));
    }

    let args: Arguments = vec![Argument::new("", Type::string())].into();
    match args.unpack(body)?.pop() {
        Some(Value::String(reason)) => Ok(reason),
        _ => Err(AbiError::Decode("revert reason is not a string".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::hex;

    fn revert_data(reason: &str) -> Vec<u8> {
        let args: Arguments = vec![Argument::new("", Type::string())].into();
        let mut data = revert_selector().to_vec();
        data.extend(args.pack(&[Value::from(reason)]).unwrap());
        data
    }

    #[test]
    fn selector_is_well_known() {
        assert_eq!(hex::encode(revert_selector()), "08c379a0");
    }

    #[test]
    fn decodes_reason() {
        assert_eq!(unpack_revert(&revert_data("out of gas")).unwrap(), "out of gas");
        assert_eq!(unpack_revert(&revert_data("")).unwrap(), "");
    }

    #[test]
    fn rejects_foreign_or_short_payloads() {
        let mut data = revert_data("nope");
        data[0] ^= 0xff;
        assert!(matches!(unpack_revert(&data), Err(AbiError::InvalidRevertData(_))));
        assert!(matches!(
            unpack_revert(&[0x08, 0xc3, 0x79]),
            Err(AbiError::InvalidRevertData(_))
        ));
    }

    #[test]
    fn truncated_reason_is_a_decode_error() {
        let data = revert_data("insufficient balance");
        assert!(matches!(
            unpack_revert(&data[..4 + 64]),
            Err(AbiError::Decode(_))
        ));
        assert!(matches!(unpack_revert(&data[..4]), Err(AbiError::Decode(_))));
    }
}
