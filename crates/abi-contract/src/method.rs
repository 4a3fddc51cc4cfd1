//! Callable entries of a contract interface.

use std::fmt;

use abi_codec::{AbiError, Argument, Arguments, Result, Type, TypeKind};
use alloy::primitives::{keccak256, Selector};

/// Which kind of callable an interface entry describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// Runs once at deployment; its inputs follow the creation code.
    Constructor,
    /// Runs when no function selector matches (and no receive applies).
    Fallback,
    /// Runs on plain value transfers with empty call data.
    Receive,
    /// A regular function addressed by its selector.
    Function,
}

/// A function, constructor, fallback or receive entry.
///
/// `name` is the key in the registry and carries a numeric suffix for
/// overloads (`foo`, `foo0`, ...); `raw_name` is the declared name and is
/// what the signature uses. Only [`FunctionKind::Function`] entries have a
/// signature and selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub raw_name: String,
    pub kind: FunctionKind,
    /// `pure`, `view`, `nonpayable` or `payable`; empty for legacy schemas.
    pub state_mutability: String,
    /// Legacy `constant` flag from pre-0.6 compilers.
    pub constant: bool,
    /// Legacy `payable` flag from pre-0.6 compilers.
    pub payable: bool,
    pub inputs: Arguments,
    pub outputs: Arguments,
    /// e.g. `transfer(address,uint256)`; empty unless `kind` is `Function`.
    pub signature: String,
    /// First four bytes of the signature hash.
    pub selector: Option<Selector>,
    rendered: String,
}

impl Method {
    /// Builds a method and precomputes its signature, selector and
    /// human-readable form.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        raw_name: impl Into<String>,
        kind: FunctionKind,
        state_mutability: impl Into<String>,
        constant: bool,
        payable: bool,
        inputs: Arguments,
        outputs: Arguments,
    ) -> Self {
        let raw_name = raw_name.into();
        let state_mutability = state_mutability.into();

        let (signature, selector) = if kind == FunctionKind::Function {
            let signature = format!("{}({})", raw_name, inputs.canonical_types().join(","));
            let selector = Selector::from_slice(&keccak256(signature.as_bytes())[..4]);
            (signature, Some(selector))
        } else {
            (String::new(), None)
        };

        let rendered = render(&raw_name, kind, &state_mutability, &inputs, &outputs);

        Self {
            name: name.into(),
            raw_name,
            kind,
            state_mutability,
            constant,
            payable,
            inputs,
            outputs,
            signature,
            selector,
            rendered,
        }
    }

    /// The constructor of an interface that declares none.
    pub fn empty_constructor() -> Self {
        Self::new(
            "",
            "",
            FunctionKind::Constructor,
            "",
            false,
            false,
            Arguments::new(),
            Arguments::new(),
        )
    }

    /// Parses a human-readable signature such as
    /// `transfer(address to, uint256 amount)` into a nonpayable function.
    ///
    /// # Errors
    /// Returns [`AbiError::Type`] if the text is not `name(params)` or a
    /// parameter type is invalid.
    pub fn from_signature(text: &str) -> Result<Self> {
        let text = text.trim();
        let text = text.strip_prefix("function ").unwrap_or(text).trim_start();
        let open = text
            .find('(')
            .ok_or_else(|| AbiError::Type(format!("signature {text:?} has no parameter list")))?;
        let name = text[..open].trim();
        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
            return Err(AbiError::Type(format!("invalid function name {name:?}")));
        }

        // Reuse the tuple grammar for the parameter list.
        let params = text[open..].trim_end();
        let empty = params
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .is_some_and(|inner| inner.trim().is_empty());
        let inputs: Arguments = if empty {
            Arguments::new()
        } else {
            match Type::parse(params)?.kind() {
                TypeKind::Tuple(fields) => fields
                    .iter()
                    .map(|field| Argument::new(field.name.clone(), field.ty.clone()))
                    .collect(),
                _ => {
                    return Err(AbiError::Type(format!(
                        "signature {text:?} has trailing array suffix"
                    )))
                }
            }
        };

        Ok(Self::new(
            name,
            name,
            FunctionKind::Function,
            "nonpayable",
            false,
            false,
            inputs,
            Arguments::new(),
        ))
    }

    /// Whether calling the method cannot change state (`view`/`pure`, or the
    /// legacy `constant` flag).
    pub fn is_constant(&self) -> bool {
        self.state_mutability == "view" || self.state_mutability == "pure" || self.constant
    }

    /// Whether the method accepts value (`payable`, or the legacy flag).
    pub fn is_payable(&self) -> bool {
        self.state_mutability == "payable" || self.payable
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

/// `function transfer(address to, uint256 value) returns(bool success)`.
/// The default mutability (`nonpayable` or empty) is left out.
fn render(
    raw_name: &str,
    kind: FunctionKind,
    state_mutability: &str,
    inputs: &Arguments,
    outputs: &Arguments,
) -> String {
    let identity = match kind {
        FunctionKind::Function => format!("function {raw_name}"),
        FunctionKind::Fallback => "fallback".to_string(),
        FunctionKind::Receive => "receive".to_string(),
        FunctionKind::Constructor => "constructor".to_string(),
    };
    let state = match state_mutability {
        "" | "nonpayable" => String::new(),
        other => format!("{other} "),
    };
    format!(
        "{identity}({}) {state}returns({})",
        join_params(inputs),
        join_params(outputs)
    )
}

pub(crate) fn join_params(args: &Arguments) -> String {
    args.iter()
        .map(|arg| {
            if arg.name.is_empty() {
                arg.ty.to_string()
            } else {
                format!("{} {}", arg.ty, arg.name)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::hex;

    fn args(pairs: &[(&str, &str)]) -> Arguments {
        pairs.iter()
            .map(|(name, ty)| Argument::new(*name, Type::parse(ty).unwrap()))
            .collect()
    }

    #[test]
    fn selector_ignores_argument_names() {
        let named = Method::new(
            "transfer",
            "transfer",
            FunctionKind::Function,
            "nonpayable",
            false,
            false,
            args(&[("from", "address"), ("to", "address"), ("value", "uint256")]),
            Arguments::new(),
        );
        let unnamed = Method::from_signature("transfer(address,address,uint)").unwrap();

        assert_eq!(named.signature, "transfer(address,address,uint256)");
        assert_eq!(unnamed.signature, named.signature);
        assert_eq!(named.selector, unnamed.selector);
    }

    #[test]
    fn known_selectors() {
        let transfer = Method::from_signature("transfer(address to, uint256 amount)").unwrap();
        assert_eq!(
            hex::encode(transfer.selector.unwrap()),
            "a9059cbb"
        );

        let swap = Method::from_signature(
            "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)",
        )
        .unwrap();
        assert_eq!(hex::encode(swap.selector.unwrap()), "38ed1739");
    }

    #[test]
    fn special_kinds_have_no_signature() {
        for kind in [
            FunctionKind::Constructor,
            FunctionKind::Fallback,
            FunctionKind::Receive,
        ] {
            let method = Method::new(
                "",
                "",
                kind,
                "payable",
                false,
                false,
                Arguments::new(),
                Arguments::new(),
            );
            assert!(method.signature.is_empty());
            assert!(method.selector.is_none());
        }
    }

    #[test]
    fn renders_human_readable_form() {
        let balance = Method::new(
            "balance",
            "balance",
            FunctionKind::Function,
            "view",
            false,
            false,
            Arguments::new(),
            Arguments::new(),
        );
        assert_eq!(balance.to_string(), "function balance() view returns()");

        let receive = Method::new(
            "",
            "",
            FunctionKind::Receive,
            "payable",
            false,
            false,
            Arguments::new(),
            Arguments::new(),
        );
        assert_eq!(receive.to_string(), "receive() payable returns()");

        let transfer = Method::new(
            "transfer",
            "transfer",
            FunctionKind::Function,
            "nonpayable",
            false,
            false,
            args(&[("from", "address"), ("to", "address"), ("value", "uint256")]),
            args(&[("success", "bool"), ("", "uint256")]),
        );
        assert_eq!(
            transfer.to_string(),
            "function transfer(address from, address to, uint256 value) returns(bool success, uint256)"
        );
    }

    #[test]
    fn mutability_helpers_honor_legacy_flags() {
        let legacy = Method::new(
            "get",
            "get",
            FunctionKind::Function,
            "",
            true,
            false,
            Arguments::new(),
            Arguments::new(),
        );
        assert!(legacy.is_constant());
        assert!(!legacy.is_payable());

        let deposit = Method::from_signature("deposit()").unwrap();
        assert!(!deposit.is_constant());
        assert!(!deposit.is_payable());
    }

    #[test]
    fn rejects_malformed_signatures() {
        assert!(Method::from_signature("transfer").is_err());
        assert!(Method::from_signature("(uint256)").is_err());
        assert!(Method::from_signature("f(uint256)[]").is_err());
        assert!(Method::from_signature("f(uint7)").is_err());
    }
}
