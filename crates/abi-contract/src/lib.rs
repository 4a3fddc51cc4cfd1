//! abi-contract: contract interface registry built on `abi-codec`.
//!
//! [`Abi`] ingests a JSON interface description and resolves functions and
//! events by name, selector or topic; [`unpack_revert`] decodes the
//! `Error(string)` payload of a reverted call.

pub mod abi;
pub mod event;
pub mod method;
pub mod revert;

pub use abi::{Abi, FieldDescriptor};
pub use event::Event;
pub use method::{FunctionKind, Method};
pub use revert::{revert_selector, unpack_revert, REVERT_SIGNATURE};

pub use abi_codec::{AbiError, Result, Value};
