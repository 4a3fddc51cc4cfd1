//! abi-codec: type-directed encoding of contract call and log data.
//!
//! The [`Type`] tree classifies values as static or dynamic, [`Arguments`]
//! packs and unpacks ordered value lists with the head/tail layout, and
//! [`Value`] carries decoded data back to the caller.

pub mod arguments;
pub mod convert;
pub mod error;
pub mod packing;
pub mod types;
pub mod value;

pub use arguments::{Argument, ArgumentMarshaling, Arguments};
pub use convert::{AbiRecord, FromValue};
pub use error::{AbiError, Result};
pub use types::{TupleField, Type, TypeKind};
pub use value::Value;
