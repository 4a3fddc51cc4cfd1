//! The contract interface registry.
//!
//! An [`Abi`] is built once from a JSON interface description and is then
//! read-only: every lookup, pack and unpack takes `&self`, so a registry can
//! be shared freely across threads.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use abi_codec::{AbiError, AbiRecord, Argument, ArgumentMarshaling, Arguments, Result, Value};
use alloy::primitives::{hex, B256};
use serde::Deserialize;

use crate::event::Event;
use crate::method::{FunctionKind, Method};

/// One entry of a JSON interface description.
///
/// Legacy `constant`/`payable` flags are kept alongside `stateMutability`
/// so schemas from pre-0.6 compilers still classify correctly.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<ArgumentMarshaling>,
    #[serde(default)]
    pub outputs: Vec<ArgumentMarshaling>,
    #[serde(default)]
    pub state_mutability: String,
    #[serde(default)]
    pub constant: bool,
    #[serde(default)]
    pub payable: bool,
    #[serde(default)]
    pub anonymous: bool,
}

/// A parsed contract interface.
///
/// Overloaded functions and events are keyed `name`, `name0`, `name1`, ...
/// in declaration order; their signatures keep the declared name.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<FieldDescriptor>")]
pub struct Abi {
    pub constructor: Method,
    pub methods: BTreeMap<String, Method>,
    pub events: BTreeMap<String, Event>,
    pub fallback: Option<Method>,
    pub receive: Option<Method>,
}

impl Default for Abi {
    fn default() -> Self {
        Self {
            constructor: Method::empty_constructor(),
            methods: BTreeMap::new(),
            events: BTreeMap::new(),
            fallback: None,
            receive: None,
        }
    }
}

impl TryFrom<Vec<FieldDescriptor>> for Abi {
    type Error = AbiError;

    fn try_from(fields: Vec<FieldDescriptor>) -> Result<Self> {
        Self::from_fields(fields)
    }
}

fn arguments(raw: Vec<ArgumentMarshaling>) -> Result<Arguments> {
    raw.into_iter().map(Argument::try_from).collect()
}

/// First free key among `raw`, `raw0`, `raw1`, ...
fn overloaded_name<V>(table: &BTreeMap<String, V>, raw: &str) -> String {
    if !table.contains_key(raw) {
        return raw.to_string();
    }
    (0usize..)
        .map(|idx| format!("{raw}{idx}"))
        .find(|name| !table.contains_key(name))
        .unwrap_or_else(|| raw.to_string())
}

impl Abi {
    /// Builds a registry from schema entries, in declaration order.
    ///
    /// A later constructor entry replaces an earlier one.
    ///
    /// # Errors
    /// - [`AbiError::UnknownFieldType`] for an unrecognized `type` keyword
    /// - [`AbiError::DuplicateDefinition`] for a second fallback or receive
    /// - [`AbiError::InvalidMutability`] for a receive that is not payable
    /// - [`AbiError::Type`] for an invalid argument type
    #[tracing::instrument(skip_all, fields(entries = fields.len()))]
    pub fn from_fields(fields: Vec<FieldDescriptor>) -> Result<Self> {
        let mut abi = Self::default();
        let mut has_constructor = false;

        for field in fields {
            match field.kind.as_str() {
                "constructor" => {
                    if has_constructor {
                        tracing::debug!("replacing previously declared constructor");
                    }
                    has_constructor = true;
                    abi.constructor = Method::new(
                        "",
                        "",
                        FunctionKind::Constructor,
                        field.state_mutability,
                        field.constant,
                        field.payable,
                        arguments(field.inputs)?,
                        Arguments::new(),
                    );
                }
                "function" => {
                    let name = overloaded_name(&abi.methods, &field.name);
                    if name != field.name {
                        tracing::debug!(raw = %field.name, key = %name, "renamed overloaded function");
                    }
                    let method = Method::new(
                        name.clone(),
                        field.name,
                        FunctionKind::Function,
                        field.state_mutability,
                        field.constant,
                        field.payable,
                        arguments(field.inputs)?,
                        arguments(field.outputs)?,
                    );
                    abi.methods.insert(name, method);
                }
                "fallback" => {
                    if abi.has_fallback() {
                        return Err(AbiError::DuplicateDefinition("fallback"));
                    }
                    abi.fallback = Some(Method::new(
                        "",
                        "",
                        FunctionKind::Fallback,
                        field.state_mutability,
                        field.constant,
                        field.payable,
                        Arguments::new(),
                        Arguments::new(),
                    ));
                }
                "receive" => {
                    if abi.has_receive() {
                        return Err(AbiError::DuplicateDefinition("receive"));
                    }
                    if field.state_mutability != "payable" {
                        return Err(AbiError::InvalidMutability(field.state_mutability));
                    }
                    abi.receive = Some(Method::new(
                        "",
                        "",
                        FunctionKind::Receive,
                        field.state_mutability,
                        field.constant,
                        field.payable,
                        Arguments::new(),
                        Arguments::new(),
                    ));
                }
                "event" => {
                    let name = overloaded_name(&abi.events, &field.name);
                    if name != field.name {
                        tracing::debug!(raw = %field.name, key = %name, "renamed overloaded event");
                    }
                    let event = Event::new(
                        name.clone(),
                        field.name,
                        field.anonymous,
                        arguments(field.inputs)?,
                    );
                    abi.events.insert(name, event);
                }
                _ => {
                    return Err(AbiError::UnknownFieldType {
                        kind: field.kind,
                        name: field.name,
                    })
                }
            }
        }

        tracing::debug!(
            functions = abi.methods.len(),
            events = abi.events.len(),
            fallback = abi.has_fallback(),
            receive = abi.has_receive(),
            "loaded contract interface"
        );
        Ok(abi)
    }

    /// Parses a JSON array of interface entries.
    ///
    /// # Errors
    /// Returns [`AbiError::Json`] for malformed JSON, otherwise the errors of
    /// [`Abi::from_fields`].
    pub fn from_json_str(text: &str) -> Result<Self> {
        let fields: Vec<FieldDescriptor> = serde_json::from_str(text)?;
        Self::from_fields(fields)
    }

    /// Reads a JSON interface description from `reader`.
    ///
    /// # Errors
    /// Same as [`Abi::from_json_str`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let fields: Vec<FieldDescriptor> = serde_json::from_reader(reader)?;
        Self::from_fields(fields)
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn has_receive(&self) -> bool {
        self.receive.is_some()
    }

    /// Function by registry key (`foo`, `foo0`, ...).
    ///
    /// # Errors
    /// Returns [`AbiError::NotFound`] if there is no such function.
    pub fn method(&self, name: &str) -> Result<&Method> {
        self.methods
            .get(name)
            .ok_or_else(|| AbiError::NotFound(format!("method {name:?}")))
    }

    /// Event by registry key.
    ///
    /// # Errors
    /// Returns [`AbiError::NotFound`] if there is no such event.
    pub fn event(&self, name: &str) -> Result<&Event> {
        self.events
            .get(name)
            .ok_or_else(|| AbiError::NotFound(format!("event {name:?}")))
    }

    /// Function whose selector matches the first four bytes of `data`.
    ///
    /// # Errors
    /// Returns [`AbiError::NotFound`] if `data` is shorter than a selector or
    /// no function matches.
    pub fn method_by_selector(&self, data: &[u8]) -> Result<&Method> {
        let Some(prefix) = data.get(..4) else {
            return Err(AbiError::NotFound(format!(
                "method for {} bytes of call data (need at least 4)",
                data.len()
            )));
        };
        self.methods
            .values()
            .find(|method| method.selector.is_some_and(|sel| sel.as_slice() == prefix))
            .ok_or_else(|| {
                AbiError::NotFound(format!("method with selector 0x{}", hex::encode(prefix)))
            })
    }

    /// Event whose id equals `topic`. Anonymous events never match.
    ///
    /// # Errors
    /// Returns [`AbiError::NotFound`] if no event matches.
    pub fn event_by_topic(&self, topic: &B256) -> Result<&Event> {
        self.events
            .values()
            .find(|event| event.id.as_ref() == Some(topic))
            .ok_or_else(|| AbiError::NotFound(format!("event with id {topic}")))
    }

    /// Encodes call data for `name`: selector followed by packed inputs.
    /// An empty name packs constructor arguments without a selector.
    ///
    /// # Errors
    /// Returns [`AbiError::NotFound`] for an unknown function, or the errors
    /// of [`Arguments::pack`].
    pub fn pack(&self, name: &str, values: &[Value]) -> Result<Vec<u8>> {
        if name.is_empty() {
            return self.constructor.inputs.pack(values);
        }
        let method = self.method(name)?;
        let packed = method.inputs.pack(values)?;
        let mut data = Vec::with_capacity(4 + packed.len());
        if let Some(selector) = method.selector {
            data.extend_from_slice(selector.as_slice());
        }
        data.extend_from_slice(&packed);
        Ok(data)
    }

    /// Arguments that `data` for `name` is laid out by: a function's outputs
    /// or an event's inputs. An event shares no key space with functions in
    /// Solidity; if both exist the event wins.
    fn arguments_for(&self, name: &str, data: &[u8]) -> Result<&Arguments> {
        let mut args = None;
        if let Some(method) = self.methods.get(name) {
            if data.len() % 32 != 0 {
                return Err(AbiError::Decode(format!(
                    "improperly formatted output of {name}: {} bytes",
                    data.len()
                )));
            }
            args = Some(&method.outputs);
        }
        if let Some(event) = self.events.get(name) {
            args = Some(&event.inputs);
        }
        args.ok_or_else(|| AbiError::MissingMethodOrEvent(name.to_string()))
    }

    /// Decodes the return data of function `name`, or the log data of event
    /// `name`.
    ///
    /// # Errors
    /// Returns [`AbiError::MissingMethodOrEvent`] if `name` is neither, or
    /// [`AbiError::Decode`] for malformed data.
    pub fn unpack(&self, name: &str, data: &[u8]) -> Result<Vec<Value>> {
        self.arguments_for(name, data)?.unpack(data)
    }

    /// Decodes like [`Abi::unpack`] and assigns the values into `dst` by
    /// argument name. `dst` keeps its previous contents on any error.
    ///
    /// # Errors
    /// Errors of [`Abi::unpack`] and [`Arguments::copy`].
    pub fn unpack_into<D: AbiRecord + Clone>(&self, dst: &mut D, name: &str, data: &[u8]) -> Result<()> {
        let args = self.arguments_for(name, data)?;
        let values = args.unpack(data)?;
        args.copy(dst, values)
    }

    /// Decodes like [`Abi::unpack`] into a name → value map.
    ///
    /// # Errors
    /// Errors of [`Abi::unpack`].
    pub fn unpack_into_map(
        &self,
        map: &mut HashMap<String, Value>,
        name: &str,
        data: &[u8],
    ) -> Result<()> {
        self.arguments_for(name, data)?.unpack_into_map(map, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, U256};

    const TOKEN: &str = r#"[
        {"type":"constructor","inputs":[{"name":"supply","type":"uint256"}],"stateMutability":"nonpayable"},
        {"type":"function","name":"balanceOf","inputs":[{"name":"owner","type":"address"}],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"},
        {"type":"function","name":"transfer","inputs":[{"name":"to","type":"address"},{"name":"value","type":"uint256"}],"outputs":[{"name":"","type":"bool"}],"stateMutability":"nonpayable"},
        {"type":"event","name":"Transfer","anonymous":false,"inputs":[{"name":"from","type":"address","indexed":true},{"name":"to","type":"address","indexed":true},{"name":"value","type":"uint256","indexed":false}]}
    ]"#;

    #[test]
    fn ingests_a_token_interface() {
        let abi = Abi::from_json_str(TOKEN).unwrap();
        assert_eq!(abi.methods.len(), 2);
        assert_eq!(abi.events.len(), 1);
        assert_eq!(abi.constructor.inputs.len(), 1);
        assert!(!abi.has_fallback());
        assert!(!abi.has_receive());
        assert!(abi.method("balanceOf").unwrap().is_constant());
    }

    #[test]
    fn pack_prefixes_the_selector() {
        let abi = Abi::from_json_str(TOKEN).unwrap();
        let data = abi
            .pack("transfer", &[Value::Address(Address::ZERO), Value::from(1u64)])
            .unwrap();
        assert_eq!(data.len(), 4 + 64);
        assert_eq!(hex::encode(&data[..4]), "a9059cbb");

        let ctor = abi.pack("", &[Value::from(1u64)]).unwrap();
        assert_eq!(ctor.len(), 32);

        assert!(matches!(abi.pack("mint", &[]), Err(AbiError::NotFound(_))));
    }

    #[test]
    fn unpack_routes_outputs_and_log_data() {
        let abi = Abi::from_json_str(TOKEN).unwrap();
        let word = U256::from(7).to_be_bytes::<32>();
        assert_eq!(abi.unpack("balanceOf", &word).unwrap(), vec![Value::from(7u64)]);
        assert_eq!(abi.unpack("Transfer", &word).unwrap(), vec![Value::from(7u64)]);

        assert!(matches!(
            abi.unpack("balanceOf", &word[..31]),
            Err(AbiError::Decode(_))
        ));
        assert!(matches!(
            abi.unpack("approve", &word),
            Err(AbiError::MissingMethodOrEvent(_))
        ));
    }

    #[test]
    fn rejects_unknown_entry_kinds() {
        let err = Abi::from_json_str(r#"[{"type":"modifier","name":"onlyOwner"}]"#).unwrap_err();
        assert!(matches!(err, AbiError::UnknownFieldType { .. }));

        let err = Abi::from_json_str(r#"[{"name":"untyped"}]"#).unwrap_err();
        assert!(matches!(err, AbiError::UnknownFieldType { .. }));
    }

    #[test]
    fn argument_type_errors_are_not_json_errors() {
        let err = Abi::from_json_str(
            r#"[{"type":"function","name":"f","inputs":[{"name":"a","type":"uint7"}]}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, AbiError::Type(_)));
    }

    #[test]
    fn deserializes_through_serde() {
        let abi: Abi = serde_json::from_str(TOKEN).unwrap();
        assert!(abi.event("Transfer").is_ok());
    }
}
