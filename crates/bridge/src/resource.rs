//! Resource interfaces and proxy-mode method resolution.
//!
//! A [`ResourceInterface`] describes a RESTful resource the way a typed client
//! would see it: a base path template plus a set of [`ResourceMethod`]s, each
//! mapping typed parameters onto parts of an HTTP request.
//!
//! [`ResourceRegistry`] is built once per interface set and resolves an
//! operation name plus the runtime types of the supplied arguments to a
//! method. Interfaces are scanned in their declared order and the first
//! interface declaring an exact match wins.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{BridgeError, InterfaceName, OperationName, ResponseType, TypedValue, ValueType};

// ---------------------------------------------------------------------------
// Interface model
// ---------------------------------------------------------------------------

/// Where a method parameter is placed in the outgoing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamSource {
    /// Substituted into the `{name}` variable of the method path.
    Path(String),
    /// Sent as query parameter `name`.
    Query(String),
    /// Sent as request header `name`.
    Header(String),
    /// Sent as the request entity.
    Body,
}

/// One declared parameter of a [`ResourceMethod`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(rename = "type")]
    pub ty: ValueType,
    pub source: ParamSource,
}

impl ParamSpec {
    pub fn new(ty: ValueType, source: ParamSource) -> Self {
        Self { ty, source }
    }
}

/// An operation exposed by a resource interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMethod {
    pub name: OperationName,
    /// HTTP verb the operation is sent with.
    pub http_method: String,
    /// Path relative to the interface path; may contain `{var}` placeholders.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
    #[serde(default)]
    pub returns: ResponseType,
}

impl ResourceMethod {
    /// Returns the parameter-type signature of this method.
    pub fn signature(&self) -> Vec<ValueType> {
        self.params.iter().map(|p| p.ty).collect()
    }
}

/// A RESTful resource interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInterface {
    pub name: InterfaceName,
    /// Path appended to the destination address; may contain `{var}`
    /// placeholders filled from the message's path-template values.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub methods: Vec<ResourceMethod>,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// A method resolved by [`ResourceRegistry::resolve`], together with the
/// interface that declared it.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedMethod<'a> {
    pub interface: &'a ResourceInterface,
    pub method: &'a ResourceMethod,
}

type Signature = (OperationName, Vec<ValueType>);

/// Operation lookup table over an ordered set of resource interfaces.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    interfaces: Vec<ResourceInterface>,
    /// One index per interface, parallel to `interfaces`.
    index: Vec<HashMap<Signature, usize>>,
}

impl ResourceRegistry {
    /// Builds the lookup table. Within one interface, the first method
    /// declared with a given signature shadows later duplicates.
    pub fn new(interfaces: Vec<ResourceInterface>) -> Self {
        let index = interfaces
            .iter()
            .map(|interface| {
                let mut by_signature = HashMap::new();
                for (i, method) in interface.methods.iter().enumerate() {
                    by_signature
                        .entry((method.name.clone(), method.signature()))
                        .or_insert(i);
                }
                by_signature
            })
            .collect();
        Self { interfaces, index }
    }

    pub fn interfaces(&self) -> &[ResourceInterface] {
        &self.interfaces
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    /// Finds the method named `operation` whose parameter types exactly equal
    /// the runtime types of `arguments`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MethodResolution`] if no interface declares a
    /// matching method.
    pub fn resolve(
        &self,
        operation: &OperationName,
        arguments: &[TypedValue],
    ) -> Result<ResolvedMethod<'_>, BridgeError> {
        let key = (
            operation.clone(),
            arguments.iter().map(TypedValue::value_type).collect::<Vec<_>>(),
        );
        self.interfaces
            .iter()
            .zip(&self.index)
            .find_map(|(interface, by_signature)| {
                by_signature.get(&key).map(|&i| ResolvedMethod {
                    interface,
                    method: &interface.methods[i],
                })
            })
            .ok_or_else(|| BridgeError::MethodResolution {
                operation: operation.to_string(),
                argument_types: render_types(&key.1),
            })
    }
}

fn render_types(types: &[ValueType]) -> String {
    let names: Vec<String> = types.iter().map(ToString::to_string).collect();
    format!("[{}]", names.join(","))
}
