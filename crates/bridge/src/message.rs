//! The generic exchange container the bridge reads requests from and writes
//! responses into.
//!
//! An [`Exchange`] holds an inbound [`Message`] and, once an invocation has
//! completed on an out-capable exchange, an outbound one. Request metadata
//! (HTTP method, path, operation name, …) is carried in the typed
//! [`InvocationMetadata`] rather than in string-keyed headers, so the bridge
//! never has to guess the type of a metadata value.

use std::collections::BTreeMap;

use crate::{Address, Body, EndpointUri, ExchangeId, OperationName, ResponseClass, ValueType};

/// Plain message headers: name → value, names compared exactly.
pub type Headers = BTreeMap<String, String>;

/// Whether the producer of an exchange expects a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangePattern {
    /// Fire and forget; the outbound message is never populated.
    InOnly,
    /// Request/reply.
    #[default]
    InOut,
}

impl ExchangePattern {
    pub fn is_out_capable(self) -> bool {
        matches!(self, Self::InOut)
    }
}

// ---------------------------------------------------------------------------

/// Request metadata consumed by the invocation engine.
///
/// Every field is optional; absent values fall back to the endpoint
/// configuration or fail validation in the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvocationMetadata {
    /// Overrides the endpoint's `http_client_api` mode selection.
    pub use_http_api: Option<bool>,
    /// Overrides the endpoint's configured destination address.
    pub address_override: Option<Address>,
    /// HTTP verb for direct mode (e.g. `"GET"`).
    pub http_method: Option<String>,
    /// Path appended to the destination address in direct mode.
    pub http_path: Option<String>,
    /// Raw query string (`a=1&b=2`), percent-encoded.
    pub http_query: Option<String>,
    /// Explicit query parameters; take priority over `http_query`.
    pub query_map: Option<BTreeMap<String, String>>,
    /// Character encoding used to percent-decode `http_query`. Defaults to UTF-8.
    pub charset: Option<String>,
    /// Requested response typing in direct mode.
    pub response_class: Option<ResponseClass>,
    /// Element type for a [`ResponseClass::Collection`] response.
    pub response_element_type: Option<ValueType>,
    /// Values for the resource interface's path template variables (proxy mode).
    pub path_values: Option<Vec<String>>,
    /// Operation to invoke in proxy mode.
    pub operation_name: Option<OperationName>,
}

// ---------------------------------------------------------------------------

/// One message of an exchange.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    pub headers: Headers,
    pub body: Body,
    pub metadata: InvocationMetadata,
    /// HTTP status of the response this message was populated from.
    pub response_code: Option<u16>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: InvocationMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

// ---------------------------------------------------------------------------

/// A request/response unit of work.
#[derive(Debug, Clone)]
pub struct Exchange {
    id: ExchangeId,
    pattern: ExchangePattern,
    from_endpoint: EndpointUri,
    in_message: Message,
    out_message: Option<Message>,
}

impl Exchange {
    /// Creates an in-out exchange carrying `in_message`.
    pub fn new(from_endpoint: EndpointUri, in_message: Message) -> Self {
        Self {
            id: ExchangeId::new_random(),
            pattern: ExchangePattern::InOut,
            from_endpoint,
            in_message,
            out_message: None,
        }
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: ExchangePattern) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn id(&self) -> ExchangeId {
        self.id
    }

    pub fn pattern(&self) -> ExchangePattern {
        self.pattern
    }

    /// URI of the endpoint that produced this exchange.
    pub fn from_endpoint(&self) -> &EndpointUri {
        &self.from_endpoint
    }

    pub fn in_message(&self) -> &Message {
        &self.in_message
    }

    pub fn in_message_mut(&mut self) -> &mut Message {
        &mut self.in_message
    }

    pub fn out_message(&self) -> Option<&Message> {
        self.out_message.as_ref()
    }

    pub fn set_out_message(&mut self, message: Message) {
        self.out_message = Some(message);
    }
}
