//! Port traits: the collaborators the bridge consumes but does not implement.
//!
//! | Trait | Supplied by |
//! |-------|-------------|
//! | [`ConfigurationFactory`] / [`ClientConfiguration`] | transport adapter (`http-transport`) |
//! | [`MessageBinding`] | [`crate::DefaultBinding`] or an application binding |
//! | [`TypeConverter`] | [`crate::DefaultTypeConverter`] or an application converter |

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    Address, BridgeError, Body, Headers, HttpResponse, Message, ResourceRegistry, ResponseValue,
    TypedValue, ValueType,
};

// ---------------------------------------------------------------------------
// Outgoing request
// ---------------------------------------------------------------------------

/// One outgoing HTTP call, built fresh per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub method: http::Method,
    /// Resource root the path is appended to. Usually the configuration's
    /// address; in proxy mode it already includes the interface path.
    pub base: String,
    /// Path appended to `base`, if any.
    pub path: Option<String>,
    /// Query parameters; one value per name.
    pub query: BTreeMap<String, String>,
    pub headers: Headers,
    /// Request entity. Always `None` for GET.
    pub body: Option<Vec<u8>>,
}

impl InvocationRequest {
    pub fn new(method: http::Method, base: impl Into<String>) -> Self {
        Self {
            method,
            base: base.into(),
            path: None,
            query: BTreeMap::new(),
            headers: Headers::new(),
            body: None,
        }
    }

    /// `base` with `path` appended, without query.
    pub fn target(&self) -> String {
        match &self.path {
            Some(path) => join_path(&self.base, path),
            None => self.base.clone(),
        }
    }
}

/// Appends `path` to `base` with exactly one `/` between them.
pub fn join_path(base: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path)
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Everything needed to reach one destination address.
///
/// Possibly expensive to build; shared between the
/// [`crate::ClientConfigCache`] and in-flight calls.
#[async_trait]
pub trait ClientConfiguration: Send + Sync + std::fmt::Debug {
    /// The destination address this configuration was built for.
    fn address(&self) -> &Address;

    /// Resource interfaces available to proxy-mode calls.
    fn registry(&self) -> &ResourceRegistry;

    /// Performs the call and returns the raw response envelope.
    ///
    /// Any HTTP status is a successful return; classification happens later.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Transport`] if no response could be obtained,
    /// including when the transport times out.
    async fn execute(&self, request: InvocationRequest) -> Result<HttpResponse, BridgeError>;
}

/// Builds [`ClientConfiguration`]s on cache misses.
pub trait ConfigurationFactory: Send + Sync {
    /// # Errors
    ///
    /// Returns [`BridgeError::Configuration`] if the address is malformed or
    /// the transport cannot be set up.
    fn create(&self, address: &Address) -> Result<Arc<dyn ClientConfiguration>, BridgeError>;
}

// ---------------------------------------------------------------------------
// Binding and conversion
// ---------------------------------------------------------------------------

/// Converts between message bodies/headers and wire payloads.
///
/// The bridge never inspects payloads itself; all translation goes through
/// this trait.
pub trait MessageBinding: Send + Sync {
    /// Produces the request entity from the inbound message.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be serialised.
    fn body_to_request(&self, message: &Message) -> Result<Option<Vec<u8>>, BridgeError>;

    /// Selects and converts the message headers that are sent on the wire.
    fn headers_to_request_headers(&self, headers: &Headers) -> Headers;

    /// Produces the outbound message body from a typed response.
    ///
    /// # Errors
    ///
    /// Returns an error if the response cannot be represented as a body.
    fn response_to_body(&self, response: &ResponseValue) -> Result<Body, BridgeError>;

    /// Produces the outbound message headers from the response envelope.
    fn response_headers_to_headers(&self, response: &HttpResponse) -> Headers;
}

/// Generic value conversion.
pub trait TypeConverter: Send + Sync {
    /// Converts `value` to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Conversion`] if the value has no representation
    /// in the target type.
    fn convert(&self, value: &TypedValue, target: ValueType) -> Result<TypedValue, BridgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_path_normalises_slashes() {
        assert_eq!(join_path("http://h/api", "/customers"), "http://h/api/customers");
        assert_eq!(join_path("http://h/api/", "customers"), "http://h/api/customers");
        assert_eq!(join_path("http://h/api", ""), "http://h/api");
        assert_eq!(join_path("http://h/api", "/"), "http://h/api");
    }

    #[test]
    fn target_appends_the_optional_path() {
        let mut request = InvocationRequest::new(http::Method::GET, "http://h/api");
        assert_eq!(request.target(), "http://h/api");
        request.path = Some("/customers/1".into());
        assert_eq!(request.target(), "http://h/api/customers/1");
    }
}
