//! Direct HTTP mode: the message spells out method, path, query, headers and
//! body explicitly.

use std::collections::BTreeMap;

use bridge::{
    parse_query_string, BridgeError, Charset, Exchange, InvocationRequest, Message, ResponseClass,
    ResponseType,
};
use tracing::trace;

use crate::InvocationEngine;

/// The verbs direct mode accepts.
const STANDARD_METHODS: &[&str] = &[
    "GET", "POST", "PUT", "DELETE", "HEAD", "OPTIONS", "PATCH", "TRACE", "CONNECT",
];

/// Parses a standard HTTP verb, ignoring ASCII case.
///
/// # Errors
///
/// Returns [`BridgeError::MalformedInput`] for extension or unknown methods.
pub fn parse_method(name: &str) -> Result<http::Method, BridgeError> {
    let upper = name.trim().to_ascii_uppercase();
    if !STANDARD_METHODS.contains(&upper.as_str()) {
        return Err(BridgeError::malformed(format!("unsupported HTTP method '{name}'")));
    }
    http::Method::from_bytes(upper.as_bytes())
        .map_err(|e| BridgeError::malformed(format!("invalid HTTP method '{name}': {e}")))
}

/// Determines the response typing requested by the message.
///
/// # Errors
///
/// Returns [`BridgeError::ResponseGenericTypeMissing`] when a collection is
/// requested without an element type.
pub fn requested_response_type(message: &Message) -> Result<ResponseType, BridgeError> {
    match message.metadata.response_class {
        None | Some(ResponseClass::Envelope) => Ok(ResponseType::Envelope),
        Some(ResponseClass::Scalar(ty)) => Ok(ResponseType::Scalar(ty)),
        Some(ResponseClass::Collection) => message
            .metadata
            .response_element_type
            .map(ResponseType::Collection)
            .ok_or(BridgeError::ResponseGenericTypeMissing),
    }
}

impl InvocationEngine {
    /// Query parameters for a direct call, first source present wins:
    /// the message's explicit map, its raw query string, the endpoint's
    /// default parameters.
    pub(crate) fn query_parameters(
        &self,
        message: &Message,
    ) -> Result<BTreeMap<String, String>, BridgeError> {
        let metadata = &message.metadata;
        if let Some(map) = &metadata.query_map {
            return Ok(map.clone());
        }
        if let Some(query) = &metadata.http_query {
            let charset = Charset::from_name(metadata.charset.as_deref())?;
            return parse_query_string(query, charset);
        }
        Ok(self.endpoint.parameters.clone().unwrap_or_default())
    }

    /// Direct mode.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::MalformedInput`] — missing or non-standard method,
    ///   malformed query string.
    /// - [`BridgeError::ResponseGenericTypeMissing`] — raised before the call
    ///   is sent.
    /// - [`BridgeError::Configuration`], [`BridgeError::Transport`],
    ///   [`BridgeError::RemoteInvocation`], [`BridgeError::Conversion`].
    pub(crate) async fn invoke_http(&self, exchange: &mut Exchange) -> Result<(), BridgeError> {
        let message = exchange.in_message();
        let metadata = &message.metadata;

        let method_name = metadata
            .http_method
            .as_deref()
            .ok_or_else(|| BridgeError::malformed("HTTP method not set on message"))?;
        let method = parse_method(method_name)?;
        let response_type = requested_response_type(message)?;
        trace!(
            exchange = %exchange.id(),
            %method,
            path = ?metadata.http_path,
            ?response_type,
            "Direct HTTP invocation"
        );

        let config = self.cache.get(&self.effective_address(message))?;

        let mut request = InvocationRequest::new(method, config.address().as_str());
        request.path = metadata.http_path.clone();
        request.query = self.query_parameters(message)?;
        if request.method != http::Method::GET {
            request.body = self.binding.body_to_request(message)?;
        }
        request.headers = self.binding.headers_to_request_headers(&message.headers);

        let response = config.execute(request).await?;
        self.complete(exchange, response, response_type)
    }
}
