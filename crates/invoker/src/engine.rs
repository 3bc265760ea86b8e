//! The invocation engine: one request in, one response (or error) out.

use std::sync::Arc;

use bridge::{
    Address, BridgeError, ClientConfigCache, ConfigurationFactory, DefaultBinding,
    DefaultTypeConverter, EndpointConfig, Exchange, Headers, HttpResponse, Message,
    MessageBinding, ResponseClassifier, ResponseType, ResponseValue, TypeConverter, TypedValue,
    ValueType,
};
use tracing::{debug, trace};

/// Turns exchanges into REST calls against one configured endpoint.
///
/// The engine is shared between callers (`Arc<InvocationEngine>`); each
/// [`process`](Self::process) call runs on the caller's task, and the only
/// state shared between calls is the client configuration cache.
pub struct InvocationEngine {
    pub(crate) endpoint: Arc<EndpointConfig>,
    pub(crate) cache: ClientConfigCache,
    pub(crate) binding: Arc<dyn MessageBinding>,
    pub(crate) converter: Arc<dyn TypeConverter>,
    pub(crate) classifier: ResponseClassifier,
}

impl InvocationEngine {
    /// Creates an engine using [`DefaultBinding`] and [`DefaultTypeConverter`].
    pub fn new(endpoint: EndpointConfig, factory: Arc<dyn ConfigurationFactory>) -> Self {
        let converter: Arc<dyn TypeConverter> = Arc::new(DefaultTypeConverter);
        Self {
            cache: ClientConfigCache::new(factory, endpoint.max_client_cache_size),
            classifier: ResponseClassifier::new(
                endpoint.throw_exception_on_failure,
                Arc::clone(&converter),
            ),
            endpoint: Arc::new(endpoint),
            binding: Arc::new(DefaultBinding),
            converter,
        }
    }

    #[must_use]
    pub fn with_binding(mut self, binding: Arc<dyn MessageBinding>) -> Self {
        self.binding = binding;
        self
    }

    #[must_use]
    pub fn with_converter(mut self, converter: Arc<dyn TypeConverter>) -> Self {
        self.classifier = ResponseClassifier::new(
            self.endpoint.throw_exception_on_failure,
            Arc::clone(&converter),
        );
        self.converter = converter;
        self
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    pub fn cache(&self) -> &ClientConfigCache {
        &self.cache
    }

    pub fn start(&self) {
        self.cache.start();
        debug!(uri = %self.endpoint.endpoint_uri, "Invocation engine started");
    }

    pub fn stop(&self) {
        self.cache.stop();
        debug!(uri = %self.endpoint.endpoint_uri, "Invocation engine stopped");
    }

    /// Performs the REST call described by the exchange's inbound message.
    ///
    /// Direct HTTP mode is used when the message's `use_http_api` flag (or,
    /// failing that, the endpoint's `http_client_api` setting) is set;
    /// otherwise the call goes through proxy mode. On success an out-capable
    /// exchange receives an outbound message carrying the response body,
    /// the inbound headers merged with the response headers, and the status.
    ///
    /// # Errors
    ///
    /// Every [`BridgeError`] kind; see the mode-specific documentation. On
    /// error the outbound message is left untouched.
    pub async fn process(&self, exchange: &mut Exchange) -> Result<(), BridgeError> {
        let use_http_api = exchange
            .in_message()
            .metadata
            .use_http_api
            .unwrap_or(self.endpoint.http_client_api);
        trace!(exchange = %exchange.id(), use_http_api, "Processing exchange");

        if use_http_api {
            self.invoke_http(exchange).await
        } else {
            self.invoke_proxy(exchange).await
        }
    }

    /// The message's address override, or the endpoint's address.
    pub(crate) fn effective_address(&self, message: &Message) -> Address {
        message
            .metadata
            .address_override
            .clone()
            .unwrap_or_else(|| self.endpoint.address.clone())
    }

    /// Classifies the response, applies the response typing and writes the
    /// outcome into the exchange.
    pub(crate) fn complete(
        &self,
        exchange: &mut Exchange,
        response: HttpResponse,
        response_type: ResponseType,
    ) -> Result<(), BridgeError> {
        self.classifier.classify(exchange.from_endpoint(), &response)?;

        let status = response.status;
        let response_headers = self.binding.response_headers_to_headers(&response);
        let value = self.apply_response_type(response, response_type)?;
        trace!(exchange = %exchange.id(), status, ?value, "Response received");

        if exchange.pattern().is_out_capable() {
            let mut out = Message::new();
            out.headers = exchange.in_message().headers.clone();
            out.body = self.binding.response_to_body(&value)?;
            merge_headers(&mut out.headers, response_headers);
            out.response_code = Some(status);
            exchange.set_out_message(out);
        }
        Ok(())
    }

    fn apply_response_type(
        &self,
        response: HttpResponse,
        response_type: ResponseType,
    ) -> Result<ResponseValue, BridgeError> {
        match response_type {
            ResponseType::Envelope => Ok(ResponseValue::Envelope(response)),
            ResponseType::Scalar(ty) => self
                .converter
                .convert(&TypedValue::Bytes(response.body), ty)
                .map(ResponseValue::Value),
            ResponseType::Collection(element) => {
                let entity = TypedValue::Bytes(response.body);
                let TypedValue::Json(json) = self.converter.convert(&entity, ValueType::Json)? else {
                    return Err(BridgeError::conversion("collection entity is not JSON"));
                };
                let items = json
                    .as_array()
                    .ok_or_else(|| BridgeError::conversion("collection entity is not a JSON array"))?;
                items
                    .iter()
                    .map(|item| self.converter.convert(&TypedValue::Json(item.clone()), element))
                    .collect::<Result<Vec<_>, _>>()
                    .map(ResponseValue::Collection)
            }
        }
    }
}

/// Inserts `overrides` into `headers`. A header already present under a name
/// differing only in ASCII case is replaced.
fn merge_headers(headers: &mut Headers, overrides: Headers) {
    for (name, value) in overrides {
        headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        headers.insert(name, value);
    }
}

impl std::fmt::Debug for InvocationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationEngine")
            .field("endpoint", &self.endpoint.endpoint_uri)
            .field("cache", &self.cache)
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}
