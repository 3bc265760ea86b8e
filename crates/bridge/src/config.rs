//! Endpoint configuration, read from the JSON endpoint file.
//!
//! Only `endpoint_uri` and `address` are required. Omitted fields take the
//! `DEFAULT_*` values below, and both mode flags default to enabled.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::{Address, EndpointUri, ResourceInterface};

/// Default number of client configurations kept per producer.
pub const DEFAULT_MAX_CLIENT_CACHE_SIZE: usize = 10;

/// Default transport timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Configuration of one REST endpoint the bridge produces to.
///
/// Deserialised from the endpoint configuration file; every field other than
/// `endpoint_uri` and `address` may be omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    /// Logical URI of the endpoint, reported in structured errors.
    pub endpoint_uri: EndpointUri,
    /// Destination address used when the message does not override it.
    pub address: Address,
    /// Use direct HTTP mode unless the message says otherwise.
    #[serde(default = "enabled")]
    pub http_client_api: bool,
    /// Turn responses with a status above 207 into errors.
    #[serde(default = "enabled")]
    pub throw_exception_on_failure: bool,
    /// Capacity of the client configuration cache.
    #[serde(default = "default_cache_size")]
    pub max_client_cache_size: usize,
    /// Query parameters sent when the message supplies none.
    #[serde(default)]
    pub parameters: Option<BTreeMap<String, String>>,
    /// Resource interfaces available to proxy mode, in resolution order.
    #[serde(default)]
    pub resource_interfaces: Vec<ResourceInterface>,
    /// Transport timeout for one call, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl EndpointConfig {
    /// Creates a configuration with defaults for everything but the endpoint
    /// URI and destination address.
    pub fn new(endpoint_uri: EndpointUri, address: Address) -> Self {
        Self {
            endpoint_uri,
            address,
            http_client_api: true,
            throw_exception_on_failure: true,
            max_client_cache_size: DEFAULT_MAX_CLIENT_CACHE_SIZE,
            parameters: None,
            resource_interfaces: Vec::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

fn enabled() -> bool {
    true
}

fn default_cache_size() -> usize {
    DEFAULT_MAX_CLIENT_CACHE_SIZE
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}
