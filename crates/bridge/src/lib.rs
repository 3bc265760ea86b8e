//! Core domain for the REST bridge.
//!
//! This crate contains the message model, newtype identifiers, error types,
//! endpoint configuration, and the three pieces of pure logic the invocation
//! engine is assembled from: the client configuration cache, proxy-mode
//! method resolution, and response classification. It also defines the port
//! traits that transport adapters implement.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate performs no network I/O.
//! It defines *what* a transport must provide ([`ClientConfiguration`],
//! [`ConfigurationFactory`]); the `http-transport` crate defines *how*.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`Address`, `EndpointUri`, `OperationName`, …) |
//! | [`types`] | Typed values, bodies, the response envelope, response typing |
//! | [`message`] | `Exchange`, `Message`, `InvocationMetadata` |
//! | [`errors`] | `BridgeError`, `RemoteInvocationError` |
//! | [`config`] | `EndpointConfig` |
//! | [`ports`] | Port traits and `InvocationRequest` |
//! | [`cache`] | `ClientConfigCache` |
//! | [`resource`] | Resource interfaces and `ResourceRegistry` (method resolution) |
//! | [`classify`] | `ResponseClassifier` |
//! | [`query`] | Query-string parsing |
//! | [`binding`] / [`convert`] | Default `MessageBinding` and `TypeConverter` |

pub mod binding;
pub mod cache;
pub mod classify;
pub mod config;
pub mod convert;
pub mod errors;
pub mod identifiers;
pub mod message;
pub mod ports;
pub mod query;
pub mod resource;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use binding::DefaultBinding;
pub use cache::{CacheStatistics, ClientConfigCache};
pub use classify::{is_failure_status, reason_phrase, ResponseClassifier, MAX_SUCCESS_STATUS};
pub use config::EndpointConfig;
pub use convert::DefaultTypeConverter;
pub use errors::{BridgeError, RemoteInvocationError};
pub use identifiers::{Address, EndpointUri, ExchangeId, InterfaceName, OperationName};
pub use message::{Exchange, ExchangePattern, Headers, InvocationMetadata, Message};
pub use ports::{
    join_path, ClientConfiguration, ConfigurationFactory, InvocationRequest, MessageBinding,
    TypeConverter,
};
pub use query::{parse_query_string, Charset};
pub use resource::{
    ParamSource, ParamSpec, ResolvedMethod, ResourceInterface, ResourceMethod, ResourceRegistry,
};
pub use types::{
    Body, HttpResponse, ResponseClass, ResponseHeaders, ResponseType, ResponseValue, TypedValue,
    ValueType,
};
