//! Error types for the bridge domain.
//!
//! [`BridgeError`] covers every condition that aborts an invocation. None of
//! them are retried by the bridge: they propagate synchronously to the caller
//! of [`crate::ports::ClientConfiguration::execute`] and the invocation engine.
//!
//! [`RemoteInvocationError`] is the structured payload produced when a remote
//! resource answers with a failure status and the endpoint is configured to
//! throw on failure.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::{Address, EndpointUri};

// ---------------------------------------------------------------------------
// Structured remote failure
// ---------------------------------------------------------------------------

/// A remote resource answered with a status above 207.
///
/// Produced by [`crate::ResponseClassifier`] only when throw-on-failure is
/// enabled for the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("REST invocation of {uri} failed with status {status} {status_text}")]
pub struct RemoteInvocationError {
    /// Logical URI of the endpoint that originated the call.
    pub uri: EndpointUri,
    /// Numeric HTTP status code.
    pub status: u16,
    /// Reason phrase for `status` (e.g. `"Not Found"`).
    pub status_text: String,
    /// Target of a 3xx response, when a `Location` header was present.
    pub redirect_location: Option<String>,
    /// Response header name → first value.
    pub headers: BTreeMap<String, String>,
    /// String rendering of the response entity.
    ///
    /// `None` when the entity could not be converted to text.
    pub response_body: Option<String>,
}

impl RemoteInvocationError {
    /// Returns `true` if the failure is a redirect with a known target.
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status) && self.redirect_location.is_some()
    }
}

// ---------------------------------------------------------------------------
// Bridge-level errors
// ---------------------------------------------------------------------------

/// Errors that abort a single invocation.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The client configuration for a destination could not be constructed.
    ///
    /// The configuration cache is left without an entry for the address.
    #[error("Cannot create client configuration for '{address}': {message}")]
    Configuration {
        /// Destination the configuration was requested for.
        address: Address,
        /// Description of the construction failure.
        message: String,
    },

    /// Caller-supplied data could not be parsed (query string, HTTP method,
    /// path template values, character encoding).
    #[error("Malformed input: {message}")]
    MalformedInput {
        /// Description of the offending input.
        message: String,
    },

    /// A collection response was requested without an element type.
    #[error("Response element type not found in message for a collection response")]
    ResponseGenericTypeMissing,

    /// No resource interface declares a method matching the operation name
    /// and argument types.
    #[error("Cannot find method with name: {operation} having parameters: {argument_types}")]
    MethodResolution {
        /// Requested operation name.
        operation: String,
        /// Runtime argument types, rendered as `[text,integer]`.
        argument_types: String,
    },

    /// The remote resource answered with a failure status.
    #[error(transparent)]
    RemoteInvocation(Box<RemoteInvocationError>),

    /// The transport failed to complete the call (connection refused, timeout, …).
    #[error("Transport failure: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// A response entity could not be coerced to the requested type.
    #[error("Cannot convert response: {message}")]
    Conversion {
        /// Description of the conversion failure.
        message: String,
    },
}

impl BridgeError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }

    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Returns the structured remote failure, if this is one.
    pub fn as_remote(&self) -> Option<&RemoteInvocationError> {
        match self {
            Self::RemoteInvocation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RemoteInvocationError> for BridgeError {
    fn from(e: RemoteInvocationError) -> Self {
        Self::RemoteInvocation(Box::new(e))
    }
}
