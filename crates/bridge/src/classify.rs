//! Response classification: decides which HTTP outcomes become
//! [`RemoteInvocationError`]s.
//!
//! Statuses up to and including 207 are successes; anything above is a
//! failure. Classification only happens when the producer is configured to
//! throw on failure; otherwise every response is handed back to the caller
//! unchanged, status code included, for manual inspection.

use std::sync::Arc;

use tracing::warn;

use crate::{EndpointUri, HttpResponse, RemoteInvocationError, TypeConverter, TypedValue, ValueType};

/// Highest status code that is still a success.
pub const MAX_SUCCESS_STATUS: u16 = 207;

/// Returns `true` if `status` is a failure status.
pub fn is_failure_status(status: u16) -> bool {
    status > MAX_SUCCESS_STATUS
}

/// Returns the reason phrase for `status`, or `"Unknown"` for unregistered codes.
pub fn reason_phrase(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
}

/// Classifies response envelopes for one producer.
#[derive(Clone)]
pub struct ResponseClassifier {
    throw_on_failure: bool,
    converter: Arc<dyn TypeConverter>,
}

impl ResponseClassifier {
    /// `converter` is only used to render failure bodies as text.
    pub fn new(throw_on_failure: bool, converter: Arc<dyn TypeConverter>) -> Self {
        Self {
            throw_on_failure,
            converter,
        }
    }

    pub fn throws_on_failure(&self) -> bool {
        self.throw_on_failure
    }

    /// Checks `response`, which was obtained on behalf of the endpoint `origin`.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteInvocationError`] if throw-on-failure is enabled and
    /// the status is above 207.
    pub fn classify(
        &self,
        origin: &EndpointUri,
        response: &HttpResponse,
    ) -> Result<(), RemoteInvocationError> {
        if !self.throw_on_failure || !is_failure_status(response.status) {
            return Ok(());
        }
        warn!(
            uri = %origin,
            status = response.status,
            "REST invocation answered with a failure status"
        );
        Err(self.failure(origin, response))
    }

    fn failure(&self, origin: &EndpointUri, response: &HttpResponse) -> RemoteInvocationError {
        let status = response.status;
        let redirect_location = if (300..400).contains(&status) {
            response.headers.first("Location").map(str::to_string)
        } else {
            None
        };

        // Unrenderable bodies are reported as `None`.
        let response_body = self
            .converter
            .convert(&TypedValue::Bytes(response.body.clone()), ValueType::Text)
            .ok()
            .map(|value| value.to_text());

        RemoteInvocationError {
            uri: origin.clone(),
            status,
            status_text: reason_phrase(status).to_string(),
            redirect_location,
            headers: response.headers.first_values(),
            response_body,
        }
    }
}

impl std::fmt::Debug for ResponseClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseClassifier")
            .field("throw_on_failure", &self.throw_on_failure)
            .finish_non_exhaustive()
    }
}
