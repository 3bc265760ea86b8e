//! Default [`MessageBinding`].

use crate::{
    BridgeError, Body, Headers, HttpResponse, Message, MessageBinding, ResponseValue, TypedValue,
};

/// Headers that describe a single hop and are never copied between a message
/// and the wire.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "content-length",
    "host",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Passes bodies through as bytes/JSON and copies end-to-end headers.
///
/// - Text and byte bodies are sent verbatim; JSON and value lists are
///   serialised as JSON.
/// - An envelope response becomes a byte body; typed responses keep their
///   type.
/// - Multi-valued response headers are joined with `", "`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBinding;

impl MessageBinding for DefaultBinding {
    fn body_to_request(&self, message: &Message) -> Result<Option<Vec<u8>>, BridgeError> {
        let bytes = match &message.body {
            Body::Empty => return Ok(None),
            Body::Text(s) => s.clone().into_bytes(),
            Body::Bytes(b) => b.clone(),
            Body::Json(v) => serde_json::to_vec(v)
                .map_err(|e| BridgeError::conversion(format!("cannot serialise body: {e}")))?,
            Body::Values(values) => {
                let array: Vec<serde_json::Value> = values.iter().map(|v| v.to_json()).collect();
                serde_json::to_vec(&array)
                    .map_err(|e| BridgeError::conversion(format!("cannot serialise body: {e}")))?
            }
        };
        Ok(Some(bytes))
    }

    fn headers_to_request_headers(&self, headers: &Headers) -> Headers {
        headers
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn response_to_body(&self, response: &ResponseValue) -> Result<Body, BridgeError> {
        Ok(match response {
            ResponseValue::Envelope(envelope) if envelope.body.is_empty() => Body::Empty,
            ResponseValue::Envelope(envelope) => Body::Bytes(envelope.body.clone()),
            ResponseValue::Value(value) => match value {
                TypedValue::Text(s) => Body::Text(s.clone()),
                TypedValue::Bytes(b) => Body::Bytes(b.clone()),
                TypedValue::Json(j) => Body::Json(j.clone()),
                scalar => Body::Values(vec![scalar.clone()]),
            },
            ResponseValue::Collection(values) => Body::Values(values.clone()),
        })
    }

    fn response_headers_to_headers(&self, response: &HttpResponse) -> Headers {
        response
            .headers
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name))
            .map(|(name, values)| (name.to_string(), values.join(", ")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_serialisation() {
        let b = DefaultBinding;
        assert_eq!(b.body_to_request(&Message::new()).unwrap(), None);

        let text = Message::new().with_body(Body::Text("hi".into()));
        assert_eq!(b.body_to_request(&text).unwrap(), Some(b"hi".to_vec()));

        let values = Message::new().with_body(Body::Values(vec![
            TypedValue::Integer(1),
            TypedValue::Text("x".into()),
        ]));
        assert_eq!(b.body_to_request(&values).unwrap(), Some(br#"[1,"x"]"#.to_vec()));
    }

    #[test]
    fn hop_by_hop_headers_are_not_forwarded() {
        let headers: Headers = [
            ("Accept".to_string(), "application/json".to_string()),
            ("Content-Length".to_string(), "12".to_string()),
            ("Host".to_string(), "example.org".to_string()),
        ]
        .into_iter()
        .collect();

        let forwarded = DefaultBinding.headers_to_request_headers(&headers);
        assert_eq!(forwarded.len(), 1);
        assert!(forwarded.contains_key("Accept"));
    }

    #[test]
    fn response_headers_are_joined_per_name() {
        let response = HttpResponse::new(200)
            .with_header("Vary", "Accept")
            .with_header("Vary", "Origin")
            .with_header("transfer-encoding", "chunked");

        let headers = DefaultBinding.response_headers_to_headers(&response);
        assert_eq!(headers.get("Vary").map(String::as_str), Some("Accept, Origin"));
        assert!(!headers.contains_key("transfer-encoding"));
    }

    #[test]
    fn envelope_and_typed_responses_become_bodies() {
        let b = DefaultBinding;
        let envelope = ResponseValue::Envelope(HttpResponse::new(200).with_body("raw"));
        assert_eq!(b.response_to_body(&envelope).unwrap(), Body::Bytes(b"raw".to_vec()));

        let empty = ResponseValue::Envelope(HttpResponse::new(204));
        assert_eq!(b.response_to_body(&empty).unwrap(), Body::Empty);

        let count = ResponseValue::Value(TypedValue::Integer(3));
        assert_eq!(
            b.response_to_body(&count).unwrap(),
            Body::Values(vec![TypedValue::Integer(3)])
        );
    }
}
