//! JSON rendering of invocation results.

use bridge::{Body, Exchange, RemoteInvocationError, TypedValue};
use serde_json::{json, Value};

/// The outbound message as `{status, headers, body}`.
///
/// An exchange without an outbound message renders as `null` fields.
pub fn render_exchange(exchange: &Exchange) -> Value {
    match exchange.out_message() {
        Some(out) => json!({
            "status": out.response_code,
            "headers": out.headers,
            "body": render_body(&out.body),
        }),
        None => json!({ "status": null, "headers": {}, "body": null }),
    }
}

pub fn render_remote_error(error: &RemoteInvocationError) -> Value {
    json!({
        "error": error.to_string(),
        "uri": error.uri.as_str(),
        "status": error.status,
        "status_text": error.status_text,
        "redirect_location": error.redirect_location,
        "headers": error.headers,
        "body": error.response_body,
    })
}

fn render_body(body: &Body) -> Value {
    match body {
        Body::Empty => Value::Null,
        Body::Text(s) => Value::String(s.clone()),
        Body::Bytes(b) => match std::str::from_utf8(b) {
            Ok(text) => serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())),
            Err(_) => Value::String(String::from_utf8_lossy(b).into_owned()),
        },
        Body::Json(v) => v.clone(),
        Body::Values(values) => match values.as_slice() {
            [single] => single.to_json(),
            many => Value::Array(many.iter().map(TypedValue::to_json).collect()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge::{EndpointUri, Message};

    #[test]
    fn json_entities_are_inlined_and_other_bytes_stay_text() {
        assert_eq!(render_body(&Body::Bytes(br#"{"id":1}"#.to_vec())), json!({"id": 1}));
        assert_eq!(render_body(&Body::Bytes(b"plain".to_vec())), json!("plain"));
        assert_eq!(render_body(&Body::Empty), Value::Null);
        assert_eq!(render_body(&Body::Values(vec![TypedValue::Integer(3)])), json!(3));
    }

    #[test]
    fn renders_status_headers_and_body() {
        let uri = EndpointUri::new("rest://cli").unwrap();
        let mut exchange = Exchange::new(uri, Message::new());
        assert_eq!(render_exchange(&exchange)["status"], Value::Null);

        let mut out = Message::new()
            .with_header("Content-Type", "text/plain")
            .with_body(Body::Text("ok".into()));
        out.response_code = Some(200);
        exchange.set_out_message(out);

        assert_eq!(
            render_exchange(&exchange),
            json!({"status": 200, "headers": {"Content-Type": "text/plain"}, "body": "ok"})
        );
    }
}
