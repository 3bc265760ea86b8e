//! Shared value types for the bridge domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! payloads: typed call arguments, message bodies, and the raw HTTP response
//! envelope together with the tagged [`ResponseType`] that selects how the
//! envelope is unwrapped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Typed values
// ---------------------------------------------------------------------------

/// Runtime type tag of a [`TypedValue`].
///
/// Proxy-mode method signatures are expressed as lists of [`ValueType`] and
/// matched exactly against the runtime types of the supplied arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// UTF-8 text.
    Text,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit float.
    Float,
    /// Boolean.
    Boolean,
    /// Opaque bytes.
    Bytes,
    /// Arbitrary JSON document.
    Json,
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Bytes => "bytes",
            Self::Json => "json",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------

/// A value that carries its own runtime type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

impl TypedValue {
    /// Returns the runtime type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Text(_) => ValueType::Text,
            Self::Integer(_) => ValueType::Integer,
            Self::Float(_) => ValueType::Float,
            Self::Boolean(_) => ValueType::Boolean,
            Self::Bytes(_) => ValueType::Bytes,
            Self::Json(_) => ValueType::Json,
        }
    }

    /// Maps a JSON document onto the narrowest matching value.
    ///
    /// Strings, integers, floats and booleans become their scalar variants;
    /// everything else (objects, arrays, null) stays [`TypedValue::Json`].
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n.as_f64().map_or(Self::Json(serde_json::Value::Number(n)), Self::Float),
            },
            other => Self::Json(other),
        }
    }

    /// Renders the value as it appears in a URL path, query or header.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
            Self::Float(x) => x.to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            Self::Json(v) => v.to_string(),
        }
    }

    /// Serialises the value as a request entity.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Bytes(b) => b.clone(),
            Self::Json(v) => v.to_string().into_bytes(),
            other => other.to_text().into_bytes(),
        }
    }

    /// Converts the value back into JSON.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Float(x) => serde_json::Value::from(*x),
            Self::Boolean(b) => serde_json::Value::Bool(*b),
            Self::Bytes(b) => serde_json::Value::String(String::from_utf8_lossy(b).into_owned()),
            Self::Json(v) => v.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Message bodies
// ---------------------------------------------------------------------------

/// Body of a [`crate::Message`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    /// An ordered list of values; in proxy mode these are the call arguments.
    Values(Vec<TypedValue>),
}

impl Body {
    /// Returns `true` if the body is [`Body::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Interprets the body as an ordered argument list.
    ///
    /// `Empty` yields no arguments, `Values` yields its elements, and any
    /// other body is passed as a single argument.
    pub fn into_arguments(self) -> Vec<TypedValue> {
        match self {
            Self::Empty => Vec::new(),
            Self::Values(values) => values,
            Self::Text(s) => vec![TypedValue::Text(s)],
            Self::Bytes(b) => vec![TypedValue::Bytes(b)],
            Self::Json(v) => vec![TypedValue::Json(v)],
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP response envelope
// ---------------------------------------------------------------------------

/// Multi-valued response headers.
///
/// Names are stored exactly as the transport delivered them; [`Self::first`]
/// matches names case-insensitively, as HTTP requires.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseHeaders(BTreeMap<String, Vec<String>>);

impl ResponseHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value under `name`, keeping earlier values.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.entry(name.into()).or_default().push(value.into());
    }

    /// Returns the first value stored under `name`, ignoring ASCII case.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }

    /// Iterates over header names (as stored) and all their values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Returns a map from each header name to its first value.
    pub fn first_values(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .filter_map(|(k, v)| v.first().map(|first| (k.clone(), first.clone())))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ResponseHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (k, v) in iter {
            headers.append(k, v);
        }
        headers
    }
}

// ---------------------------------------------------------------------------

/// The full HTTP response as returned by the transport: the **envelope**.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Numeric status code.
    pub status: u16,
    pub headers: ResponseHeaders,
    /// Raw entity bytes (empty when the response had no entity).
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: ResponseHeaders::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Response typing
// ---------------------------------------------------------------------------

/// How a caller wants the response unwrapped, as requested on the message.
///
/// A `Collection` request carries no element type of its own; the element
/// type travels separately in
/// [`crate::InvocationMetadata::response_element_type`] and is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseClass {
    Envelope,
    Scalar(ValueType),
    Collection,
}

/// Fully determined response typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Return the [`HttpResponse`] unmodified.
    #[default]
    Envelope,
    /// Coerce the entity to one value of the given type.
    Scalar(ValueType),
    /// Decode the entity as a JSON array and coerce each element.
    Collection(ValueType),
}

/// A response after typing has been applied.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseValue {
    Envelope(HttpResponse),
    Value(TypedValue),
    Collection(Vec<TypedValue>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_picks_the_narrowest_variant() {
        assert_eq!(
            TypedValue::from_json(serde_json::json!("a")).value_type(),
            ValueType::Text
        );
        assert_eq!(TypedValue::from_json(serde_json::json!(3)), TypedValue::Integer(3));
        assert_eq!(TypedValue::from_json(serde_json::json!(1.5)), TypedValue::Float(1.5));
        assert_eq!(
            TypedValue::from_json(serde_json::json!({"k": 1})).value_type(),
            ValueType::Json
        );
    }

    #[test]
    fn header_lookup_ignores_case_but_keeps_stored_names() {
        let headers: ResponseHeaders = [("location", "http://x"), ("Set-Cookie", "a"), ("Set-Cookie", "b")]
            .into_iter()
            .collect();

        assert_eq!(headers.first("Location"), Some("http://x"));
        assert_eq!(headers.first("set-cookie"), Some("a"));

        let firsts = headers.first_values();
        assert_eq!(firsts.get("location").map(String::as_str), Some("http://x"));
        assert_eq!(firsts.get("Set-Cookie").map(String::as_str), Some("a"));
    }

    #[test]
    fn body_into_arguments() {
        assert!(Body::Empty.into_arguments().is_empty());
        assert_eq!(
            Body::Text("x".into()).into_arguments(),
            vec![TypedValue::Text("x".into())]
        );
        let values = vec![TypedValue::Integer(1), TypedValue::Boolean(true)];
        assert_eq!(Body::Values(values.clone()).into_arguments(), values);
    }
}
