//! Query-string parsing for direct mode.
//!
//! The raw query string is split on `&`, each segment on its first `=`, and
//! both sides are percent-decoded (`+` meaning a space) in the message's
//! character encoding. A segment that is not a `name=value` pair fails the
//! whole parse; there is no partial result.

use std::collections::BTreeMap;

use percent_encoding::percent_decode;

use crate::BridgeError;

/// Character encodings a query string may be declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Utf8,
    Latin1,
    Ascii,
}

impl Charset {
    /// Looks up a charset by its IANA name or a common alias.
    ///
    /// `None` means the message did not declare one and selects UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MalformedInput`] for unsupported names.
    pub fn from_name(name: Option<&str>) -> Result<Self, BridgeError> {
        let Some(name) = name else {
            return Ok(Self::Utf8);
        };
        match name.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Ok(Self::Latin1),
            "us-ascii" | "ascii" => Ok(Self::Ascii),
            other => Err(BridgeError::malformed(format!("unsupported charset '{other}'"))),
        }
    }

    fn decode(self, bytes: &[u8]) -> Result<String, BridgeError> {
        match self {
            Self::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|_| BridgeError::malformed("query string is not valid UTF-8")),
            // Every byte is a code point in Latin-1.
            Self::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Self::Ascii => {
                if bytes.is_ascii() {
                    Ok(bytes.iter().map(|&b| char::from(b)).collect())
                } else {
                    Err(BridgeError::malformed("query string is not valid US-ASCII"))
                }
            }
        }
    }
}

/// Parses `query` into name → value pairs. Later duplicates overwrite
/// earlier ones.
///
/// # Errors
///
/// Returns [`BridgeError::MalformedInput`] if a segment has no `=`, contains
/// an invalid percent escape, or does not decode in `charset`.
pub fn parse_query_string(
    query: &str,
    charset: Charset,
) -> Result<BTreeMap<String, String>, BridgeError> {
    let mut params = BTreeMap::new();
    for segment in query.split('&') {
        let Some((name, value)) = segment.split_once('=') else {
            return Err(BridgeError::malformed(format!(
                "Invalid parameter, expected to be a pair but was {segment}"
            )));
        };
        params.insert(decode_component(name, charset)?, decode_component(value, charset)?);
    }
    Ok(params)
}

fn decode_component(component: &str, charset: Charset) -> Result<String, BridgeError> {
    validate_escapes(component)?;
    let plus_as_space = component.replace('+', " ");
    let bytes: Vec<u8> = percent_decode(plus_as_space.as_bytes()).collect();
    charset.decode(&bytes)
}

fn validate_escapes(component: &str) -> Result<(), BridgeError> {
    let bytes = component.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
                return Err(BridgeError::malformed(format!(
                    "invalid percent escape in '{component}'"
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(query: &str) -> Result<BTreeMap<String, String>, BridgeError> {
        parse_query_string(query, Charset::Utf8)
    }

    #[test]
    fn parses_simple_pairs() {
        let params = parse("a=1&b=2").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params["a"], "1");
        assert_eq!(params["b"], "2");
    }

    #[test]
    fn segment_without_equals_is_malformed() {
        assert!(matches!(parse("a"), Err(BridgeError::MalformedInput { .. })));
        assert!(matches!(parse("a=1&b"), Err(BridgeError::MalformedInput { .. })));
    }

    #[test]
    fn last_duplicate_wins() {
        let params = parse("a=1&a=2").unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params["a"], "2");
    }

    #[test]
    fn splits_on_first_equals_only() {
        let params = parse("filter=x=y&empty=").unwrap();
        assert_eq!(params["filter"], "x=y");
        assert_eq!(params["empty"], "");
    }

    #[test]
    fn decodes_percent_escapes_and_plus() {
        let params = parse("na%20me=caf%C3%A9+au+lait").unwrap();
        assert_eq!(params["na me"], "café au lait");
    }

    #[test]
    fn decodes_in_the_declared_charset() {
        let latin1 = Charset::from_name(Some("ISO-8859-1")).unwrap();
        let params = parse_query_string("q=caf%E9", latin1).unwrap();
        assert_eq!(params["q"], "café");

        // The same bytes are not valid UTF-8.
        assert!(parse("q=caf%E9").is_err());
    }

    #[test]
    fn rejects_broken_escapes_and_unknown_charsets() {
        assert!(parse("a=%zz").is_err());
        assert!(parse("a=%4").is_err());
        assert!(Charset::from_name(Some("EBCDIC")).is_err());
        assert_eq!(Charset::from_name(None).unwrap(), Charset::Utf8);
    }
}
