//! Default [`TypeConverter`]: text-oriented coercions between [`TypedValue`]s.

use crate::{BridgeError, TypeConverter, TypedValue, ValueType};

/// Converts between value types the way an HTTP entity is usually read:
/// bytes are UTF-8 text, text is parsed for numbers and booleans, and JSON
/// is decoded from or rendered to text.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTypeConverter;

impl TypeConverter for DefaultTypeConverter {
    fn convert(&self, value: &TypedValue, target: ValueType) -> Result<TypedValue, BridgeError> {
        if value.value_type() == target {
            return Ok(value.clone());
        }
        match (value, target) {
            (TypedValue::Json(json), _) => from_json(json, target),
            (_, ValueType::Bytes) => Ok(TypedValue::Bytes(value.to_bytes())),
            (TypedValue::Bytes(bytes), _) => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| BridgeError::conversion(format!("entity is not UTF-8: {e}")))?;
                from_text(text, target)
            }
            (other, _) => from_text(&other.to_text(), target),
        }
    }
}

fn from_text(text: &str, target: ValueType) -> Result<TypedValue, BridgeError> {
    let invalid = || BridgeError::conversion(format!("cannot read {target} from '{text}'"));
    match target {
        ValueType::Text => Ok(TypedValue::Text(text.to_string())),
        ValueType::Integer => text.trim().parse().map(TypedValue::Integer).map_err(|_| invalid()),
        ValueType::Float => text.trim().parse().map(TypedValue::Float).map_err(|_| invalid()),
        ValueType::Boolean => text.trim().parse().map(TypedValue::Boolean).map_err(|_| invalid()),
        ValueType::Bytes => Ok(TypedValue::Bytes(text.as_bytes().to_vec())),
        ValueType::Json => serde_json::from_str(text)
            .map(TypedValue::Json)
            .map_err(|e| BridgeError::conversion(format!("invalid JSON entity: {e}"))),
    }
}

fn from_json(json: &serde_json::Value, target: ValueType) -> Result<TypedValue, BridgeError> {
    let mismatch = || BridgeError::conversion(format!("cannot read {target} from JSON {json}"));
    match target {
        ValueType::Text => Ok(TypedValue::Text(match json {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })),
        ValueType::Integer => json.as_i64().map(TypedValue::Integer).ok_or_else(mismatch),
        ValueType::Float => json.as_f64().map(TypedValue::Float).ok_or_else(mismatch),
        ValueType::Boolean => json.as_bool().map(TypedValue::Boolean).ok_or_else(mismatch),
        ValueType::Bytes => Ok(TypedValue::Bytes(json.to_string().into_bytes())),
        ValueType::Json => Ok(TypedValue::Json(json.clone())),
    }
}
