// Request body fields
// JSON and HTML-form bodies decode into the same typed request structs.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::logger;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Top-level body fields of one request, whatever the encoding
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestFields(Map<String, Value>);

fn is_form(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

impl RequestFields {
    /// Parse a body. Anything unparsable yields no fields, which the
    /// handlers then report as missing.
    pub fn parse(content_type: Option<&str>, body: &[u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::default();
        }

        if is_form(content_type) {
            return match serde_urlencoded::from_bytes::<Vec<(String, String)>>(body) {
                Ok(pairs) => Self(
                    pairs
                        .into_iter()
                        .map(|(key, value)| (key, Value::String(value)))
                        .collect(),
                ),
                Err(e) => {
                    logger::log_warning(&format!("Unparsable form body: {e}"));
                    Self::default()
                }
            };
        }

        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => Self(map),
            Ok(other) => {
                logger::log_warning(&format!(
                    "JSON body is not an object ({}), ignoring it",
                    json_kind(&other)
                ));
                Self::default()
            }
            Err(e) => {
                logger::log_warning(&format!("Unparsable JSON body: {e}"));
                Self::default()
            }
        }
    }

    /// Decode into a request struct; unknown keys are dropped
    pub fn decode<T: DeserializeOwned + Default>(self) -> T {
        serde_json::from_value(Value::Object(self.0)).unwrap_or_else(|e| {
            logger::log_warning(&format!("Request fields did not decode: {e}"));
            T::default()
        })
    }
}

#[cfg(test)]
impl From<Value> for RequestFields {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Field deserializers that accept whatever a client sends.
///
/// `null` and absent both mean "not supplied". Emptiness is left for the
/// caller to judge.
pub mod lenient {
    use super::{Deserialize, Deserializer, Value};

    /// Any scalar as text; numbers and booleans use their JSON spelling
    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        })
    }

    /// Boolean, or the text `"true"`; any other text is false and an empty
    /// string is not supplied
    pub fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Bool(b)) => Some(b),
            Some(Value::String(s)) if !s.is_empty() => Some(s == "true"),
            Some(Value::Number(n)) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
            _ => None,
        })
    }
}
