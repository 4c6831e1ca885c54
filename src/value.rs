use crate::error::{serde_error, SessionResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A value held in the session or flash partition.
///
/// Structured values are stored as compact JSON text and recovered on read whenever the stored
/// text parses as a JSON object. Anything else comes back as the raw string that was written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(untagged)]
pub enum SessionValue {
    Raw(String),
    Structured(Map<String, Value>),
}

impl SessionValue {
    /// Builds a structured value from any serializable type whose JSON form is an object.
    pub fn structured<T: Serialize>(value: &T) -> SessionResult<Self> {
        match serde_json::to_value(value).map_err(serde_error)? {
            Value::Object(map) => Ok(Self::Structured(map)),
            Value::String(text) => Ok(Self::Raw(text)),
            other => Ok(Self::Raw(other.to_string())),
        }
    }

    /// Interprets stored text. Decode failure is not an error; the text is kept as-is.
    pub fn decode(stored: impl Into<String>) -> Self {
        let stored = stored.into();
        match serde_json::from_str::<Value>(&stored) {
            Ok(Value::Object(map)) => Self::Structured(map),
            _ => Self::Raw(stored),
        }
    }

    /// Text written to the backing store for this value.
    pub fn encode(&self) -> String {
        match self {
            Self::Raw(text) => text.clone(),
            // Map<String, Value> always serializes
            Self::Structured(map) => Value::Object(map.clone()).to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Raw(text) => Some(text),
            Self::Structured(_) => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Raw(_) => None,
            Self::Structured(map) => Some(map),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    /// Deserializes the value into `T`. Raw values are offered to `T` as a JSON string.
    pub fn deserialize<T: DeserializeOwned>(&self) -> SessionResult<T> {
        let value = match self {
            Self::Raw(text) => Value::String(text.clone()),
            Self::Structured(map) => Value::Object(map.clone()),
        };
        serde_json::from_value(value).map_err(serde_error)
    }
}

impl fmt::Display for SessionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl From<&str> for SessionValue {
    fn from(value: &str) -> Self {
        Self::Raw(value.to_owned())
    }
}

impl From<String> for SessionValue {
    fn from(value: String) -> Self {
        Self::Raw(value)
    }
}

impl From<Map<String, Value>> for SessionValue {
    fn from(value: Map<String, Value>) -> Self {
        Self::Structured(value)
    }
}

impl PartialEq<&str> for SessionValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn structured_values_encode_as_compact_json() {
        let value = SessionValue::from(map(json!({"theme": "dark"})));
        assert_eq!(value.encode(), r#"{"theme":"dark"}"#);
    }

    #[test]
    fn decode_recovers_objects_and_keeps_other_text() {
        assert_eq!(
            SessionValue::decode(r#"{"id": 1}"#),
            SessionValue::Structured(map(json!({"id": 1})))
        );
        assert_eq!(SessionValue::decode("42"), SessionValue::Raw("42".into()));
        assert_eq!(
            SessionValue::decode("[1, 2]"),
            SessionValue::Raw("[1, 2]".into())
        );
        assert_eq!(
            SessionValue::decode("{not json"),
            SessionValue::Raw("{not json".into())
        );
        assert_eq!(SessionValue::decode(""), SessionValue::Raw(String::new()));
    }

    #[test]
    fn structured_helper_accepts_serializable_types() {
        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct Prefs {
            theme: String,
            page_size: u32,
        }

        let prefs = Prefs {
            theme: "dark".into(),
            page_size: 25,
        };
        let value = SessionValue::structured(&prefs).expect("serializable");
        assert!(value.is_structured());
        let back: Prefs = value.deserialize().expect("round trip");
        assert_eq!(back, prefs);

        let scalar = SessionValue::structured(&7u8).expect("scalar");
        assert_eq!(scalar, SessionValue::Raw("7".into()));
    }

    #[test]
    fn serde_form_is_untagged() {
        let raw = serde_json::to_string(&SessionValue::from("pep")).expect("raw");
        assert_eq!(raw, r#""pep""#);
        let parsed: SessionValue = serde_json::from_str(r#"{"id":1}"#).expect("object");
        assert!(parsed.is_structured());
    }
}
