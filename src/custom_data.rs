//! Custom data attached to an event
//!
//! The payload is either structured JSON or raw bytes, and its declared
//! content type decides how it travels. JSON content (`application/json` or
//! no content type) is embedded as-is. Anything else must be bytes, which are
//! written as a base64 string; on read, a string found under a non-JSON
//! content type is base64-decoded.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{CdEventsError, Result};

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Whether a content type means "structured JSON"
pub fn is_json_content_type(content_type: &str) -> bool {
    content_type.is_empty() || content_type == JSON_CONTENT_TYPE
}

/// Stored payload shape
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CustomDataValue {
    #[default]
    Unset,
    Bytes(Vec<u8>),
    Json(Value),
}

impl CustomDataValue {
    pub fn is_unset(&self) -> bool {
        matches!(self, CustomDataValue::Unset)
    }

    fn describe(&self) -> String {
        match self {
            CustomDataValue::Unset => "<unset>".to_string(),
            CustomDataValue::Bytes(b) => format!("{:?}", b),
            CustomDataValue::Json(v) => v.to_string(),
        }
    }
}

impl From<Vec<u8>> for CustomDataValue {
    fn from(bytes: Vec<u8>) -> Self {
        CustomDataValue::Bytes(bytes)
    }
}

impl From<&[u8]> for CustomDataValue {
    fn from(bytes: &[u8]) -> Self {
        CustomDataValue::Bytes(bytes.to_vec())
    }
}

impl From<Value> for CustomDataValue {
    fn from(value: Value) -> Self {
        CustomDataValue::Json(value)
    }
}

/// Payload plus its declared content type
#[derive(Debug, Clone, Default)]
pub struct CustomData {
    value: CustomDataValue,
    content_type: String,
}

impl CustomData {
    pub fn value(&self) -> &CustomDataValue {
        &self.value
    }

    /// Declared content type, empty when unset
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_unset()
    }

    /// Replace the payload. Non-JSON content types only accept bytes; on
    /// error nothing is changed. A JSON `null` payload stores nothing.
    pub fn set(&mut self, content_type: &str, data: impl Into<CustomDataValue>) -> Result<()> {
        let data = data.into();
        let json = is_json_content_type(content_type);
        if !json {
            if let CustomDataValue::Json(_) = data {
                return Err(CdEventsError::CustomData(format!(
                    "{} data must be set as []bytes, got {}",
                    content_type,
                    data.describe()
                )));
            }
        }
        self.value = match data {
            CustomDataValue::Json(Value::Null) => CustomDataValue::Unset,
            CustomDataValue::Bytes(bytes)
                if json && matches!(serde_json::from_slice::<Value>(&bytes), Ok(Value::Null)) =>
            {
                CustomDataValue::Unset
            }
            other => other,
        };
        self.content_type = content_type.to_string();
        Ok(())
    }

    /// Serialize a typed value and store it as JSON content
    pub fn set_json<T: Serialize>(&mut self, content_type: &str, data: &T) -> Result<()> {
        let value = serde_json::to_value(data)?;
        self.set(content_type, CustomDataValue::Json(value))
    }

    pub fn clear(&mut self) {
        self.value = CustomDataValue::Unset;
        self.content_type.clear();
    }

    /// Decoded payload: structured JSON for JSON content, bytes otherwise
    pub fn get(&self) -> Result<CustomDataValue> {
        let json = is_json_content_type(&self.content_type);
        match (&self.value, json) {
            (CustomDataValue::Unset, _) => Ok(CustomDataValue::Unset),
            (CustomDataValue::Bytes(bytes), true) => {
                Ok(CustomDataValue::Json(serde_json::from_slice(bytes)?))
            }
            (CustomDataValue::Bytes(bytes), false) => Ok(CustomDataValue::Bytes(bytes.clone())),
            (CustomDataValue::Json(Value::String(s)), false) => {
                Ok(CustomDataValue::Bytes(STANDARD.decode(s)?))
            }
            (CustomDataValue::Json(Value::String(s)), true) => Err(CdEventsError::CustomData(format!(
                "content type {} should not be a string: {}",
                self.effective_content_type(),
                s
            ))),
            (CustomDataValue::Json(other), false) => Err(CdEventsError::CustomData(format!(
                "cannot use {} with content type {}",
                other, self.content_type
            ))),
            (CustomDataValue::Json(other), true) => Ok(CustomDataValue::Json(other.clone())),
        }
    }

    /// Payload as bytes. Stored bytes are returned as-is; structured values
    /// are JSON-encoded, which is only meaningful for JSON content.
    pub fn raw(&self) -> Result<Vec<u8>> {
        match &self.value {
            CustomDataValue::Bytes(bytes) => Ok(bytes.clone()),
            _ if !is_json_content_type(&self.content_type) => Err(CdEventsError::CustomData(
                format!("cannot marshal custom data with content type {}", self.content_type),
            )),
            CustomDataValue::Unset => Ok(serde_json::to_vec(&Value::Null)?),
            CustomDataValue::Json(value) => Ok(serde_json::to_vec(value)?),
        }
    }

    /// Decode the payload into a caller-chosen type; JSON content only
    pub fn decode_as<T: DeserializeOwned>(&self) -> Result<T> {
        if !is_json_content_type(&self.content_type) {
            return Err(CdEventsError::CustomData(format!(
                "cannot unmarshal content-type {}",
                self.content_type
            )));
        }
        Ok(serde_json::from_slice(&self.raw()?)?)
    }

    fn effective_content_type(&self) -> &str {
        if self.content_type.is_empty() {
            JSON_CONTENT_TYPE
        } else {
            &self.content_type
        }
    }

    /// The value written under `customData`
    fn wire_data(&self) -> Result<Option<Value>> {
        match &self.value {
            CustomDataValue::Unset => Ok(None),
            CustomDataValue::Json(value) => Ok(Some(value.clone()).filter(|v| !v.is_null())),
            CustomDataValue::Bytes(bytes) if is_json_content_type(&self.content_type) => {
                let value: Value = serde_json::from_slice(bytes)?;
                Ok(Some(value).filter(|v| !v.is_null()))
            }
            CustomDataValue::Bytes(bytes) => Ok(Some(Value::String(STANDARD.encode(bytes)))),
        }
    }
}

/// Equal when both would put the same document on the wire
impl PartialEq for CustomData {
    fn eq(&self, other: &Self) -> bool {
        if self.content_type != other.content_type {
            return false;
        }
        match (self.wire_data(), other.wire_data()) {
            (Ok(a), Ok(b)) => a == b,
            _ => self.value == other.value,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct CustomDataWire {
    #[serde(rename = "customData", default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(
        rename = "customDataContentType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    content_type: Option<String>,
}

impl Serialize for CustomData {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let data = self.wire_data().map_err(serde::ser::Error::custom)?;
        let content_type = (!self.content_type.is_empty()).then(|| self.content_type.clone());
        CustomDataWire { data, content_type }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CustomData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let wire = CustomDataWire::deserialize(deserializer)?;
        let value = match wire.data {
            None | Some(Value::Null) => CustomDataValue::Unset,
            Some(value) => CustomDataValue::Json(value),
        };
        Ok(CustomData {
            value,
            content_type: wire.content_type.unwrap_or_default(),
        })
    }
}
