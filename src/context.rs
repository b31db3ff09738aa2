//! Event context: the envelope metadata common to every event

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event_type::EventType;
use crate::links::EmbeddedLink;

/// Mandatory envelope fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Spec version of the envelope format
    pub version: String,
    pub id: String,
    /// URI-reference of the producer; `id` + `source` identify the occurrence
    pub source: String,
    #[serde(rename = "type")]
    pub ty: EventType,
    pub timestamp: DateTime<Utc>,
}

/// Context with the chain-of-custody extension fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextExtended {
    #[serde(flatten)]
    pub base: Context,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<EmbeddedLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_uri: Option<String>,
}

impl ContextExtended {
    pub fn new(base: Context) -> Self {
        Self {
            base,
            chain_id: None,
            links: Vec::new(),
            schema_uri: None,
        }
    }
}

/// Just enough of an incoming document to pick the shape to decode into
#[derive(Debug, Deserialize)]
pub(crate) struct EnvelopeProbe {
    pub context: ContextProbe,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContextProbe {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub version: String,
}
