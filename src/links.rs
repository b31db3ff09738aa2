//! Chain-of-custody links carried in an event's context
//!
//! A link array mixes three shapes discriminated by `linkType`. Decoding is
//! two-pass: the tag is read first, then the element is decoded into the
//! matching variant. Array order is preserved.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{CdEventsError, Result};

/// Free-form annotations on a link
pub type LinkTags = BTreeMap<String, Value>;

/// Reference to another event by its context id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedLinkReference {
    pub context_id: String,
}

impl EmbeddedLinkReference {
    pub fn new(context_id: impl Into<String>) -> Self {
        Self {
            context_id: context_id.into(),
        }
    }
}

/// The event this one continues
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedLinkPath {
    pub from: EmbeddedLinkReference,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: LinkTags,
}

/// The last event of a chain, pointing back at its predecessor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedLinkEnd {
    pub from: EmbeddedLinkReference,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: LinkTags,
}

/// A typed relation to another event outside the causal path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedLinkRelation {
    pub link_kind: String,
    pub target: EmbeddedLinkReference,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: LinkTags,
}

/// Discriminant of an [`EmbeddedLink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkType {
    Path,
    End,
    Relation,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Path => "PATH",
            LinkType::End => "END",
            LinkType::Relation => "RELATION",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "PATH" => Some(LinkType::Path),
            "END" => Some(LinkType::End),
            "RELATION" => Some(LinkType::Relation),
            _ => None,
        }
    }
}

/// One element of `context.links`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "linkType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmbeddedLink {
    Path(EmbeddedLinkPath),
    End(EmbeddedLinkEnd),
    Relation(EmbeddedLinkRelation),
}

impl EmbeddedLink {
    pub fn path(from: impl Into<String>) -> Self {
        EmbeddedLink::Path(EmbeddedLinkPath {
            from: EmbeddedLinkReference::new(from),
            tags: LinkTags::new(),
        })
    }

    pub fn end(from: impl Into<String>) -> Self {
        EmbeddedLink::End(EmbeddedLinkEnd {
            from: EmbeddedLinkReference::new(from),
            tags: LinkTags::new(),
        })
    }

    pub fn relation(link_kind: impl Into<String>, target: impl Into<String>) -> Self {
        EmbeddedLink::Relation(EmbeddedLinkRelation {
            link_kind: link_kind.into(),
            target: EmbeddedLinkReference::new(target),
            tags: LinkTags::new(),
        })
    }

    /// Add a tag, replacing any previous value under the same key
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.tags_mut().insert(key.into(), value.into());
        self
    }

    pub fn link_type(&self) -> LinkType {
        match self {
            EmbeddedLink::Path(_) => LinkType::Path,
            EmbeddedLink::End(_) => LinkType::End,
            EmbeddedLink::Relation(_) => LinkType::Relation,
        }
    }

    pub fn tags(&self) -> &LinkTags {
        match self {
            EmbeddedLink::Path(l) => &l.tags,
            EmbeddedLink::End(l) => &l.tags,
            EmbeddedLink::Relation(l) => &l.tags,
        }
    }

    fn tags_mut(&mut self) -> &mut LinkTags {
        match self {
            EmbeddedLink::Path(l) => &mut l.tags,
            EmbeddedLink::End(l) => &mut l.tags,
            EmbeddedLink::Relation(l) => &mut l.tags,
        }
    }

    /// Context id this link points at
    pub fn context_id(&self) -> &str {
        match self {
            EmbeddedLink::Path(l) => &l.from.context_id,
            EmbeddedLink::End(l) => &l.from.context_id,
            EmbeddedLink::Relation(l) => &l.target.context_id,
        }
    }

    /// Decode one element: peek at `linkType`, then decode the matching shape
    pub fn from_value(value: Value) -> Result<Self> {
        #[derive(Deserialize)]
        struct Probe {
            #[serde(rename = "linkType")]
            link_type: Value,
        }

        let probe = Probe::deserialize(&value)?;
        let tag = match &probe.link_type {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        match LinkType::from_tag(&tag) {
            Some(LinkType::Path) => Ok(EmbeddedLink::Path(serde_json::from_value(value)?)),
            Some(LinkType::End) => Ok(EmbeddedLink::End(serde_json::from_value(value)?)),
            Some(LinkType::Relation) => Ok(EmbeddedLink::Relation(serde_json::from_value(value)?)),
            None => Err(CdEventsError::UnsupportedLinkType(tag)),
        }
    }
}

impl<'de> Deserialize<'de> for EmbeddedLink {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        EmbeddedLink::from_value(value).map_err(serde::de::Error::custom)
    }
}

/// Decode a raw JSON links array, preserving order
pub fn unmarshal_links_array(raw: &str) -> Result<Vec<EmbeddedLink>> {
    let elements: Vec<Value> = serde_json::from_str(raw)?;
    elements.into_iter().map(EmbeddedLink::from_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mixed_array_preserves_order() {
        let raw = r#"[
            {"linkType": "END", "from": {"contextId": "aaa"}, "tags": {"stage": "deploy"}},
            {"linkType": "RELATION", "linkKind": "ARTIFACT", "target": {"contextId": "bbb"}}
        ]"#;
        let links = unmarshal_links_array(raw).unwrap();
        assert_eq!(links.len(), 2);

        match &links[0] {
            EmbeddedLink::End(end) => {
                assert_eq!(end.from.context_id, "aaa");
                assert_eq!(end.tags.get("stage"), Some(&json!("deploy")));
            }
            other => panic!("Expected End, got {:?}", other),
        }
        match &links[1] {
            EmbeddedLink::Relation(rel) => {
                assert_eq!(rel.link_kind, "ARTIFACT");
                assert_eq!(rel.target.context_id, "bbb");
            }
            other => panic!("Expected Relation, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_link_type() {
        let err = unmarshal_links_array(r#"[{"linkType": "SIDEWAYS", "from": {"contextId": "a"}}]"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "unsupported link type SIDEWAYS found");
    }

    #[test]
    fn test_missing_link_type() {
        let err = unmarshal_links_array(r#"[{"from": {"contextId": "a"}}]"#).unwrap_err();
        assert!(matches!(err, CdEventsError::Json(_)));
    }

    #[test]
    fn test_serialize_writes_tag() {
        let link = EmbeddedLink::path("ctx-1").with_tag("attempt", 2);
        let value = serde_json::to_value(&link).unwrap();
        assert_eq!(
            value,
            json!({"linkType": "PATH", "from": {"contextId": "ctx-1"}, "tags": {"attempt": 2}})
        );

        let back: EmbeddedLink = serde_json::from_value(value).unwrap();
        assert_eq!(back, link);
        assert_eq!(back.link_type(), LinkType::Path);
        assert_eq!(back.context_id(), "ctx-1");
    }

    #[test]
    fn test_relation_requires_target() {
        let err = EmbeddedLink::from_value(json!({"linkType": "RELATION", "linkKind": "X"}));
        assert!(err.is_err());
    }
}
