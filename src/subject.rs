//! Event subject and shared content building blocks

use serde::{Deserialize, Serialize};

/// The entity an event is about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject<C> {
    pub id: String,
    /// Falls back to the context source when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Fixed per event kind, e.g. `build` or `pipelineRun`
    #[serde(rename = "type")]
    pub subject_type: String,
    pub content: C,
}

impl<C: Default> Subject<C> {
    pub fn new(subject_type: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            source: None,
            subject_type: subject_type.into(),
            content: C::default(),
        }
    }
}

/// Reference to another subject by id and optional source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Reference {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subject_wire_form() {
        let mut subject: Subject<serde_json::Value> = Subject::new("build");
        subject.id = "build-1".into();
        subject.content = json!({});
        assert_eq!(
            serde_json::to_value(&subject).unwrap(),
            json!({"id": "build-1", "type": "build", "content": {}})
        );
    }

    #[test]
    fn test_reference() {
        let r = Reference::new("env-1").with_source("/envs");
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            json!({"id": "env-1", "source": "/envs"})
        );
        let bare: Reference = serde_json::from_value(json!({"id": "x"})).unwrap();
        assert_eq!(bare.source, None);
    }
}
