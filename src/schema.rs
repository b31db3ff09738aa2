//! Schema documents and their canonical URLs

use jsonschema::JSONSchema;
use std::sync::OnceLock;

use crate::checksum::Checksum;

/// Host and path prefix shared by every CDEvents schema identifier
pub const SCHEMA_BASE_URL: &str = "https://cdevents.dev";

/// Canonical URL of a standard event schema
///
/// `https://cdevents.dev/<specVersion>/schema/<subject>-<predicate>-event`
pub fn event_schema_url(spec_version: &str, subject: &str, predicate: &str) -> String {
    format!(
        "{}/{}/schema/{}-{}-event",
        SCHEMA_BASE_URL, spec_version, subject, predicate
    )
}

/// URL of the single schema shared by all custom events of a spec version
pub fn custom_schema_url(spec_version: &str) -> String {
    format!("{}/{}/schema/custom", SCHEMA_BASE_URL, spec_version)
}

/// Prefix under which all documents of one spec version live
pub fn spec_prefix(spec_version: &str) -> String {
    format!("{}/{}/schema/", SCHEMA_BASE_URL, spec_version)
}

/// Spec version segment of a schema URL, if it is a CDEvents URL
pub fn spec_version_of(url: &str) -> Option<&str> {
    let rest = url.strip_prefix(SCHEMA_BASE_URL)?.strip_prefix('/')?;
    let (version, tail) = rest.split_once('/')?;
    tail.starts_with("schema/").then_some(version)
}

/// One JSON Schema document from the local DB
pub struct SchemaDocument {
    url: String,
    path: String,
    source: &'static str,
    document: serde_json::Value,
    checksum: Checksum,
    compiled: OnceLock<JSONSchema>,
}

impl SchemaDocument {
    pub(crate) fn new(path: String, source: &'static str, document: serde_json::Value) -> Option<Self> {
        let url = document.get("$id")?.as_str()?.to_string();
        Some(Self {
            url,
            path,
            source,
            checksum: Checksum::from_bytes(source.as_bytes()),
            document,
            compiled: OnceLock::new(),
        })
    }

    /// The `$id` of this document
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Path of the document inside the embedded tree
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The document text as embedded
    pub fn source(&self) -> &'static str {
        self.source
    }

    pub fn document(&self) -> &serde_json::Value {
        &self.document
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    /// Spec version this document belongs to
    pub fn spec_version(&self) -> Option<&str> {
        spec_version_of(&self.url)
    }

    pub(crate) fn compiled(&self) -> &OnceLock<JSONSchema> {
        &self.compiled
    }
}

impl std::fmt::Debug for SchemaDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaDocument")
            .field("url", &self.url)
            .field("path", &self.path)
            .field("checksum", &self.checksum)
            .field("compiled", &self.compiled.get().is_some())
            .finish()
    }
}
