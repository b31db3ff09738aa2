//! Local schema database
//!
//! The schema documents are compiled into the binary from `schemas/` and
//! indexed by their `$id` URL. The table is built once and never mutated;
//! compiled validators are cached per document on first use.

use include_dir::{include_dir, Dir, File};
use jsonschema::{Draft, JSONSchema};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use crate::checksum::Checksum;
use crate::error::{CdEventsError, Result};
use crate::event_type::EventType;
use crate::schema::{custom_schema_url, event_schema_url, spec_prefix, SchemaDocument};

static SCHEMA_DIR: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/schemas");

/// Resolves `(specVersion, subject, predicate)` to schema documents and
/// validates event JSON against them
#[derive(Debug)]
pub struct SchemaResolver {
    documents: BTreeMap<String, SchemaDocument>,
}

impl SchemaResolver {
    /// Build the resolver over the embedded schema tree
    pub fn embedded() -> Self {
        let mut files = Vec::with_capacity(64);
        collect_embedded_files(&SCHEMA_DIR, &mut files);
        Self::from_sources(files.into_iter().map(|file| {
            (
                file.path().to_string_lossy().into_owned(),
                file.contents_utf8().unwrap_or_default(),
            )
        }))
    }

    /// Process-wide resolver over the embedded tree, built on first use
    pub fn global() -> &'static SchemaResolver {
        static RESOLVER: OnceLock<SchemaResolver> = OnceLock::new();
        RESOLVER.get_or_init(SchemaResolver::embedded)
    }

    /// Build a resolver from `(path, source)` pairs; documents without a
    /// `$id` or that are not JSON are skipped
    pub fn from_sources(sources: impl IntoIterator<Item = (String, &'static str)>) -> Self {
        let mut documents = BTreeMap::new();
        for (path, source) in sources {
            let json: serde_json::Value = match serde_json::from_str(source) {
                Ok(json) => json,
                Err(e) => {
                    tracing::debug!(%path, error = %e, "skipping unparseable schema document");
                    continue;
                }
            };
            match SchemaDocument::new(path, source, json) {
                Some(doc) => {
                    documents.insert(doc.url().to_string(), doc);
                }
                None => tracing::debug!("skipping schema document without $id"),
            }
        }
        Self { documents }
    }

    /// Number of documents in the DB
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// All documents, ordered by URL
    pub fn documents(&self) -> impl Iterator<Item = &SchemaDocument> {
        self.documents.values()
    }

    /// Spec versions present in the DB
    pub fn spec_versions(&self) -> BTreeSet<&str> {
        self.documents
            .values()
            .filter_map(|doc| doc.spec_version())
            .collect()
    }

    /// Checksum over every document checksum, in URL order
    pub fn bundle_checksum(&self) -> Checksum {
        Checksum::combine(self.documents.values().map(|doc| doc.checksum()))
    }

    /// Look a document up by exact URL
    pub fn get(&self, url: &str) -> Option<&SchemaDocument> {
        self.documents.get(url)
    }

    /// Schema of a standard event kind
    pub fn resolve(
        &self,
        spec_version: &str,
        subject: &str,
        predicate: &str,
    ) -> Result<&SchemaDocument> {
        self.documents
            .get(&event_schema_url(spec_version, subject, predicate))
            .ok_or_else(|| CdEventsError::SchemaNotFound {
                spec_version: spec_version.to_string(),
                subject: subject.to_string(),
                predicate: predicate.to_string(),
            })
    }

    /// The shared schema for custom events of a spec version
    pub fn resolve_custom(&self, spec_version: &str) -> Result<&SchemaDocument> {
        self.documents
            .get(&custom_schema_url(spec_version))
            .ok_or_else(|| CdEventsError::SchemaNotFound {
                spec_version: spec_version.to_string(),
                subject: "custom".to_string(),
                predicate: "*".to_string(),
            })
    }

    /// Schema for an event type, taking the custom path when the type is custom
    pub fn resolve_type(&self, spec_version: &str, event_type: &EventType) -> Result<&SchemaDocument> {
        if event_type.is_custom() {
            self.resolve_custom(spec_version)
        } else {
            self.resolve(spec_version, &event_type.subject, &event_type.predicate)
        }
    }

    /// Documents sharing a spec version with `doc`, itself excluded
    fn siblings<'a>(&'a self, doc: &'a SchemaDocument) -> impl Iterator<Item = &'a SchemaDocument> {
        let prefix = doc.spec_version().map(spec_prefix);
        self.documents.values().filter(move |other| {
            other.url() != doc.url()
                && prefix
                    .as_deref()
                    .map(|p| other.url().starts_with(p))
                    .unwrap_or(false)
        })
    }

    /// Compiled validator for a document, with its siblings registered so
    /// relative `$ref`s resolve offline
    pub fn compile(&self, url: &str) -> Result<&JSONSchema> {
        let doc = self
            .get(url)
            .ok_or_else(|| CdEventsError::SchemaUrlNotFound(url.to_string()))?;
        if let Some(compiled) = doc.compiled().get() {
            return Ok(compiled);
        }

        let mut options = JSONSchema::options();
        options.with_draft(Draft::Draft7);
        for sibling in self.siblings(doc) {
            options.with_document(sibling.url().to_string(), sibling.document().clone());
        }
        let compiled = options
            .compile(doc.document())
            .map_err(|e| CdEventsError::SchemaCompile {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        tracing::debug!(url, "compiled schema");

        Ok(doc.compiled().get_or_init(|| compiled))
    }

    /// Validate a JSON document against the schema at `url`; all violations
    /// are reported in one error
    pub fn validate(&self, url: &str, instance: &serde_json::Value) -> Result<()> {
        let compiled = self.compile(url)?;
        if let Err(errors) = compiled.validate(instance) {
            let errors: Vec<String> = errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{}: {}", path, e)
                    }
                })
                .collect();
            return Err(CdEventsError::SchemaValidation {
                url: url.to_string(),
                errors,
            });
        }
        Ok(())
    }
}

impl Default for SchemaResolver {
    fn default() -> Self {
        Self::embedded()
    }
}

fn collect_embedded_files(dir: &'static Dir<'static>, files: &mut Vec<&'static File<'static>>) {
    for file in dir.files() {
        if file.path().extension().map(|e| e == "json").unwrap_or(false) {
            files.push(file);
        }
    }

    for subdir in dir.dirs() {
        collect_embedded_files(subdir, files);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_embedded_db_is_indexed_by_id() {
        let resolver = SchemaResolver::embedded();
        assert!(resolver.len() >= 20);
        assert!(resolver
            .get("https://cdevents.dev/0.4.1/schema/links/embeddedlinksarray")
            .is_some());
        assert_eq!(resolver.spec_versions().into_iter().collect::<Vec<_>>(), vec!["0.4.1"]);
    }

    #[test]
    fn test_resolve_standard() {
        let resolver = SchemaResolver::global();
        let doc = resolver.resolve("0.4.1", "pipelinerun", "started").unwrap();
        assert_eq!(
            doc.url(),
            "https://cdevents.dev/0.4.1/schema/pipelinerun-started-event"
        );
        assert!(doc.checksum().verify(doc.source().as_bytes()));
    }

    #[test]
    fn test_resolve_not_found() {
        let err = SchemaResolver::global()
            .resolve("0.4.1", "build", "exploded")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "event build/exploded not found for spec 0.4.1 in local schema DB"
        );

        assert!(SchemaResolver::global().resolve("9.9.9", "build", "started").is_err());
    }

    #[test]
    fn test_resolve_custom_type() {
        let t = EventType::custom("mytool", "widget", "spun", "0.1.0");
        let doc = SchemaResolver::global().resolve_type("0.4.1", &t).unwrap();
        assert_eq!(doc.url(), "https://cdevents.dev/0.4.1/schema/custom");
    }

    #[test]
    fn test_sibling_refs_compile() {
        let resolver = SchemaResolver::global();
        let url = "https://cdevents.dev/0.4.1/schema/build-started-event";
        assert!(resolver.compile(url).is_ok());
        // second call hits the cache
        assert!(resolver.compile(url).is_ok());
    }

    #[test]
    fn test_validation_aggregates_errors() {
        let resolver = SchemaResolver::global();
        let url = "https://cdevents.dev/0.4.1/schema/build-started-event";
        let err = resolver
            .validate(url, &json!({"context": {"id": ""}, "subject": {}}))
            .unwrap_err();
        match err {
            CdEventsError::SchemaValidation { url: failed, errors } => {
                assert_eq!(failed, url);
                assert!(errors.len() > 1);
            }
            other => panic!("Expected SchemaValidation, got {:?}", other),
        }
    }

    #[test]
    fn test_links_array_schema() {
        let resolver = SchemaResolver::global();
        let url = "https://cdevents.dev/0.4.1/schema/links/embeddedlinksarray";
        let links = json!([
            {"linkType": "END", "from": {"contextId": "abc"}},
            {"linkType": "RELATION", "linkKind": "TRIGGER", "target": {"contextId": "def"}}
        ]);
        assert!(resolver.validate(url, &links).is_ok());
        assert!(resolver
            .validate(url, &json!([{"linkType": "END", "linkKind": "x", "from": {"contextId": "a"}}]))
            .is_err());
    }

    #[test]
    fn test_unknown_url() {
        assert!(matches!(
            SchemaResolver::global().compile("https://cdevents.dev/0.4.1/schema/nothing"),
            Err(CdEventsError::SchemaUrlNotFound(_))
        ));
    }

    #[test]
    fn test_from_sources_skips_invalid() {
        let resolver = SchemaResolver::from_sources(vec![
            ("a.json".to_string(), "not json"),
            ("b.json".to_string(), "{}"),
            (
                "c.json".to_string(),
                r#"{"$id": "https://cdevents.dev/1.0.0/schema/custom", "type": "object"}"#,
            ),
        ]);
        assert_eq!(resolver.len(), 1);
        assert!(resolver.resolve_custom("1.0.0").is_ok());
        assert!(resolver
            .validate("https://cdevents.dev/1.0.0/schema/custom", &json!(3))
            .is_err());
    }
}
