//! Compiled-in event kinds
//!
//! Every standard kind is one row of the `event_catalogue!` table below. A
//! row names the [`CdEvent`] variant, the content struct and its alias, and
//! the `(subject, predicate, version, subject type)` identity. The macro
//! derives the [`EventContent`] impls, the [`CdEvent`] sum type and the
//! dispatch used when decoding received events.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::EnvelopeProbe;
use crate::error::{CdEventsError, Result};
use crate::event::{AnyEvent, CustomEvent, Event, EventContent, EventFactory};
use crate::event_type::EventType;
use crate::registry::SchemaResolver;
use crate::subject::Reference;

/// Result of a pipeline or task run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Error,
    Failure,
    Cancel,
}

/// Software bill of materials location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sbom {
    pub uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactPackagedContent {
    pub change: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sbom: Option<Sbom>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactPublishedContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sbom: Option<Sbom>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSignedContent {
    pub signature: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildQueuedContent {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildStartedContent {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildFinishedContent {
    /// Package URL of the produced artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeCreatedContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<Reference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeMergedContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<Reference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunQueuedContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunStartedContent {
    pub pipeline_name: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunFinishedContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRunStartedContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_run: Option<Reference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRunFinishedContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_run: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDeployedContent {
    pub environment: Reference,
    pub artifact_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentDetectedContent {
    pub description: String,
    pub environment: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
}

macro_rules! event_catalogue {
    ($(
        $variant:ident($content:ident, $alias:ident) =>
            ($subject:literal, $predicate:literal, $version:literal, $subject_type:literal)
    ),* $(,)?) => {
        $(
            impl EventContent for $content {
                const SUBJECT: &'static str = $subject;
                const PREDICATE: &'static str = $predicate;
                const VERSION: &'static str = $version;
                const SUBJECT_TYPE: &'static str = $subject_type;
            }

            pub type $alias = Event<$content>;

            impl From<Event<$content>> for CdEvent {
                fn from(event: Event<$content>) -> Self {
                    CdEvent::$variant(event)
                }
            }
        )*

        /// Any event this SDK can decode
        #[derive(Debug, Clone, PartialEq)]
        pub enum CdEvent {
            $( $variant($alias), )*
            Custom(CustomEvent),
        }

        impl CdEvent {
            /// Types of every compiled-in standard kind
            pub fn known_types() -> Vec<EventType> {
                vec![$( <$content as EventContent>::event_type(), )*]
            }

            /// A fresh standard event of the named kind
            pub fn create(factory: &EventFactory, subject: &str, predicate: &str) -> Result<Self> {
                $(
                    if subject == $subject && predicate == $predicate {
                        return Ok(CdEvent::$variant(factory.create::<$content>()));
                    }
                )*
                Err(CdEventsError::UnknownType(
                    EventType::standard(subject, predicate, "").to_string(),
                ))
            }

            fn decode_standard(declared: &EventType, raw: &str) -> Option<Result<Self>> {
                $(
                    if declared.subject == $subject && declared.predicate == $predicate {
                        return Some(Event::<$content>::from_json(raw).map(CdEvent::$variant));
                    }
                )*
                None
            }

            pub fn set_subject_id(&mut self, id: impl Into<String>) {
                match self {
                    $( CdEvent::$variant(event) => event.set_subject_id(id), )*
                    CdEvent::Custom(event) => event.set_subject_id(id),
                }
            }

            /// Version-independent view of the wrapped event
            pub fn as_any(&self) -> &dyn AnyEvent {
                match self {
                    $( CdEvent::$variant(event) => event as &dyn AnyEvent, )*
                    CdEvent::Custom(event) => event as &dyn AnyEvent,
                }
            }
        }
    };
}

event_catalogue! {
    ArtifactPackaged(ArtifactPackagedContent, ArtifactPackagedEvent) =>
        ("artifact", "packaged", "0.2.0", "artifact"),
    ArtifactPublished(ArtifactPublishedContent, ArtifactPublishedEvent) =>
        ("artifact", "published", "0.2.0", "artifact"),
    ArtifactSigned(ArtifactSignedContent, ArtifactSignedEvent) =>
        ("artifact", "signed", "0.2.0", "artifact"),
    BuildQueued(BuildQueuedContent, BuildQueuedEvent) =>
        ("build", "queued", "0.2.0", "build"),
    BuildStarted(BuildStartedContent, BuildStartedEvent) =>
        ("build", "started", "0.2.0", "build"),
    BuildFinished(BuildFinishedContent, BuildFinishedEvent) =>
        ("build", "finished", "0.2.0", "build"),
    ChangeCreated(ChangeCreatedContent, ChangeCreatedEvent) =>
        ("change", "created", "0.3.0", "change"),
    ChangeMerged(ChangeMergedContent, ChangeMergedEvent) =>
        ("change", "merged", "0.2.0", "change"),
    PipelineRunQueued(PipelineRunQueuedContent, PipelineRunQueuedEvent) =>
        ("pipelinerun", "queued", "0.2.0", "pipelineRun"),
    PipelineRunStarted(PipelineRunStartedContent, PipelineRunStartedEvent) =>
        ("pipelinerun", "started", "0.2.0", "pipelineRun"),
    PipelineRunFinished(PipelineRunFinishedContent, PipelineRunFinishedEvent) =>
        ("pipelinerun", "finished", "0.2.0", "pipelineRun"),
    TaskRunStarted(TaskRunStartedContent, TaskRunStartedEvent) =>
        ("taskrun", "started", "0.2.0", "taskRun"),
    TaskRunFinished(TaskRunFinishedContent, TaskRunFinishedEvent) =>
        ("taskrun", "finished", "0.2.0", "taskRun"),
    ServiceDeployed(ServiceDeployedContent, ServiceDeployedEvent) =>
        ("service", "deployed", "0.2.0", "service"),
    IncidentDetected(IncidentDetectedContent, IncidentDetectedEvent) =>
        ("incident", "detected", "0.2.0", "incident"),
}

impl CdEvent {
    /// Decode a received event: read the declared type, pick the matching
    /// kind, then negotiate versions and decode the full document
    pub fn from_json(raw: &str) -> Result<Self> {
        let probe: EnvelopeProbe = serde_json::from_str(raw)?;
        let declared = EventType::parse(&probe.context.ty)?;
        if declared.is_custom() {
            return CustomEvent::from_custom_json(raw).map(CdEvent::Custom);
        }
        match Self::decode_standard(&declared, raw) {
            Some(result) => result,
            None => Err(CdEventsError::UnknownType(probe.context.ty)),
        }
    }

    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| CdEventsError::InvalidEvent(format!("event is not UTF-8: {}", e)))?;
        Self::from_json(text)
    }

    /// Supported type for a `(subject, predicate)` pair
    pub fn find_known(subject: &str, predicate: &str) -> Option<EventType> {
        Self::known_types()
            .into_iter()
            .find(|t| t.subject == subject && t.predicate == predicate)
    }

    pub fn event_type(&self) -> &EventType {
        self.as_any().event_type()
    }

    pub fn id(&self) -> &str {
        self.as_any().id()
    }

    pub fn source(&self) -> &str {
        self.as_any().source()
    }

    pub fn subject_id(&self) -> &str {
        self.as_any().subject_id()
    }

    pub fn schema_url(&self) -> String {
        self.as_any().schema_url()
    }

    pub fn to_value(&self) -> Result<Value> {
        self.as_any().to_value()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_value()?)?)
    }

    pub fn validate(&self, resolver: &SchemaResolver) -> Result<()> {
        self.as_any().validate(resolver)
    }
}

impl From<CustomEvent> for CdEvent {
    fn from(event: CustomEvent) -> Self {
        CdEvent::Custom(event)
    }
}

impl Serialize for CdEvent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FixedClock, SequentialIds};
    use chrono::{TimeZone, Utc};

    fn factory() -> EventFactory {
        EventFactory::new()
            .with_clock(FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()))
            .with_ids(SequentialIds::new("evt"))
            .with_source("/ci/runner")
    }

    #[test]
    fn test_every_kind_has_a_schema() {
        let resolver = SchemaResolver::global();
        for t in CdEvent::known_types() {
            assert!(
                resolver.resolve("0.4.1", &t.subject, &t.predicate).is_ok(),
                "no schema for {}",
                t
            );
        }
    }

    #[test]
    fn test_create_by_name() {
        let event = CdEvent::create(&factory(), "pipelinerun", "started").unwrap();
        assert!(matches!(event, CdEvent::PipelineRunStarted(_)));
        assert_eq!(event.event_type().to_string(), "dev.cdevents.pipelinerun.started.0.2.0");

        let err = CdEvent::create(&factory(), "build", "exploded").unwrap_err();
        assert!(matches!(err, CdEventsError::UnknownType(_)));
    }

    #[test]
    fn test_typed_construction_sets_identity() {
        let event: PipelineRunStartedEvent = factory().create();
        assert_eq!(event.subject_type(), "pipelineRun");
        assert_eq!(event.spec_version(), "0.4.1");
        assert_eq!(event.id(), "evt-1");
        assert_eq!(
            event.schema_url(),
            "https://cdevents.dev/0.4.1/schema/pipelinerun-started-event"
        );
    }

    #[test]
    fn test_set_subject_id_through_dispatch() {
        let mut event = CdEvent::create(&factory(), "service", "deployed").unwrap();
        event.set_subject_id("myService");
        assert_eq!(event.subject_id(), "myService");

        let mut custom: CdEvent = factory()
            .create_custom("mytool", "widget", "spun", "0.1.0")
            .unwrap()
            .into();
        custom.set_subject_id("widget-7");
        assert_eq!(custom.to_value().unwrap()["subject"]["id"], "widget-7");
    }

    #[test]
    fn test_find_known() {
        assert_eq!(
            CdEvent::find_known("change", "created").map(|t| t.version),
            Some("0.3.0".to_string())
        );
        assert!(CdEvent::find_known("foosubject", "gazumped").is_none());
    }

    #[test]
    fn test_outcome_wire_form() {
        assert_eq!(serde_json::to_value(Outcome::Cancel).unwrap(), "cancel");
    }
}
