//! The event envelope: context, subject and custom data
//!
//! [`Event<C>`] is generic over the subject content. Standard kinds plug in
//! through [`EventContent`], which pins the subject, predicate, event-type
//! version and subject type at compile time. Custom `dev.cdeventsx` events
//! use [`CustomContent`] and carry their identity at runtime.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

use crate::clock::{Clock, IdGenerator, SequentialIds, SystemClock, UuidGenerator};
use crate::compatibility::{check_spec_version, negotiate_event_type};
use crate::config::SdkConfig;
use crate::context::{Context, ContextExtended, EnvelopeProbe};
use crate::custom_data::{CustomData, CustomDataValue, JSON_CONTENT_TYPE};
use crate::error::{CdEventsError, Result};
use crate::event_type::{is_valid_segment, EventType};
use crate::links::EmbeddedLink;
use crate::registry::SchemaResolver;
use crate::schema::{custom_schema_url, event_schema_url};
use crate::subject::Subject;

/// Spec version this SDK produces and validates against
pub const SPEC_VERSION: &str = "0.4.1";

/// Subject content of a standard event kind
pub trait EventContent:
    Serialize + DeserializeOwned + Default + Clone + PartialEq + Debug
{
    /// Subject as written in the type string, e.g. `pipelinerun`
    const SUBJECT: &'static str;
    const PREDICATE: &'static str;
    /// Event-type version this shape implements
    const VERSION: &'static str;
    /// Value of `subject.type`, e.g. `pipelineRun`
    const SUBJECT_TYPE: &'static str;

    fn event_type() -> EventType {
        EventType::standard(Self::SUBJECT, Self::PREDICATE, Self::VERSION)
    }
}

/// Content of a custom event: any JSON object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomContent(pub serde_json::Map<String, Value>);

impl CustomContent {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// A tool-specific event outside the standard vocabulary
pub type CustomEvent = Event<CustomContent>;

/// One CDEvent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event<C> {
    context: ContextExtended,
    subject: Subject<C>,
    #[serde(flatten)]
    custom_data: CustomData,
}

impl<C> Event<C> {
    pub fn event_type(&self) -> &EventType {
        &self.context.base.ty
    }

    pub fn spec_version(&self) -> &str {
        &self.context.base.version
    }

    pub fn id(&self) -> &str {
        &self.context.base.id
    }

    pub fn source(&self) -> &str {
        &self.context.base.source
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.context.base.timestamp
    }

    pub fn context(&self) -> &ContextExtended {
        &self.context
    }

    pub fn chain_id(&self) -> Option<&str> {
        self.context.chain_id.as_deref()
    }

    pub fn links(&self) -> &[EmbeddedLink] {
        &self.context.links
    }

    pub fn schema_uri(&self) -> Option<&str> {
        self.context.schema_uri.as_deref()
    }

    pub fn subject(&self) -> &Subject<C> {
        &self.subject
    }

    pub fn subject_id(&self) -> &str {
        &self.subject.id
    }

    /// Subject source, defaulting to the context source
    pub fn subject_source(&self) -> &str {
        self.subject
            .source
            .as_deref()
            .unwrap_or(&self.context.base.source)
    }

    pub fn subject_type(&self) -> &str {
        &self.subject.subject_type
    }

    pub fn content(&self) -> &C {
        &self.subject.content
    }

    pub fn content_mut(&mut self) -> &mut C {
        &mut self.subject.content
    }

    pub fn custom_data(&self) -> &CustomData {
        &self.custom_data
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.context.base.id = id.into();
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.context.base.source = source.into();
    }

    pub fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.context.base.timestamp = timestamp;
    }

    pub fn set_chain_id(&mut self, chain_id: impl Into<String>) {
        self.context.chain_id = Some(chain_id.into());
    }

    pub fn add_link(&mut self, link: EmbeddedLink) {
        self.context.links.push(link);
    }

    pub fn set_links(&mut self, links: Vec<EmbeddedLink>) {
        self.context.links = links;
    }

    pub fn set_schema_uri(&mut self, schema_uri: impl Into<String>) {
        self.context.schema_uri = Some(schema_uri.into());
    }

    pub fn set_subject_id(&mut self, id: impl Into<String>) {
        self.subject.id = id.into();
    }

    pub fn set_subject_source(&mut self, source: impl Into<String>) {
        self.subject.source = Some(source.into());
    }

    pub fn set_content(&mut self, content: C) {
        self.subject.content = content;
    }

    /// See [`CustomData::set`]
    pub fn set_custom_data(
        &mut self,
        content_type: &str,
        data: impl Into<CustomDataValue>,
    ) -> Result<()> {
        self.custom_data.set(content_type, data)
    }

    /// Store a typed value as JSON custom data
    pub fn set_custom_data_json<T: Serialize>(&mut self, data: &T) -> Result<()> {
        self.custom_data.set_json(JSON_CONTENT_TYPE, data)
    }

    /// URL of the schema this event validates against
    pub fn schema_url(&self) -> String {
        let ty = self.event_type();
        if ty.is_custom() {
            custom_schema_url(SPEC_VERSION)
        } else {
            event_schema_url(SPEC_VERSION, &ty.subject, &ty.predicate)
        }
    }

    fn check_identity(&self) -> Result<()> {
        if self.id().is_empty() {
            return Err(CdEventsError::InvalidEvent("context id must not be empty".into()));
        }
        if self.source().is_empty() {
            return Err(CdEventsError::InvalidEvent("context source must not be empty".into()));
        }
        if self.subject_id().is_empty() {
            return Err(CdEventsError::InvalidEvent("subject id must not be empty".into()));
        }
        Ok(())
    }

    fn check_subject_type(&self, expected: &str) -> Result<()> {
        if self.subject.subject_type != expected {
            return Err(CdEventsError::InvalidSubjectType {
                expected: expected.to_string(),
                found: self.subject.subject_type.clone(),
            });
        }
        Ok(())
    }
}

impl<C: Serialize> Event<C> {
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check mandatory fields, then validate against the resolved schema
    pub fn validate(&self, resolver: &SchemaResolver) -> Result<()> {
        self.check_identity()?;
        let doc = resolver.resolve_type(SPEC_VERSION, self.event_type())?;
        resolver.validate(doc.url(), &self.to_value()?)
    }

    /// Transport envelope mapping: context id/source/type, subject id, and
    /// the whole event as data
    pub fn to_cloud_event(&self) -> Result<CloudEventAttributes> {
        Ok(CloudEventAttributes {
            specversion: "1.0".to_string(),
            id: self.id().to_string(),
            source: self.source().to_string(),
            ty: self.event_type().to_string(),
            subject: self.subject_id().to_string(),
            datacontenttype: JSON_CONTENT_TYPE.to_string(),
            data: self.to_value()?,
        })
    }
}

impl<C: EventContent> Event<C> {
    /// A fresh event stamped by `factory`
    pub fn new(factory: &EventFactory) -> Self {
        Self {
            context: factory.context(C::event_type()),
            subject: Subject::new(C::SUBJECT_TYPE),
            custom_data: CustomData::default(),
        }
    }

    /// Decode a received event, negotiating its declared versions against
    /// the ones this shape implements
    pub fn from_json(raw: &str) -> Result<Self> {
        let probe: EnvelopeProbe = serde_json::from_str(raw)?;
        let declared = EventType::parse(&probe.context.ty)?;
        let supported = C::event_type();
        negotiate_event_type(&declared, &supported)?;
        check_spec_version(&probe.context.version, SPEC_VERSION)?;

        let mut event: Self = serde_json::from_str(raw)?;
        event.check_subject_type(C::SUBJECT_TYPE)?;
        if event.context.base.ty != supported {
            tracing::debug!(
                declared = %event.context.base.ty,
                supported = %supported,
                "decoded into supported event shape"
            );
            event.context.base.ty = supported;
        }
        Ok(event)
    }
}

impl Event<CustomContent> {
    /// Decode a received custom event
    pub fn from_custom_json(raw: &str) -> Result<Self> {
        let probe: EnvelopeProbe = serde_json::from_str(raw)?;
        let declared = EventType::parse(&probe.context.ty)?;
        if !declared.is_custom() {
            return Err(CdEventsError::UnknownType(probe.context.ty));
        }
        check_spec_version(&probe.context.version, SPEC_VERSION)?;

        let event: Self = serde_json::from_str(raw)?;
        event.check_subject_type(&declared.qualified_subject())?;
        Ok(event)
    }
}

/// CloudEvents attributes for wrapping an event in a transport envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloudEventAttributes {
    pub specversion: String,
    pub id: String,
    pub source: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub subject: String,
    pub datacontenttype: String,
    pub data: Value,
}

/// Builds events with injected time and id sources
#[derive(Debug, Clone)]
pub struct EventFactory {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    source: String,
}

impl EventFactory {
    /// System clock, random UUIDs, empty default source
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
            source: String::new(),
        }
    }

    pub fn from_config(config: &SdkConfig) -> Self {
        let mut factory = Self::new().with_source(config.producer.default_source.clone());
        if let Some(prefix) = &config.producer.id_prefix {
            factory = factory.with_ids(SequentialIds::new(prefix.clone()));
        }
        factory
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_ids(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    /// Source stamped on new events
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// A standard event of kind `C`
    pub fn create<C: EventContent>(&self) -> Event<C> {
        Event::new(self)
    }

    /// A custom `dev.cdeventsx.<tool>-<subject>.<predicate>.<version>` event
    pub fn create_custom(
        &self,
        tool: &str,
        subject: &str,
        predicate: &str,
        version: &str,
    ) -> Result<CustomEvent> {
        let ty = EventType::custom(tool, subject, predicate, version);
        if ![tool, subject, predicate].iter().all(|s| is_valid_segment(s)) || version.is_empty() {
            return Err(CdEventsError::Parse(ty.to_string()));
        }
        let subject_type = ty.qualified_subject();
        Ok(Event {
            context: self.context(ty),
            subject: Subject::new(subject_type),
            custom_data: CustomData::default(),
        })
    }

    fn context(&self, ty: EventType) -> ContextExtended {
        ContextExtended::new(Context {
            version: SPEC_VERSION.to_string(),
            id: self.ids.next_id(),
            source: self.source.clone(),
            ty,
            timestamp: self.clock.now(),
        })
    }
}

impl Default for EventFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// Version-independent view over any event, used for dispatch
pub trait AnyEvent: Debug {
    fn event_type(&self) -> &EventType;
    fn id(&self) -> &str;
    fn source(&self) -> &str;
    fn subject_id(&self) -> &str;
    fn schema_url(&self) -> String;
    fn to_value(&self) -> Result<Value>;
    fn validate(&self, resolver: &SchemaResolver) -> Result<()>;
}

impl<C: Serialize + Debug> AnyEvent for Event<C> {
    fn event_type(&self) -> &EventType {
        Event::event_type(self)
    }

    fn id(&self) -> &str {
        Event::id(self)
    }

    fn source(&self) -> &str {
        Event::source(self)
    }

    fn subject_id(&self) -> &str {
        Event::subject_id(self)
    }

    fn schema_url(&self) -> String {
        Event::schema_url(self)
    }

    fn to_value(&self) -> Result<Value> {
        Event::to_value(self)
    }

    fn validate(&self, resolver: &SchemaResolver) -> Result<()> {
        Event::validate(self, resolver)
    }
}
