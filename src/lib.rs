//! CDEvents SDK
//!
//! Typed CDEvents envelopes with versioned JSON Schemas, JSON
//! (de)serialization and cross-version compatibility rules for consuming
//! events produced by older or newer SDKs.
//!
//! ## Features
//!
//! - **Type Identity**: `dev.cdevents.<subject>.<predicate>.<version>` and
//!   custom `dev.cdeventsx.<tool>-<subject>...` type strings
//! - **Local Schema DB**: JSON Schemas compiled into the binary, resolved by
//!   spec version, subject and predicate
//! - **Version Negotiation**: major versions gate compatibility; newer minors
//!   decode lossily, patches losslessly
//! - **Custom Data**: JSON or binary payloads, base64 on the wire
//! - **Links**: PATH / END / RELATION chain-of-custody links
//!
//! ## Example
//!
//! ```no_run
//! use cdevents_sdk::{CdEvent, EventFactory, PipelineRunStartedEvent, SchemaResolver};
//!
//! let factory = EventFactory::new().with_source("/ci/pipelines");
//! let mut event: PipelineRunStartedEvent = factory.create();
//! event.set_subject_id("run-42");
//! event.content_mut().pipeline_name = "release".into();
//! event.content_mut().url = "https://ci.example.com/runs/42".into();
//! event.validate(SchemaResolver::global())?;
//!
//! let received = CdEvent::from_json(&event.to_json()?)?;
//! assert_eq!(received.id(), event.id());
//! # Ok::<(), cdevents_sdk::CdEventsError>(())
//! ```

pub mod catalogue;
pub mod checksum;
pub mod clock;
pub mod compatibility;
pub mod config;
pub mod context;
pub mod custom_data;
pub mod error;
pub mod event;
pub mod event_type;
pub mod links;
pub mod registry;
pub mod schema;
pub mod subject;
pub mod version;

pub use catalogue::*;
pub use checksum::Checksum;
pub use clock::{Clock, FixedClock, IdGenerator, SequentialIds, SystemClock, UuidGenerator};
pub use compatibility::{check_spec_version, negotiate_event_type, Negotiation};
pub use config::SdkConfig;
pub use context::{Context, ContextExtended};
pub use custom_data::{CustomData, CustomDataValue, JSON_CONTENT_TYPE};
pub use error::{CdEventsError, Result};
pub use event::{
    AnyEvent, CloudEventAttributes, CustomContent, CustomEvent, Event, EventContent, EventFactory,
    SPEC_VERSION,
};
pub use event_type::{EventRoot, EventType};
pub use links::{unmarshal_links_array, EmbeddedLink, EmbeddedLinkReference, LinkType};
pub use registry::SchemaResolver;
pub use schema::SchemaDocument;
pub use subject::{Reference, Subject};
pub use version::{EventVersion, VersionDelta};
