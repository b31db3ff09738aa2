//! Event type identity
//!
//! The dotted type string carried in `context.type`:
//!
//! ```text
//! dev.cdevents.<subject>.<predicate>.<version>
//! dev.cdeventsx.<tool>-<subject>.<predicate>.<version>
//! ```
//!
//! The version capture is deliberately permissive: anything non-empty after
//! the predicate is taken as the version, so draft suffixes survive parsing.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{CdEventsError, Result};
use crate::version::EventVersion;

/// Prefix of the standard vocabulary
pub const STANDARD_ROOT: &str = "dev.cdevents";
/// Prefix of tool-specific custom events
pub const CUSTOM_ROOT: &str = "dev.cdeventsx";

fn standard_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^dev\.cdevents\.([a-z]+)\.([a-z]+)\.(.+)$").expect("standard event type pattern")
    })
}

fn custom_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^dev\.cdeventsx\.([a-z]+)-([a-z]+)\.([a-z]+)\.(.+)$")
            .expect("custom event type pattern")
    })
}

/// Whether a name is a legal subject, predicate or tool segment
pub fn is_valid_segment(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_lowercase())
}

/// Which vocabulary an event type belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventRoot {
    Standard,
    Custom,
}

impl EventRoot {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventRoot::Standard => STANDARD_ROOT,
            EventRoot::Custom => CUSTOM_ROOT,
        }
    }
}

/// Parsed `(root, tool, subject, predicate, version)` identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventType {
    pub root: EventRoot,
    /// Only set for custom events
    pub tool: Option<String>,
    pub subject: String,
    pub predicate: String,
    pub version: String,
}

impl EventType {
    /// A standard-vocabulary type
    pub fn standard(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            root: EventRoot::Standard,
            tool: None,
            subject: subject.into(),
            predicate: predicate.into(),
            version: version.into(),
        }
    }

    /// A tool-specific custom type
    pub fn custom(
        tool: impl Into<String>,
        subject: impl Into<String>,
        predicate: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            root: EventRoot::Custom,
            tool: Some(tool.into()),
            subject: subject.into(),
            predicate: predicate.into(),
            version: version.into(),
        }
    }

    /// Parse a dotted type string, trying the standard pattern first
    pub fn parse(input: &str) -> Result<Self> {
        if let Some(caps) = standard_pattern().captures(input) {
            if caps.len() == 4 {
                return Ok(Self::standard(&caps[1], &caps[2], &caps[3]));
            }
        }
        if let Some(caps) = custom_pattern().captures(input) {
            if caps.len() == 5 {
                return Ok(Self::custom(&caps[1], &caps[2], &caps[3], &caps[4]));
            }
        }
        Err(CdEventsError::Parse(input.to_string()))
    }

    pub fn is_custom(&self) -> bool {
        self.root == EventRoot::Custom
    }

    /// Subject as it appears in the type string, tool-prefixed for custom events
    pub fn qualified_subject(&self) -> String {
        match &self.tool {
            Some(tool) => format!("{}-{}", tool, self.subject),
            None => self.subject.clone(),
        }
    }

    /// `<subject>_<predicate>`, the key used by fixture tables
    pub fn short(&self) -> String {
        if self.subject.is_empty() || self.predicate.is_empty() {
            return String::new();
        }
        format!("{}_{}", self.qualified_subject(), self.predicate)
    }

    /// Parsed view of the version
    pub fn event_version(&self) -> EventVersion {
        EventVersion::parse(&self.version)
    }

    /// Same kind (root, tool, subject and predicate) and same major version
    pub fn is_compatible(&self, other: &EventType) -> bool {
        self.same_kind(other) && self.event_version().same_major(&other.event_version())
    }

    /// Same kind regardless of version
    pub fn same_kind(&self, other: &EventType) -> bool {
        self.root == other.root
            && self.tool == other.tool
            && self.subject == other.subject
            && self.predicate == other.predicate
    }

    /// Copy of this type carrying a different version
    pub fn with_version(&self, version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..self.clone()
        }
    }
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.is_empty() {
        placeholder
    } else {
        value
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.", self.root.as_str())?;
        if let Some(tool) = &self.tool {
            write!(f, "{}-", tool)?;
        }
        write!(
            f,
            "{}.{}.{}",
            or_placeholder(&self.subject, "<undefined-subject>"),
            or_placeholder(&self.predicate, "<undefined-predicate>"),
            or_placeholder(&self.version, "<undefined-version>"),
        )
    }
}

impl FromStr for EventType {
    type Err = CdEventsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        EventType::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard() {
        let t = EventType::parse("dev.cdevents.pipelinerun.started.0.2.0").unwrap();
        assert_eq!(t.root, EventRoot::Standard);
        assert_eq!(t.tool, None);
        assert_eq!(t.subject, "pipelinerun");
        assert_eq!(t.predicate, "started");
        assert_eq!(t.version, "0.2.0");
    }

    #[test]
    fn test_parse_custom() {
        let t = EventType::parse("dev.cdeventsx.mytool-resource.created.0.1.0").unwrap();
        assert_eq!(t.root, EventRoot::Custom);
        assert_eq!(t.tool.as_deref(), Some("mytool"));
        assert_eq!(t.subject, "resource");
        assert_eq!(t.predicate, "created");
        assert_eq!(t.short(), "mytool-resource_created");
        assert_eq!(t.to_string(), "dev.cdeventsx.mytool-resource.created.0.1.0");
    }

    #[test]
    fn test_permissive_version() {
        let t = EventType::parse("dev.cdevents.subject.predicate.123.a-da#@#").unwrap();
        assert_eq!(t.version, "123.a-da#@#");

        let t = EventType::parse("dev.cdevents.subject.predicate.0.1.2-draft").unwrap();
        assert_eq!(t.version, "0.1.2-draft");
    }

    #[test]
    fn test_parse_failures() {
        let err = EventType::parse("foo.bar.subject.predicate.0.1.2-draft").unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot parse event type foo.bar.subject.predicate.0.1.2-draft"
        );

        assert!(EventType::parse("dev.cdevents.Build.started.0.1.0").is_err());
        assert!(EventType::parse("dev.cdevents.build.started.").is_err());
        assert!(EventType::parse("dev.cdeventsx.build.started.0.1.0").is_err());
        assert!(EventType::parse("").is_err());
    }

    #[test]
    fn test_render_placeholders() {
        let t = EventType::standard("", "", "");
        assert_eq!(
            t.to_string(),
            "dev.cdevents.<undefined-subject>.<undefined-predicate>.<undefined-version>"
        );
        assert_eq!(t.short(), "");
    }

    #[test]
    fn test_render_parse_inverse() {
        for (subject, predicate, version) in [
            ("build", "finished", "0.2.0"),
            ("taskrun", "started", "1.0.0-draft"),
            ("x", "y", "9"),
        ] {
            let rendered = EventType::standard(subject, predicate, version).to_string();
            let reparsed = EventType::parse(&rendered).unwrap();
            assert_eq!(reparsed.to_string(), rendered);
        }
    }

    #[test]
    fn test_compatibility() {
        let base = EventType::standard("build", "started", "1.2.3");
        assert!(base.is_compatible(&base));
        assert!(base.is_compatible(&base.with_version("1.999.0")));
        assert!(base.is_compatible(&base.with_version("1.2.0")));
        assert!(!base.is_compatible(&base.with_version("2.0.0")));
        assert!(!base.is_compatible(&EventType::standard("build", "queued", "1.2.3")));
        assert!(!base.is_compatible(&EventType::standard("change", "started", "1.2.3")));
    }

    #[test]
    fn test_compatibility_respects_root_and_tool() {
        let mine = EventType::parse("dev.cdeventsx.mytool-build.started.0.2.0").unwrap();
        let theirs = EventType::parse("dev.cdeventsx.othertool-build.started.0.2.0").unwrap();
        let standard = EventType::parse("dev.cdevents.build.started.0.2.0").unwrap();

        assert!(mine.is_compatible(&mine.with_version("0.3.0")));
        assert!(!mine.is_compatible(&theirs));
        assert!(!mine.is_compatible(&standard));
        assert!(!standard.is_compatible(&mine));
    }

    #[test]
    fn test_serde_as_string() {
        let t = EventType::standard("build", "started", "0.2.0");
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"dev.cdevents.build.started.0.2.0\"");
        let back: EventType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);

        let bad: std::result::Result<EventType, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }
}
