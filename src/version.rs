//! Lenient version handling for event-type and spec versions
//!
//! Version strings carried by events are not guaranteed to be semver: draft
//! suffixes and arbitrary trailing text are accepted by the type grammar.
//! [`EventVersion`] keeps the literal text and, when it can, a parsed
//! [`semver::Version`] used for major/minor/patch comparisons.

use semver::Version;
use std::fmt;

/// A version string as declared by an event, with its semver reading
#[derive(Debug, Clone)]
pub struct EventVersion {
    raw: String,
    semver: Option<Version>,
}

impl EventVersion {
    /// Parse leniently; never fails
    pub fn parse(version_str: &str) -> Self {
        let trimmed = version_str.strip_prefix('v').unwrap_or(version_str);
        Self {
            raw: version_str.to_string(),
            semver: parse_semver(trimmed),
        }
    }

    /// The literal version text
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The semver reading, if the text has one
    pub fn semver(&self) -> Option<&Version> {
        self.semver.as_ref()
    }

    /// Major component, `None` when the text is not a version
    pub fn major(&self) -> Option<u64> {
        self.semver.as_ref().map(|v| v.major)
    }

    /// Same major component. Two unreadable versions compare equal, mirroring
    /// how the type grammar treats them as opaque labels.
    pub fn same_major(&self, other: &EventVersion) -> bool {
        self.major() == other.major()
    }

    /// Check if this is a major version bump from another version
    pub fn is_major_bump_from(&self, other: &EventVersion) -> bool {
        match (&self.semver, &other.semver) {
            (Some(a), Some(b)) => a.major > b.major,
            _ => false,
        }
    }

    /// Classify this (declared) version against a supported one
    pub fn delta_from(&self, supported: &EventVersion) -> VersionDelta {
        let (Some(declared), Some(known)) = (&self.semver, &supported.semver) else {
            return if self.raw == supported.raw {
                VersionDelta::Same
            } else {
                VersionDelta::Unknown
            };
        };

        if declared.major != known.major {
            if declared.major > known.major {
                VersionDelta::NewerMajor
            } else {
                VersionDelta::OlderMajor
            }
        } else if declared.minor > known.minor {
            VersionDelta::NewerMinor
        } else if declared.minor < known.minor {
            VersionDelta::OlderMinor
        } else if declared.patch != known.patch {
            VersionDelta::Patch
        } else {
            VersionDelta::Same
        }
    }
}

impl fmt::Display for EventVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl PartialEq for EventVersion {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for EventVersion {}

/// How a declared version relates to the supported one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionDelta {
    Same,
    /// Patch differs, older or newer; no data loss by convention
    Patch,
    OlderMinor,
    /// Fields unknown to the supported shape are dropped
    NewerMinor,
    OlderMajor,
    NewerMajor,
    /// At least one side is not a readable version
    Unknown,
}

impl VersionDelta {
    /// Whether the declared version may be decoded into the supported shape
    pub fn is_compatible(&self) -> bool {
        !matches!(self, VersionDelta::NewerMajor | VersionDelta::OlderMajor)
    }

    /// Whether decoding may silently drop fields
    pub fn is_lossy(&self) -> bool {
        matches!(self, VersionDelta::NewerMinor)
    }
}

/// Strict semver first, then the `MAJOR[.MINOR[.PATCH]][-pre]` shorthand
fn parse_semver(text: &str) -> Option<Version> {
    if let Ok(v) = Version::parse(text) {
        return Some(v);
    }

    let core = text.split(['-', '+']).next().unwrap_or(text);
    let parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    let mut numbers = [0u64; 3];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *slot = part.parse().ok()?;
    }
    Some(Version::new(numbers[0], numbers[1], numbers[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parsing() {
        let v = EventVersion::parse("1.2.3");
        assert_eq!(v.major(), Some(1));
        assert_eq!(v.as_str(), "1.2.3");
    }

    #[test]
    fn test_version_with_v_prefix() {
        let v = EventVersion::parse("v1.2.3");
        assert_eq!(v.major(), Some(1));
        assert_eq!(v.to_string(), "v1.2.3");
    }

    #[test]
    fn test_draft_suffix_keeps_major() {
        let v = EventVersion::parse("0.1.2-draft");
        assert_eq!(v.major(), Some(0));
        assert_eq!(v.semver().map(|s| s.minor), Some(1));
    }

    #[test]
    fn test_shorthand_versions() {
        assert_eq!(EventVersion::parse("2").major(), Some(2));
        assert_eq!(EventVersion::parse("3.4").semver(), Some(&Version::new(3, 4, 0)));
    }

    #[test]
    fn test_unreadable_version() {
        let v = EventVersion::parse("123.a-da#@#");
        assert_eq!(v.major(), None);
        assert!(v.same_major(&EventVersion::parse("not-a-version")));
        assert!(!v.same_major(&EventVersion::parse("1.0.0")));
    }

    #[test]
    fn test_version_deltas() {
        let supported = EventVersion::parse("1.2.3");
        let delta = |s: &str| EventVersion::parse(s).delta_from(&supported);

        assert_eq!(delta("1.2.3"), VersionDelta::Same);
        assert_eq!(delta("1.2.999"), VersionDelta::Patch);
        assert_eq!(delta("1.2.0"), VersionDelta::Patch);
        assert_eq!(delta("1.999.0"), VersionDelta::NewerMinor);
        assert_eq!(delta("1.0.9"), VersionDelta::OlderMinor);
        assert_eq!(delta("999.0.0"), VersionDelta::NewerMajor);
        assert_eq!(delta("0.9.0"), VersionDelta::OlderMajor);

        assert!(delta("1.999.0").is_lossy());
        assert!(!delta("1.2.999").is_lossy());
        assert!(!delta("999.0.0").is_compatible());
    }

    #[test]
    fn test_bumps() {
        let base = EventVersion::parse("1.2.3");
        assert!(EventVersion::parse("2.0.0").is_major_bump_from(&base));
        assert!(!EventVersion::parse("1.3.0").is_major_bump_from(&base));
        assert!(!EventVersion::parse("0.9.0").is_major_bump_from(&base));
        assert!(!EventVersion::parse("draft").is_major_bump_from(&base));
    }
}
