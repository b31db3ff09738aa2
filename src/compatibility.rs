//! Version negotiation for received events
//!
//! Two tracks are checked independently. The event-type version must share
//! its major component with the version the SDK was built for; minor and
//! patch differences are accepted, a newer minor being decoded lossily. The
//! envelope spec version is accepted unless its major is newer than the SDK's.

use crate::error::{CdEventsError, Result};
use crate::event_type::EventType;
use crate::version::{EventVersion, VersionDelta};

/// Outcome of negotiating one received event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiation {
    /// Declared event-type version relative to the supported one
    pub delta: VersionDelta,
    /// Fields unknown to the supported shape may have been dropped
    pub lossy: bool,
}

/// Decide whether a declared event type can be decoded as `supported`
pub fn negotiate_event_type(declared: &EventType, supported: &EventType) -> Result<Negotiation> {
    if !declared.same_kind(supported) {
        return Err(CdEventsError::UnknownType(declared.to_string()));
    }
    if !supported.is_compatible(declared) {
        tracing::debug!(
            declared = %declared.version,
            supported = %supported.version,
            "rejecting event with incompatible major version"
        );
        return Err(CdEventsError::VersionIncompatible {
            supported: supported.version.clone(),
            declared: declared.version.clone(),
        });
    }

    let delta = declared.event_version().delta_from(&supported.event_version());
    let lossy = delta.is_lossy();
    if lossy {
        tracing::debug!(
            declared = %declared.version,
            supported = %supported.version,
            "newer minor version, unknown fields will be dropped"
        );
    }
    Ok(Negotiation { delta, lossy })
}

/// Decide whether a declared envelope spec version is acceptable
pub fn check_spec_version(declared: &str, supported: &str) -> Result<()> {
    let declared_version = EventVersion::parse(declared);
    let supported_version = EventVersion::parse(supported);
    if declared_version.is_major_bump_from(&supported_version) {
        return Err(CdEventsError::SpecVersionIncompatible {
            supported: supported.to_string(),
            declared: declared.to_string(),
        });
    }
    if declared != supported {
        tracing::trace!(declared, supported, "accepting event from a different spec version");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supported() -> EventType {
        EventType::standard("foosubject", "bar", "1.2.3")
    }

    #[test]
    fn test_newer_major_rejected() {
        let err = negotiate_event_type(&supported().with_version("999.0.0"), &supported()).unwrap_err();
        assert_eq!(err.to_string(), "sdk event version 1.2.3 not compatible with 999.0.0");
    }

    #[test]
    fn test_older_major_rejected() {
        let err = negotiate_event_type(&supported().with_version("0.9.0"), &supported()).unwrap_err();
        assert!(matches!(err, CdEventsError::VersionIncompatible { .. }));
    }

    #[test]
    fn test_minor_and_patch_accepted() {
        let n = negotiate_event_type(&supported().with_version("1.999.0"), &supported()).unwrap();
        assert_eq!(n.delta, VersionDelta::NewerMinor);
        assert!(n.lossy);

        for version in ["1.2.999", "1.2.0", "1.0.0", "1.2.3"] {
            let n = negotiate_event_type(&supported().with_version(version), &supported()).unwrap();
            assert!(!n.lossy, "{} should not be lossy", version);
        }
    }

    #[test]
    fn test_other_kind_is_unknown() {
        let other = EventType::standard("foosubject", "gazumped", "0.1.0");
        let err = negotiate_event_type(&other, &supported()).unwrap_err();
        assert_eq!(err.to_string(), "unknown event type dev.cdevents.foosubject.gazumped.0.1.0");
    }

    #[test]
    fn test_spec_versions() {
        assert!(check_spec_version("0.4.1", "0.4.1").is_ok());
        assert!(check_spec_version("0.3.0", "0.4.1").is_ok());
        assert!(check_spec_version("0.5.0-draft", "0.4.1").is_ok());
        assert!(check_spec_version("1.0.0", "0.4.1").is_err());
    }
}
