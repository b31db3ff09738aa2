//! Error types for the CDEvents SDK

use thiserror::Error;

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, CdEventsError>;

/// CDEvents SDK errors
#[derive(Error, Debug)]
pub enum CdEventsError {
    #[error("cannot parse event type {0}")]
    Parse(String),

    #[error("unknown event type {0}")]
    UnknownType(String),

    #[error("sdk event version {supported} not compatible with {declared}")]
    VersionIncompatible { supported: String, declared: String },

    #[error("spec version {declared} not compatible with sdk spec version {supported}")]
    SpecVersionIncompatible { supported: String, declared: String },

    #[error("{0}")]
    CustomData(String),

    #[error("unsupported link type {0} found")]
    UnsupportedLinkType(String),

    #[error("event {subject}/{predicate} not found for spec {spec_version} in local schema DB")]
    SchemaNotFound {
        spec_version: String,
        subject: String,
        predicate: String,
    },

    #[error("schema {0} not found in local schema DB")]
    SchemaUrlNotFound(String),

    #[error("cannot compile schema {url}: {reason}")]
    SchemaCompile { url: String, reason: String },

    #[error("event does not match schema {url}: {}", .errors.join("; "))]
    SchemaValidation { url: String, errors: Vec<String> },

    #[error("subject type {found} does not match {expected}")]
    InvalidSubjectType { expected: String, found: String },

    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}
