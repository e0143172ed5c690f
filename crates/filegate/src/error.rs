//! Error and rejection types for the filegate crate.
//!
//! Rejections are values, not failures: [`RejectReason`] names the first
//! admission rule a candidate file violated. [`ConfigError`] is the only
//! error a caller can get back from this crate, and only at construction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a candidate file was refused admission.
///
/// Variants are listed in the order the validator evaluates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    /// Accepting the file would push the collection past `max_files`.
    #[error("Exceeds the maximum number of files allowed")]
    LimitExceeded,

    /// The file is larger than `max_file_size`.
    #[error("File size exceeds the maximum limit")]
    SizeExceeded,

    /// The file name has no extension, or one outside the allow-list.
    #[error("File extension is not allowed")]
    ExtensionNotAllowed,

    /// A MIME allow-list is configured but the file reports no MIME type.
    #[error("Unable to determine file type")]
    TypeUndetermined,

    /// The reported MIME type matches no allowed pattern.
    #[error("File MIME type is not allowed")]
    MimeNotAllowed,

    /// A file with the same name, size and modification time is already held.
    #[error("Duplicate file detected")]
    Duplicate,
}

impl RejectReason {
    /// Stable machine-readable code, identical to the serialized form.
    pub fn code(&self) -> &'static str {
        match self {
            Self::LimitExceeded => "LIMIT_EXCEEDED",
            Self::SizeExceeded => "SIZE_EXCEEDED",
            Self::ExtensionNotAllowed => "EXTENSION_NOT_ALLOWED",
            Self::TypeUndetermined => "TYPE_UNDETERMINED",
            Self::MimeNotAllowed => "MIME_NOT_ALLOWED",
            Self::Duplicate => "DUPLICATE",
        }
    }
}

/// A candidate that was refused, handed back to the caller with its reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection<F> {
    /// The refused file handle.
    pub file: F,
    /// The first rule it violated.
    pub reason: RejectReason,
}

impl<F> Rejection<F> {
    pub fn new(file: F, reason: RejectReason) -> Self {
        Self { file, reason }
    }
}

/// Admission policy validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("allowed extension must not be empty")]
    EmptyExtension,

    #[error("allowed extension must not contain '.', got {0:?}")]
    DottedExtension(String),

    #[error("allowed extension must be lowercase, got {0:?}")]
    UppercaseExtension(String),

    #[error("allowed MIME type must not be empty")]
    EmptyMimeType,

    #[error("allowed MIME type must have the form type/subtype or type/*, got {0:?}")]
    InvalidMimeType(String),
}
