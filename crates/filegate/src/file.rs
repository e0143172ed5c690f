//! File handles as seen by the admission layer.
//!
//! The collection never touches file contents. It only needs the four
//! attributes a browser `File` reports, which [`FileLike`] exposes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Read access to the attributes admission decisions are made on.
pub trait FileLike {
    /// File name as reported by the picker, including any extension.
    fn name(&self) -> &str;

    /// Size in bytes.
    fn size(&self) -> u64;

    /// Reported MIME type. Empty when the source could not determine one.
    fn mime_type(&self) -> &str;

    /// Last modification time in milliseconds since the Unix epoch.
    fn last_modified(&self) -> i64;
}

impl<T: FileLike + ?Sized> FileLike for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn size(&self) -> u64 {
        (**self).size()
    }

    fn mime_type(&self) -> &str {
        (**self).mime_type()
    }

    fn last_modified(&self) -> i64 {
        (**self).last_modified()
    }
}

impl<T: FileLike + ?Sized> FileLike for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn size(&self) -> u64 {
        (**self).size()
    }

    fn mime_type(&self) -> &str {
        (**self).mime_type()
    }

    fn last_modified(&self) -> i64 {
        (**self).last_modified()
    }
}

/// Plain descriptor of a user-selected file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadFile {
    /// File name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Reported MIME type, possibly empty.
    #[serde(default)]
    pub mime_type: String,
    /// Last modification time (ms since epoch).
    #[serde(default)]
    pub last_modified: i64,
}

impl UploadFile {
    /// Create a descriptor with no MIME type and a zero timestamp.
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: String::new(),
            last_modified: 0,
        }
    }

    /// Set the reported MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Set the modification timestamp.
    pub fn with_last_modified(mut self, last_modified: i64) -> Self {
        self.last_modified = last_modified;
        self
    }
}

impl FileLike for UploadFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn last_modified(&self) -> i64 {
        self.last_modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_file_builder() {
        let file = UploadFile::new("photo.png", 2048)
            .with_mime_type("image/png")
            .with_last_modified(1_700_000_000_000);

        assert_eq!(file.name(), "photo.png");
        assert_eq!(file.size(), 2048);
        assert_eq!(file.mime_type(), "image/png");
        assert_eq!(file.last_modified(), 1_700_000_000_000);
    }

    #[test]
    fn test_upload_file_defaults() {
        let file = UploadFile::new("notes", 0);
        assert_eq!(file.mime_type(), "");
        assert_eq!(file.last_modified(), 0);
    }

    #[test]
    fn test_upload_file_deserialize_missing_optional_fields() {
        let file: UploadFile = serde_json::from_str(r#"{"name":"a.txt","size":10}"#).unwrap();
        assert_eq!(file, UploadFile::new("a.txt", 10));
    }

    #[test]
    fn test_shared_handles_delegate() {
        let shared: Arc<UploadFile> = Arc::new(UploadFile::new("a.txt", 3).with_mime_type("text/plain"));
        assert_eq!(shared.name(), "a.txt");
        assert_eq!(shared.mime_type(), "text/plain");

        let boxed: Box<dyn FileLike> = Box::new(UploadFile::new("b.bin", 7).with_last_modified(9));
        assert_eq!(boxed.size(), 7);
        assert_eq!(boxed.last_modified(), 9);
    }
}
