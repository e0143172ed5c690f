//! Admission policy for a file collection.
//!
//! The policy is a plain record handed to the collection once, at
//! construction. It can be built in code with the `with_*` setters or parsed
//! from TOML:
//!
//! ```toml
//! allowed_extensions = ["png", "jpg"]
//! allowed_mime_types = ["image/*"]
//! max_file_size = 10485760
//! max_files = 5
//! allow_duplicates = false
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Rules a candidate file must satisfy to be admitted.
///
/// Every field is optional in TOML; an empty policy admits everything except
/// exact duplicates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct AdmissionPolicy {
    /// Lowercase extensions without the leading dot. Empty means any.
    pub allowed_extensions: BTreeSet<String>,

    /// Exact MIME types or `group/*` wildcards. Empty means any.
    pub allowed_mime_types: Vec<String>,

    /// Per-file byte ceiling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<u64>,

    /// Ceiling on the number of held files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_files: Option<usize>,

    /// Admit files whose name, size and modification time match a held file.
    pub allow_duplicates: bool,
}

impl AdmissionPolicy {
    /// A policy with no restrictions beyond duplicate suppression.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_allowed_mime_types<I, S>(mut self, mime_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_mime_types = mime_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    pub fn with_max_files(mut self, count: usize) -> Self {
        self.max_files = Some(count);
        self
    }

    pub fn with_allow_duplicates(mut self, allow: bool) -> Self {
        self.allow_duplicates = allow;
        self
    }

    /// Check the allow-lists are well formed.
    ///
    /// Extensions are compared after lowercasing the candidate's extension,
    /// so an uppercase or dotted entry could never match and is refused here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for ext in &self.allowed_extensions {
            if ext.is_empty() {
                return Err(ConfigError::EmptyExtension);
            }
            if ext.contains('.') {
                return Err(ConfigError::DottedExtension(ext.clone()));
            }
            if ext.chars().any(char::is_uppercase) {
                return Err(ConfigError::UppercaseExtension(ext.clone()));
            }
        }

        for mime in &self.allowed_mime_types {
            if mime.is_empty() {
                return Err(ConfigError::EmptyMimeType);
            }
            match mime.split_once('/') {
                Some((group, subtype)) if !group.is_empty() && !subtype.is_empty() => {}
                _ => return Err(ConfigError::InvalidMimeType(mime.clone())),
            }
        }

        Ok(())
    }

    /// Load a policy from a TOML file.
    ///
    /// A missing file is an error, not an empty policy.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read policy file: {}", path.display()))?;

        let policy = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse policy file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Loaded admission policy");
        Ok(policy)
    }

    /// Parse a policy from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| {
            anyhow::anyhow!("Invalid TOML policy: {}", format_toml_error(toml_str, &e))
        })
    }

    /// Serialize the policy to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize policy to TOML")
    }
}

/// Render a TOML error as its message plus a 1-based line and column.
fn format_toml_error(source: &str, error: &toml::de::Error) -> String {
    let message = error.message().trim_end();

    let Some(span) = error.span() else {
        return message.to_string();
    };
    let before = source.get(..span.start).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let column = before
        .rsplit_once('\n')
        .map_or(before, |(_, tail)| tail)
        .chars()
        .count()
        + 1;

    format!("{message} (line {line}, column {column})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_policy() {
        let policy = AdmissionPolicy::default();

        assert!(policy.allowed_extensions.is_empty());
        assert!(policy.allowed_mime_types.is_empty());
        assert_eq!(policy.max_file_size, None);
        assert_eq!(policy.max_files, None);
        assert!(!policy.allow_duplicates);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let policy = AdmissionPolicy::new()
            .with_allowed_extensions(["png", "jpg"])
            .with_allowed_mime_types(["image/*"])
            .with_max_file_size(1000)
            .with_max_files(3)
            .with_allow_duplicates(true);

        assert!(policy.allowed_extensions.contains("png"));
        assert!(policy.allowed_extensions.contains("jpg"));
        assert_eq!(policy.allowed_mime_types, vec!["image/*".to_string()]);
        assert_eq!(policy.max_file_size, Some(1000));
        assert_eq!(policy.max_files, Some(3));
        assert!(policy.allow_duplicates);
    }

    #[test]
    fn test_from_toml_empty() {
        let policy = AdmissionPolicy::from_toml("").unwrap();
        assert_eq!(policy, AdmissionPolicy::default());
    }

    #[test]
    fn test_from_toml_full() {
        let toml = r#"
allowed_extensions = ["pdf", "txt"]
allowed_mime_types = ["application/pdf", "text/*"]
max_file_size = 1048576
max_files = 4
allow_duplicates = true
"#;
        let policy = AdmissionPolicy::from_toml(toml).unwrap();

        assert_eq!(policy.allowed_extensions.len(), 2);
        assert_eq!(policy.allowed_mime_types.len(), 2);
        assert_eq!(policy.max_file_size, Some(1_048_576));
        assert_eq!(policy.max_files, Some(4));
        assert!(policy.allow_duplicates);
    }

    #[test]
    fn test_from_toml_wrong_type() {
        let result = AdmissionPolicy::from_toml("max_files = \"three\"");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Invalid TOML policy"), "got: {err}");
    }

    #[test]
    fn test_from_toml_error_reports_line() {
        let toml = "allowed_extensions = [\"png\"]\nmax_files = \"three\"\n";
        let err = AdmissionPolicy::from_toml(toml).unwrap_err().to_string();
        assert!(err.contains("(line 2, column"), "got: {err}");
    }

    #[test]
    fn test_format_toml_error_without_span_is_message_only() {
        let error = <toml::de::Error as serde::de::Error>::custom("bad policy");
        assert_eq!(format_toml_error("", &error), "bad policy");
    }

    #[test]
    fn test_toml_roundtrip() {
        let policy = AdmissionPolicy::new()
            .with_allowed_extensions(["csv"])
            .with_max_files(2);

        let toml = policy.to_toml().unwrap();
        assert!(!toml.contains("max_file_size"));

        let parsed = AdmissionPolicy::from_toml(&toml).unwrap();
        assert_eq!(parsed, policy);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("policy.toml");
        fs::write(&path, "max_files = 7\nallowed_extensions = [\"png\"]\n").unwrap();

        let policy = AdmissionPolicy::load(&path).unwrap();
        assert_eq!(policy.max_files, Some(7));
        assert!(policy.allowed_extensions.contains("png"));
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = AdmissionPolicy::load(temp_dir.path().join("absent.toml"));
        let err = format!("{:#}", result.unwrap_err());
        assert!(err.contains("Failed to read policy file"), "got: {err}");
    }

    #[test]
    fn test_load_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("policy.toml");
        fs::write(&path, "max_files = [").unwrap();

        let err = format!("{:#}", AdmissionPolicy::load(&path).unwrap_err());
        assert!(err.contains("Failed to parse policy file"), "got: {err}");
    }

    #[test]
    fn test_validate_extensions() {
        let empty = AdmissionPolicy::new().with_allowed_extensions([""]);
        assert_eq!(empty.validate(), Err(ConfigError::EmptyExtension));

        let dotted = AdmissionPolicy::new().with_allowed_extensions([".png"]);
        assert_eq!(
            dotted.validate(),
            Err(ConfigError::DottedExtension(".png".to_string()))
        );

        let upper = AdmissionPolicy::new().with_allowed_extensions(["PNG"]);
        assert_eq!(
            upper.validate(),
            Err(ConfigError::UppercaseExtension("PNG".to_string()))
        );
    }

    #[test]
    fn test_validate_mime_types() {
        let empty = AdmissionPolicy::new().with_allowed_mime_types([""]);
        assert_eq!(empty.validate(), Err(ConfigError::EmptyMimeType));

        for bad in ["image", "image/", "/png"] {
            let policy = AdmissionPolicy::new().with_allowed_mime_types([bad]);
            assert_eq!(
                policy.validate(),
                Err(ConfigError::InvalidMimeType(bad.to_string())),
                "pattern {bad:?}"
            );
        }

        let good = AdmissionPolicy::new().with_allowed_mime_types(["image/*", "text/plain"]);
        assert!(good.validate().is_ok());
    }

    #[test]
    fn test_zero_limits_are_valid() {
        let policy = AdmissionPolicy::new().with_max_files(0).with_max_file_size(0);
        assert!(policy.validate().is_ok());
    }
}
