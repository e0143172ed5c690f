//! Entry identifiers and the generators that mint them.
//!
//! An [`EntryId`] is assigned when a file is admitted and never changes or
//! gets reused. Generation is a capability handed to the collection, so hosts
//! can swap random UUIDs for something deterministic.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of an admitted entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EntryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for EntryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Source of fresh entry identifiers.
///
/// Implementations must never return the same id twice over their lifetime;
/// the collection relies on this for id uniqueness across remove and reset.
pub trait IdGenerator: Send {
    fn next_id(&mut self) -> EntryId;
}

impl<G> IdGenerator for G
where
    G: FnMut() -> EntryId + Send,
{
    fn next_id(&mut self) -> EntryId {
        self()
    }
}

/// Random v4 UUIDs. The default generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&mut self) -> EntryId {
        EntryId(Uuid::new_v4().to_string())
    }
}

/// Monotonic `<prefix>-<n>` identifiers, starting at 1.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("file")
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> EntryId {
        let id = EntryId(format!("{}-{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}
