//! The file collection manager.
//!
//! [`FileCollection`] owns an ordered list of admitted [`Entry`] values. Every
//! mutation builds the next state privately and publishes it in one step, so
//! subscribers never observe a half-applied batch.
//!
//! Lookups by id are no-ops when the id is unknown: removing, replacing or
//! re-tagging an absent entry leaves the collection untouched and publishes
//! nothing.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use tokio::sync::watch;
use tracing::{debug, info, trace};

use crate::error::{ConfigError, Rejection};
use crate::file::{FileLike, UploadFile};
use crate::id::{EntryId, IdGenerator, UuidGenerator};
use crate::policy::AdmissionPolicy;
use crate::validator;

/// One admitted file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry<F = UploadFile, M = serde_json::Value> {
    id: EntryId,
    file: F,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<M>,
}

impl<F, M> Entry<F, M> {
    pub(crate) fn new(id: EntryId, file: F) -> Self {
        Self {
            id,
            file,
            meta: None,
        }
    }

    /// Identifier assigned at admission.
    pub fn id(&self) -> &EntryId {
        &self.id
    }

    /// The file handle.
    pub fn file(&self) -> &F {
        &self.file
    }

    /// Caller-attached payload, if any.
    pub fn meta(&self) -> Option<&M> {
        self.meta.as_ref()
    }
}

/// Immutable, cheaply cloned view of the collection at one instant.
pub struct Snapshot<F = UploadFile, M = serde_json::Value>(Arc<Vec<Entry<F, M>>>);

impl<F, M> Snapshot<F, M> {
    fn new(entries: Vec<Entry<F, M>>) -> Self {
        Self(Arc::new(entries))
    }

    /// Whether both snapshots are the same published state.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<F: FileLike, M> Snapshot<F, M> {
    /// Sum of all file sizes in bytes, saturating at `u64::MAX`.
    pub fn total_size(&self) -> u64 {
        self.0
            .iter()
            .fold(0u64, |total, entry| total.saturating_add(entry.file.size()))
    }
}

impl<F, M> Clone for Snapshot<F, M> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<F, M> Default for Snapshot<F, M> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<F, M> Deref for Snapshot<F, M> {
    type Target = [Entry<F, M>];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl<F: fmt::Debug, M: fmt::Debug> fmt::Debug for Snapshot<F, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl<F: Serialize, M: Serialize> Serialize for Snapshot<F, M> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_slice().serialize(serializer)
    }
}

/// Result of an `add_file`/`add_files` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddOutcome<F> {
    /// Ids of admitted files, in input order.
    pub accepted: Vec<EntryId>,
    /// Refused files with their reasons, in input order.
    pub rejected: Vec<Rejection<F>>,
}

impl<F> AddOutcome<F> {
    /// Number of admitted files.
    pub fn added(&self) -> usize {
        self.accepted.len()
    }

    /// True when nothing was rejected.
    pub fn all_accepted(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// How many more files the collection can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainingSlots {
    /// No `max_files` configured.
    Unlimited,
    /// Free slots under `max_files`.
    Limited(usize),
}

impl RemainingSlots {
    /// Slot count, `None` when unlimited.
    pub fn count(&self) -> Option<usize> {
        match self {
            Self::Unlimited => None,
            Self::Limited(n) => Some(*n),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Limited(0))
    }
}

/// Derived statistics for renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub file_count: usize,
    pub total_size: u64,
    pub has_files: bool,
    pub remaining_slots: RemainingSlots,
}

/// Ordered collection of admitted files under an [`AdmissionPolicy`].
///
/// The policy is fixed at construction. All mutation goes through `&mut self`,
/// so a collection shared between threads needs an outer lock.
///
/// ```
/// use filegate::{AdmissionPolicy, FileCollection, RejectReason, UploadFile};
///
/// let policy = AdmissionPolicy::new().with_max_files(2);
/// let mut files: FileCollection = FileCollection::new(policy).unwrap();
///
/// let outcome = files.add_files([
///     UploadFile::new("a.txt", 1024),
///     UploadFile::new("b.txt", 2048),
///     UploadFile::new("c.txt", 3072),
/// ]);
///
/// assert_eq!(outcome.added(), 2);
/// assert_eq!(outcome.rejected[0].reason, RejectReason::LimitExceeded);
/// assert_eq!(files.file_count(), 2);
/// ```
pub struct FileCollection<F = UploadFile, M = serde_json::Value> {
    /// Admission rules, immutable after construction.
    policy: AdmissionPolicy,
    /// Current published state.
    entries: Snapshot<F, M>,
    /// Source of entry ids.
    ids: Box<dyn IdGenerator>,
    /// Publishes each new state to subscribers.
    observers: watch::Sender<Snapshot<F, M>>,
}

impl<F: FileLike, M> FileCollection<F, M> {
    /// Create an empty collection with random UUID entry ids.
    pub fn new(policy: AdmissionPolicy) -> Result<Self, ConfigError> {
        Self::with_id_generator(policy, UuidGenerator)
    }

    /// Create an empty collection that takes entry ids from `generator`.
    pub fn with_id_generator<G>(policy: AdmissionPolicy, generator: G) -> Result<Self, ConfigError>
    where
        G: IdGenerator + 'static,
    {
        policy.validate()?;

        let entries = Snapshot::default();
        let (observers, _) = watch::channel(entries.clone());

        Ok(Self {
            policy,
            entries,
            ids: Box::new(generator),
            observers,
        })
    }

    /// The policy this collection admits files under.
    pub fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }

    /// Subscribe to state changes.
    ///
    /// The receiver starts with the current state marked as seen. Each
    /// observable mutation publishes exactly one new snapshot; a slow reader
    /// only ever sees the latest.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<F, M>> {
        self.observers.subscribe()
    }

    /// Entries in admission order.
    pub fn files(&self) -> &[Entry<F, M>] {
        &self.entries
    }

    /// Shared handle to the current state.
    pub fn snapshot(&self) -> Snapshot<F, M> {
        self.entries.clone()
    }

    pub fn find_file_by_id<Q>(&self, id: &Q) -> Option<&Entry<F, M>>
    where
        Q: AsRef<str> + ?Sized,
    {
        let id = id.as_ref();
        self.entries.iter().find(|entry| entry.id.as_str() == id)
    }

    /// First entry, in admission order, whose file has exactly this name.
    pub fn find_file_by_name(&self, name: &str) -> Option<&Entry<F, M>> {
        self.entries.iter().find(|entry| entry.file.name() == name)
    }

    /// Entries whose name ends with `.ext`, ignoring case.
    pub fn find_files_by_extension(&self, ext: &str) -> Vec<&Entry<F, M>> {
        let suffix = format!(".{}", ext.to_lowercase());
        self.entries
            .iter()
            .filter(|entry| entry.file.name().to_lowercase().ends_with(&suffix))
            .collect()
    }

    /// Entries whose reported MIME type equals `mime` exactly.
    ///
    /// Wildcards are not expanded here.
    pub fn find_files_by_mime_type(&self, mime: &str) -> Vec<&Entry<F, M>> {
        self.entries
            .iter()
            .filter(|entry| entry.file.mime_type() == mime)
            .collect()
    }

    pub fn file_count(&self) -> usize {
        self.entries.len()
    }

    pub fn total_size(&self) -> u64 {
        self.entries.total_size()
    }

    pub fn has_files(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn can_add_more(&self) -> bool {
        match self.policy.max_files {
            Some(max_files) => self.file_count() < max_files,
            None => true,
        }
    }

    pub fn remaining_slots(&self) -> RemainingSlots {
        match self.policy.max_files {
            Some(max_files) => RemainingSlots::Limited(max_files.saturating_sub(self.file_count())),
            None => RemainingSlots::Unlimited,
        }
    }

    pub fn stats(&self) -> CollectionStats {
        CollectionStats {
            file_count: self.file_count(),
            total_size: self.total_size(),
            has_files: self.has_files(),
            remaining_slots: self.remaining_slots(),
        }
    }

    fn position<Q>(&self, id: &Q) -> Option<usize>
    where
        Q: AsRef<str> + ?Sized,
    {
        let id = id.as_ref();
        self.entries.iter().position(|entry| entry.id.as_str() == id)
    }

    fn publish(&mut self, entries: Vec<Entry<F, M>>) {
        self.entries = Snapshot::new(entries);
        self.observers.send_replace(self.entries.clone());
    }
}

impl<F, M> FileCollection<F, M>
where
    F: FileLike + Clone,
    M: Clone,
{
    /// Offer a single file. See [`FileCollection::add_files`].
    pub fn add_file(&mut self, file: F) -> AddOutcome<F> {
        self.add_files([file])
    }

    /// Offer files for admission, in order.
    ///
    /// Each candidate is validated against the collection as it stands after
    /// the candidates before it, so earlier acceptances count towards
    /// `max_files` and duplicate detection for later ones. Rejected files are
    /// returned and never enter the collection. The final state is published
    /// once, and only if something was admitted.
    pub fn add_files<I>(&mut self, files: I) -> AddOutcome<F>
    where
        I: IntoIterator<Item = F>,
    {
        let mut working = self.entries.to_vec();
        let mut outcome = AddOutcome {
            accepted: Vec::new(),
            rejected: Vec::new(),
        };

        for file in files {
            if let Some(reason) = validator::validate(&file, &working, &self.policy) {
                debug!(
                    file = file.name(),
                    size = file.size(),
                    reason = reason.code(),
                    "Rejected file"
                );
                outcome.rejected.push(Rejection::new(file, reason));
                continue;
            }

            let id = self.ids.next_id();
            debug!(id = %id, file = file.name(), size = file.size(), "Admitted file");
            outcome.accepted.push(id.clone());
            working.push(Entry::new(id, file));
        }

        if outcome.accepted.is_empty() {
            trace!(rejected = outcome.rejected.len(), "No files admitted");
            return outcome;
        }

        self.publish(working);
        info!(
            added = outcome.added(),
            rejected = outcome.rejected.len(),
            file_count = self.file_count(),
            "Updated file collection"
        );

        outcome
    }

    /// Remove the entry with this id, returning it.
    pub fn remove_file<Q>(&mut self, id: &Q) -> Option<Entry<F, M>>
    where
        Q: AsRef<str> + ?Sized,
    {
        let id = id.as_ref();
        let Some(index) = self.position(id) else {
            trace!(id, "remove_file: no such entry");
            return None;
        };

        let mut working = self.entries.to_vec();
        let removed = working.remove(index);
        self.publish(working);

        info!(id = %removed.id, file = removed.file.name(), "Removed file");
        Some(removed)
    }

    /// Remove every entry.
    pub fn reset(&mut self) {
        if self.entries.is_empty() {
            trace!("reset: collection already empty");
            return;
        }

        let cleared = self.file_count();
        self.publish(Vec::new());
        info!(cleared, "Reset file collection");
    }

    /// Swap the file behind an entry, keeping its id and meta.
    ///
    /// The new file is NOT run through the admission checks. Callers that
    /// need them should pre-check it with [`validator::check_size`] and
    /// [`validator::check_type`]; the capacity and duplicate checks do not
    /// apply, since the current snapshot still holds the entry being
    /// replaced. Returns the previous file, or `None` (and drops `new_file`)
    /// when the id is unknown.
    pub fn replace_file<Q>(&mut self, id: &Q, new_file: F) -> Option<F>
    where
        Q: AsRef<str> + ?Sized,
    {
        let id = id.as_ref();
        let Some(index) = self.position(id) else {
            trace!(id, "replace_file: no such entry");
            return None;
        };

        let mut working = self.entries.to_vec();
        let previous = std::mem::replace(&mut working[index].file, new_file);
        debug!(
            id,
            old = previous.name(),
            new = working[index].file.name(),
            "Replaced file"
        );
        self.publish(working);

        Some(previous)
    }

    /// Attach `meta` to an entry, replacing any previous payload.
    ///
    /// Returns `false` when the id is unknown.
    pub fn update_file_meta<Q>(&mut self, id: &Q, meta: M) -> bool
    where
        Q: AsRef<str> + ?Sized,
    {
        let id = id.as_ref();
        let Some(index) = self.position(id) else {
            trace!(id, "update_file_meta: no such entry");
            return false;
        };

        let mut working = self.entries.to_vec();
        working[index].meta = Some(meta);
        self.publish(working);

        debug!(id, "Updated file meta");
        true
    }
}

impl<F, M> fmt::Debug for FileCollection<F, M>
where
    F: fmt::Debug,
    M: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileCollection")
            .field("policy", &self.policy)
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}
