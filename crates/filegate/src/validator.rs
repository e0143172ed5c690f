//! The admission pipeline.
//!
//! [`validate`] runs four checks in a fixed order and reports the first one
//! that fails:
//!
//! 1. capacity ([`check_capacity`])
//! 2. size ([`check_size`])
//! 3. type, extension before MIME ([`check_type`])
//! 4. duplicate ([`check_duplicate`])
//!
//! All functions here are pure. The snapshot passed in is the collection as
//! it stood before the candidate, which during a batch includes candidates
//! accepted earlier in the same batch.

use crate::collection::Entry;
use crate::error::RejectReason;
use crate::file::FileLike;
use crate::policy::AdmissionPolicy;

/// Decide whether `candidate` may join `existing` under `policy`.
///
/// Returns `None` when the file is admissible.
pub fn validate<F: FileLike, M>(
    candidate: &F,
    existing: &[Entry<F, M>],
    policy: &AdmissionPolicy,
) -> Option<RejectReason> {
    check_capacity(existing.len(), policy)
        .or_else(|| check_size(candidate, policy))
        .or_else(|| check_type(candidate, policy))
        .or_else(|| check_duplicate(candidate, existing, policy))
}

/// Fails when one more file would exceed `max_files`.
pub fn check_capacity(current_count: usize, policy: &AdmissionPolicy) -> Option<RejectReason> {
    let max_files = policy.max_files?;
    if current_count.saturating_add(1) > max_files {
        return Some(RejectReason::LimitExceeded);
    }
    None
}

/// Fails when the file is strictly larger than `max_file_size`.
pub fn check_size<F: FileLike>(candidate: &F, policy: &AdmissionPolicy) -> Option<RejectReason> {
    let max_file_size = policy.max_file_size?;
    if candidate.size() > max_file_size {
        return Some(RejectReason::SizeExceeded);
    }
    None
}

/// Extension allow-list first, then MIME allow-list.
pub fn check_type<F: FileLike>(candidate: &F, policy: &AdmissionPolicy) -> Option<RejectReason> {
    if !policy.allowed_extensions.is_empty() {
        let allowed = file_extension(candidate.name())
            .is_some_and(|ext| policy.allowed_extensions.contains(&ext));
        if !allowed {
            return Some(RejectReason::ExtensionNotAllowed);
        }
    }

    if !policy.allowed_mime_types.is_empty() {
        let mime = candidate.mime_type();
        if mime.is_empty() {
            return Some(RejectReason::TypeUndetermined);
        }
        if !mime_matches(mime, policy.allowed_mime_types.as_slice()) {
            return Some(RejectReason::MimeNotAllowed);
        }
    }

    None
}

/// Fails when a held file has the same name, size and modification time.
pub fn check_duplicate<F: FileLike, M>(
    candidate: &F,
    existing: &[Entry<F, M>],
    policy: &AdmissionPolicy,
) -> Option<RejectReason> {
    if policy.allow_duplicates {
        return None;
    }

    let is_duplicate = existing.iter().any(|entry| same_file(entry.file(), candidate));
    is_duplicate.then_some(RejectReason::Duplicate)
}

/// Lowercased text after the last `.` of `name`.
///
/// `None` when there is no dot or nothing follows it.
pub fn file_extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Whether `mime` is matched by any of `patterns`.
///
/// A pattern ending in `/*` matches every type in its group; any other
/// pattern needs exact, case-sensitive equality.
pub fn mime_matches<S: AsRef<str>>(mime: &str, patterns: &[S]) -> bool {
    patterns.iter().any(|pattern| {
        let pattern = pattern.as_ref();
        match pattern.strip_suffix("/*") {
            Some(group) => mime
                .strip_prefix(group)
                .is_some_and(|rest| rest.starts_with('/')),
            None => mime == pattern,
        }
    })
}

fn same_file<A: FileLike, B: FileLike>(a: &A, b: &B) -> bool {
    a.name() == b.name() && a.size() == b.size() && a.last_modified() == b.last_modified()
}
