//! # filegate
//!
//! Admission control and queries for a client-side collection of
//! user-selected files, sitting between file-picker events and whatever
//! consumes the accepted set (usually an upload pipeline).
//!
//! ## Overview
//!
//! - **Policy**: extension and MIME allow-lists, a per-file size cap, a total
//!   count cap and duplicate suppression, fixed at construction
//! - **Validator**: pure checks that report the first rule a candidate breaks
//! - **Collection**: ordered entries with add/replace/remove/reset, lookups
//!   and derived statistics, published to subscribers one state at a time
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │      Input (picker, drag-drop, paste)   │  raw file handles
//! ├─────────────────────────────────────────┤
//! │             FileCollection              │  working snapshot per call
//! ├─────────────────────────────────────────┤
//! │               Validator                 │  capacity → size → type → dup
//! ├─────────────────────────────────────────┤
//! │     Subscribers (renderer, uploader)    │  one Snapshot per mutation
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use filegate::{AdmissionPolicy, FileCollection, RejectReason, UploadFile};
//!
//! let policy = AdmissionPolicy::new()
//!     .with_allowed_mime_types(["image/*"])
//!     .with_max_file_size(5 * 1024 * 1024);
//! let mut files: FileCollection = FileCollection::new(policy).unwrap();
//!
//! let outcome = files.add_files([
//!     UploadFile::new("cat.png", 2048).with_mime_type("image/png"),
//!     UploadFile::new("notes.txt", 64).with_mime_type("text/plain"),
//! ]);
//!
//! assert_eq!(outcome.added(), 1);
//! assert_eq!(outcome.rejected[0].reason, RejectReason::MimeNotAllowed);
//! assert_eq!(files.find_files_by_extension("png").len(), 1);
//! ```
//!
//! ## Modules
//!
//! - [`collection`]: the collection manager, entries and snapshots
//! - [`validator`]: the admission checks
//! - [`policy`]: the admission policy record and TOML loading
//! - [`file`]: the file handle abstraction
//! - [`id`]: entry ids and id generators
//! - [`error`]: rejection reasons and configuration errors

pub mod collection;
pub mod error;
pub mod file;
pub mod id;
pub mod policy;
pub mod validator;

pub use collection::{AddOutcome, CollectionStats, Entry, FileCollection, RemainingSlots, Snapshot};
pub use error::{ConfigError, RejectReason, Rejection};
pub use file::{FileLike, UploadFile};
pub use id::{EntryId, IdGenerator, SequentialIds, UuidGenerator};
pub use policy::AdmissionPolicy;
pub use validator::validate;
