//! # mm-attachments
//!
//! Attachment management core for Minutes RS forms.
//!
//! A bounded, policy-validated, asynchronously-uploaded collection of
//! files that stays consistent under concurrent user edits and under
//! the edit-mode load-then-populate cycle.
//!
//! ## Example
//!
//! ```rust,ignore
//! use mm_attachments::{
//!     AttachmentConfig, AttachmentController, AttachmentPolicy, FileDescriptor, MemoryUploader,
//! };
//! use std::sync::Arc;
//!
//! let controller = AttachmentController::new(
//!     AttachmentPolicy::default(),
//!     Arc::new(MemoryUploader::new()),
//!     AttachmentConfig::default(),
//! );
//!
//! let rejected = controller.add(vec![FileDescriptor::new("scan.pdf", bytes)]);
//! assert!(rejected.is_empty());
//! ```

pub mod collection;
pub mod controller;
pub mod coordinator;
pub mod model;
pub mod policy;
pub mod uploader;

pub use collection::AttachmentCollection;
pub use controller::{AttachmentConfig, AttachmentController, RejectedFile};
pub use coordinator::UploadCoordinator;
pub use model::{
    Attachment, AttachmentOrigin, AttachmentStatus, FileDescriptor, RemoteFile, extension_of,
};
pub use policy::{AttachmentPolicy, RejectReason};
pub use uploader::{generate_remote_ref, MemoryUploader, UploadError, UploadResult, Uploader};
