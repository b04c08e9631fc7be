//! # mm-forms
//!
//! Minutes form layer for Minutes RS.
//!
//! Binds the attachment management core into a create-or-edit form:
//! field validation, edit-mode population from the record store, and
//! the submission gate that packages the final payload.
//!
//! ## Example
//!
//! ```rust,ignore
//! use mm_core::config::FormsConfig;
//! use mm_forms::{MinutesForm, MemoryMinutesStore};
//! use mm_attachments::MemoryUploader;
//! use std::sync::Arc;
//!
//! let mut form = MinutesForm::create(
//!     FormsConfig::default(),
//!     Arc::new(MemoryUploader::new()),
//!     Arc::new(MemoryMinutesStore::new()),
//! );
//! form.set_title("Weekly sync");
//! form.set_content("Discussed roadmap");
//! // ... attach files, wait for readiness ...
//! if form.can_submit() {
//!     let result = form.submit().await;
//! }
//! ```

pub mod contract;
pub mod form;
pub mod model;
pub mod store;

pub use contract::{MinutesContract, ValidationResult};
pub use form::{FormMode, MinutesForm};
pub use model::{AttachmentRef, MinutesDetail, MinutesPayload};
pub use store::{MemoryMinutesStore, MinutesStore, StoreError, StoreResult};
