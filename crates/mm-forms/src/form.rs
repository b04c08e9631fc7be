//! Minutes form
//!
//! Owns the field state, the attachment controller, and the submission
//! gate for one create-or-edit session. Submission is refused until
//! the text fields validate and every attachment is done; a failed
//! save leaves all state untouched for re-submission.

use std::sync::Arc;

use mm_core::config::FormsConfig;
use mm_core::error::ValidationErrors;
use mm_core::result::ServiceResult;
use mm_core::traits::Id;
use mm_attachments::{
    AttachmentConfig, AttachmentController, AttachmentPolicy, FileDescriptor, RejectedFile,
    Uploader,
};
use tracing::{info, instrument, warn};

use crate::contract::MinutesContract;
use crate::model::{AttachmentRef, MinutesPayload};
use crate::store::{MinutesStore, StoreResult};

/// Whether the form creates a new record or edits an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { record_id: Id },
}

/// One minutes form session
pub struct MinutesForm {
    mode: FormMode,
    title: String,
    content: String,
    contract: MinutesContract,
    attachments: AttachmentController,
    config: FormsConfig,
    uploader: Arc<dyn Uploader>,
    store: Arc<dyn MinutesStore>,
}

impl MinutesForm {
    /// Start a blank form for a new record
    pub fn create(
        config: FormsConfig,
        uploader: Arc<dyn Uploader>,
        store: Arc<dyn MinutesStore>,
    ) -> Self {
        Self::with_mode(FormMode::Create, config, uploader, store)
    }

    /// Start a form for an existing record; call [`load`](Self::load)
    /// to populate it.
    pub fn edit(
        record_id: Id,
        config: FormsConfig,
        uploader: Arc<dyn Uploader>,
        store: Arc<dyn MinutesStore>,
    ) -> Self {
        Self::with_mode(FormMode::Edit { record_id }, config, uploader, store)
    }

    fn with_mode(
        mode: FormMode,
        config: FormsConfig,
        uploader: Arc<dyn Uploader>,
        store: Arc<dyn MinutesStore>,
    ) -> Self {
        let attachments = Self::build_controller(&config, Arc::clone(&uploader));
        Self {
            mode,
            title: String::new(),
            content: String::new(),
            contract: MinutesContract::new(config.title_max_length),
            attachments,
            config,
            uploader,
            store,
        }
    }

    fn build_controller(config: &FormsConfig, uploader: Arc<dyn Uploader>) -> AttachmentController {
        AttachmentController::new(
            AttachmentPolicy::from_settings(&config.attachments),
            uploader,
            AttachmentConfig::from_forms_config(config),
        )
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn record_id(&self) -> Option<Id> {
        match self.mode {
            FormMode::Create => None,
            FormMode::Edit { record_id } => Some(record_id),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// The attachment surface, for file picking and list rendering
    pub fn attachments(&self) -> &AttachmentController {
        &self.attachments
    }

    /// Convenience passthrough for the file picker
    pub fn add_files(&self, descriptors: Vec<FileDescriptor>) -> Vec<RejectedFile> {
        self.attachments.add(descriptors)
    }

    /// Populate an edit-mode form from the store. No-op for create
    /// mode. Preloaded attachments arrive done and never re-upload.
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> StoreResult<()> {
        let FormMode::Edit { record_id } = self.mode else {
            return Ok(());
        };

        let detail = self.store.fetch(record_id).await?;
        self.title = detail.title;
        self.content = detail.content;
        self.attachments.load_existing(detail.attachments);

        info!(record_id = record_id, "form populated");
        Ok(())
    }

    /// Errors currently blocking submission, if any
    pub fn blocking_errors(&self) -> Option<ValidationErrors> {
        let mut errors = match self.contract.validate(&self.title, &self.content) {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        self.collect_attachment_errors(&mut errors);

        if errors.is_empty() {
            None
        } else {
            Some(errors)
        }
    }

    fn collect_attachment_errors(&self, errors: &mut ValidationErrors) {
        let snapshot = self.attachments.snapshot();
        let minimum = self.config.attachments.required_minimum;

        if snapshot.len() < minimum {
            errors.add(
                "attachments",
                format!("at least {} file(s) must be attached", minimum),
            );
        }
        if snapshot.iter().any(|a| a.is_failed()) {
            errors.add("attachments", "remove or retry the failed files");
        }
        if snapshot.iter().any(|a| !a.status.is_settled()) {
            errors.add("attachments", "wait for uploads to finish");
        }
    }

    /// The single gate the surrounding UI consults
    pub fn can_submit(&self) -> bool {
        self.contract.validate(&self.title, &self.content).is_ok() && self.attachments.is_ready()
    }

    fn payload(&self) -> MinutesPayload {
        MinutesPayload {
            id: self.record_id(),
            title: self.title.clone(),
            content: self.content.clone(),
            attachments: self
                .attachments
                .completed_refs()
                .into_iter()
                .map(|(uid, remote_ref)| AttachmentRef { uid, remote_ref })
                .collect(),
        }
    }

    /// Validate, package, and hand the record to the save collaborator.
    ///
    /// Refused outright while the gate is closed. A store failure is
    /// returned as a retryable error; the form keeps its state either
    /// way.
    #[instrument(skip(self), fields(mode = ?self.mode))]
    pub async fn submit(&self) -> ServiceResult<Id> {
        if let Some(errors) = self.blocking_errors() {
            return ServiceResult::failure(errors);
        }

        let payload = self.payload();
        match self.store.save(&payload).await {
            Ok(id) => {
                info!(id = id, "minutes submitted");
                ServiceResult::success(id).with_message("minutes saved")
            }
            Err(error) => {
                warn!(error = %error, "save failed");
                ServiceResult::failure_with_base_error(error.to_string())
            }
        }
    }

    /// Return the form to a pristine state, aborting outstanding
    /// uploads.
    pub fn reset(&mut self) {
        self.title.clear();
        self.content.clear();
        self.attachments.discard();
        self.attachments = Self::build_controller(&self.config, Arc::clone(&self.uploader));
    }
}
