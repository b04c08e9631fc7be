//! Minutes record models
//!
//! The shapes exchanged with the load and save collaborators. List and
//! detail rendering live elsewhere; only the form's own boundary is
//! modeled here.

use chrono::{DateTime, Utc};
use mm_core::traits::{Id, Identifiable, Timestamped};
use mm_attachments::RemoteFile;
use serde::{Deserialize, Serialize};

/// A persisted minutes record as returned by the detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinutesDetail {
    pub id: Id,
    pub title: String,
    pub content: String,
    /// Already-persisted attachments, trusted as uploaded
    pub attachments: Vec<RemoteFile>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identifiable for MinutesDetail {
    fn id(&self) -> Option<Id> {
        Some(self.id)
    }
}

impl Timestamped for MinutesDetail {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

/// A completed upload referenced from a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub uid: String,
    pub remote_ref: String,
}

/// What the form hands to the save collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinutesPayload {
    /// Present when updating an existing record (the hidden id field)
    pub id: Option<Id>,
    pub title: String,
    pub content: String,
    /// Only Done attachments contribute here
    pub attachments: Vec<AttachmentRef>,
}

impl Identifiable for MinutesPayload {
    fn id(&self) -> Option<Id> {
        self.id
    }
}
