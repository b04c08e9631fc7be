//! Attachment collection
//!
//! Ordered, capacity-bounded, uid-unique container. Every mutation
//! looks the item up by uid at call time, so a status write racing a
//! removal degrades to a no-op instead of resurrecting a deleted
//! entry.
//!
//! The collection knows nothing about uploads. Removal reports whether
//! an item actually left the collection; cancelling the bound upload
//! task is the caller's job.

use crate::model::{Attachment, AttachmentOrigin, AttachmentStatus, FileDescriptor};
use crate::policy::{AttachmentPolicy, RejectReason};

use tracing::warn;
use uuid::Uuid;

/// Ordered set of attachments owned by one form session
#[derive(Debug)]
pub struct AttachmentCollection {
    policy: AttachmentPolicy,
    items: Vec<Attachment>,
}

impl AttachmentCollection {
    pub fn new(policy: AttachmentPolicy) -> Self {
        Self {
            policy,
            items: Vec::new(),
        }
    }

    pub fn policy(&self) -> &AttachmentPolicy {
        &self.policy
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.items.iter().any(|a| a.uid == uid)
    }

    pub fn get(&self, uid: &str) -> Option<&Attachment> {
        self.items.iter().find(|a| a.uid == uid)
    }

    fn get_mut(&mut self, uid: &str) -> Option<&mut Attachment> {
        self.items.iter_mut().find(|a| a.uid == uid)
    }

    /// Run the admission policy and append a pending attachment.
    ///
    /// On rejection the collection is left untouched.
    pub fn try_admit(&mut self, descriptor: &FileDescriptor) -> Result<Attachment, RejectReason> {
        self.policy.admits(&descriptor.filename, self.items.len())?;

        let attachment = Attachment::pending(Uuid::new_v4().to_string(), descriptor);
        self.items.push(attachment.clone());
        Ok(attachment)
    }

    /// Append an already-persisted attachment (edit-mode preload).
    ///
    /// Extension rules do not apply to trusted server-side files, but
    /// the capacity bound and uid uniqueness still hold. Returns the
    /// entry when admitted.
    pub fn admit_remote(
        &mut self,
        uid: impl Into<String>,
        filename: impl Into<String>,
        remote_ref: impl Into<String>,
    ) -> Option<Attachment> {
        let uid = uid.into();
        if self.contains(&uid) {
            warn!(uid = %uid, "duplicate remote attachment ignored");
            return None;
        }
        if self.items.len() >= self.policy.max_count() {
            warn!(uid = %uid, max = self.policy.max_count(), "remote attachment over capacity ignored");
            return None;
        }

        let attachment = Attachment::remote(uid, filename, remote_ref);
        self.items.push(attachment.clone());
        Some(attachment)
    }

    /// Remove an attachment at any status.
    ///
    /// Returns whether a removal occurred; the caller cancels the
    /// in-flight upload when it did.
    pub fn remove(&mut self, uid: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|a| a.uid != uid);
        self.items.len() != before
    }

    /// Transition Pending -> Uploading. No-op for absent uids,
    /// remote-origin items, or any other starting state.
    pub fn mark_uploading(&mut self, uid: &str) -> bool {
        match self.get_mut(uid) {
            Some(item)
                if item.origin == AttachmentOrigin::Local
                    && item.status == AttachmentStatus::Pending =>
            {
                item.status = AttachmentStatus::Uploading;
                true
            }
            _ => false,
        }
    }

    /// Transition Uploading -> Done, recording the remote reference.
    pub fn mark_done(&mut self, uid: &str, remote_ref: impl Into<String>) -> bool {
        match self.get_mut(uid) {
            Some(item)
                if item.origin == AttachmentOrigin::Local
                    && item.status == AttachmentStatus::Uploading =>
            {
                item.status = AttachmentStatus::Done;
                item.remote_ref = Some(remote_ref.into());
                item.error_message = None;
                true
            }
            _ => false,
        }
    }

    /// Transition Uploading -> Failed, recording the failure reason.
    pub fn mark_failed(&mut self, uid: &str, error_message: impl Into<String>) -> bool {
        match self.get_mut(uid) {
            Some(item)
                if item.origin == AttachmentOrigin::Local
                    && item.status == AttachmentStatus::Uploading =>
            {
                item.status = AttachmentStatus::Failed;
                item.error_message = Some(error_message.into());
                item.remote_ref = None;
                true
            }
            _ => false,
        }
    }

    /// Transition Failed -> Pending ahead of a retry. The uid is kept;
    /// retry is not re-admission.
    pub fn mark_retrying(&mut self, uid: &str) -> bool {
        match self.get_mut(uid) {
            Some(item)
                if item.origin == AttachmentOrigin::Local
                    && item.status == AttachmentStatus::Failed =>
            {
                item.status = AttachmentStatus::Pending;
                item.error_message = None;
                true
            }
            _ => false,
        }
    }

    /// Read-only ordered view for rendering
    pub fn snapshot(&self) -> Vec<Attachment> {
        self.items.clone()
    }

    pub fn has_failed(&self) -> bool {
        self.items.iter().any(Attachment::is_failed)
    }

    /// Whether every item reached Done (vacuously true when empty)
    pub fn all_done(&self) -> bool {
        self.items.iter().all(Attachment::is_done)
    }
}
