//! Upload coordinator
//!
//! Runs one asynchronous upload task per admitted attachment. Tasks
//! are independent: they may finish in any order, and one item's
//! timeout or failure never touches another. Consistency with
//! user-driven removal relies on the collection's no-op-on-absent-uid
//! transitions; an aborted or late task can never write into a slot
//! that no longer exists.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::collection::AttachmentCollection;
use crate::model::FileDescriptor;
use crate::uploader::{UploadError, Uploader};

struct TaskEntry {
    /// Retained for retry; retry is not re-admission
    descriptor: FileDescriptor,
    handle: JoinHandle<()>,
}

/// Drives uploads for one attachment collection
pub struct UploadCoordinator {
    collection: Arc<RwLock<AttachmentCollection>>,
    uploader: Arc<dyn Uploader>,
    timeout: Duration,
    limiter: Option<Arc<Semaphore>>,
    tasks: Mutex<HashMap<String, TaskEntry>>,
}

impl UploadCoordinator {
    pub fn new(
        collection: Arc<RwLock<AttachmentCollection>>,
        uploader: Arc<dyn Uploader>,
        timeout: Duration,
        max_concurrent: Option<usize>,
    ) -> Self {
        Self {
            collection,
            uploader,
            timeout,
            limiter: max_concurrent.map(|n| Arc::new(Semaphore::new(n.max(1)))),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Start the upload task for a just-admitted attachment.
    ///
    /// Replaces any previous task bound to the same uid, so at most
    /// one task is ever live per attachment.
    pub fn spawn_upload(&self, uid: String, descriptor: FileDescriptor) {
        let handle = self.spawn_task(uid.clone(), descriptor.clone());

        let mut tasks = self.tasks.lock();
        if let Some(previous) = tasks.insert(uid, TaskEntry { descriptor, handle }) {
            previous.handle.abort();
        }
    }

    fn spawn_task(&self, uid: String, descriptor: FileDescriptor) -> JoinHandle<()> {
        let collection = Arc::clone(&self.collection);
        let uploader = Arc::clone(&self.uploader);
        let limiter = self.limiter.clone();
        let timeout = self.timeout;

        tokio::spawn(async move {
            // Queued until a transfer slot frees up; the item stays
            // Pending meanwhile.
            let _permit = match limiter {
                Some(semaphore) => match semaphore.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => return,
                },
                None => None,
            };

            if !collection.write().mark_uploading(&uid) {
                // Removed while queued.
                debug!(uid = %uid, "upload skipped, attachment gone");
                return;
            }
            debug!(uid = %uid, filename = %descriptor.filename, "upload started");

            let outcome = tokio::time::timeout(timeout, uploader.upload(&descriptor)).await;

            let mut items = collection.write();
            match outcome {
                Ok(Ok(remote_ref)) => {
                    if items.mark_done(&uid, &remote_ref) {
                        info!(uid = %uid, remote_ref = %remote_ref, "upload finished");
                    }
                }
                Ok(Err(error)) => {
                    if items.mark_failed(&uid, error.to_string()) {
                        warn!(uid = %uid, error = %error, "upload failed");
                    }
                }
                Err(_) => {
                    if items.mark_failed(&uid, UploadError::TimedOut.to_string()) {
                        warn!(uid = %uid, timeout = ?timeout, "upload timed out");
                    }
                }
            }
        })
    }

    /// Cancel the task bound to a removed attachment.
    ///
    /// The aborted task never reports success or failure; its
    /// descriptor is dropped with it.
    pub fn cancel(&self, uid: &str) {
        if let Some(entry) = self.tasks.lock().remove(uid) {
            entry.handle.abort();
            debug!(uid = %uid, "upload cancelled");
        }
    }

    /// Re-run the upload for a failed attachment.
    ///
    /// The uid is preserved and the admission policy is not consulted
    /// again; the replacement task reuses the original descriptor.
    /// Returns false for unknown uids or items not currently failed.
    pub fn retry(&self, uid: &str) -> bool {
        let descriptor = {
            let tasks = self.tasks.lock();
            match tasks.get(uid) {
                Some(entry) => entry.descriptor.clone(),
                None => return false,
            }
        };

        if !self.collection.write().mark_retrying(uid) {
            return false;
        }

        info!(uid = %uid, "upload retry");
        self.spawn_upload(uid.to_string(), descriptor);
        true
    }

    /// Abort everything outstanding. Called when the owning form is
    /// discarded; no task may write into a disposed collection.
    pub fn shutdown(&self) {
        let mut tasks = self.tasks.lock();
        if !tasks.is_empty() {
            debug!(count = tasks.len(), "aborting outstanding uploads");
        }
        for (_, entry) in tasks.drain() {
            entry.handle.abort();
        }
    }
}

impl Drop for UploadCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
