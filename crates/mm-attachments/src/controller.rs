//! Attachment controller
//!
//! The surface a form binds to: admit files, remove, retry, and a
//! derived readiness signal gating submission. The controller owns the
//! collection for exactly one form session and is discarded with it.

use std::sync::Arc;
use std::time::Duration;

use mm_core::config::FormsConfig;
use parking_lot::RwLock;
use tracing::{debug, instrument};

use crate::collection::AttachmentCollection;
use crate::coordinator::UploadCoordinator;
use crate::model::{Attachment, FileDescriptor, RemoteFile};
use crate::policy::{AttachmentPolicy, RejectReason};
use crate::uploader::Uploader;

/// Tuning for one controller instance
#[derive(Debug, Clone)]
pub struct AttachmentConfig {
    /// Minimum number of attachments required for readiness
    pub required_minimum: usize,
    /// Per-file upload deadline
    pub upload_timeout: Duration,
    /// Cap on simultaneous transfers (None = unbounded)
    pub max_concurrent_uploads: Option<usize>,
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            required_minimum: 1,
            upload_timeout: Duration::from_secs(30),
            max_concurrent_uploads: None,
        }
    }
}

impl AttachmentConfig {
    pub fn from_forms_config(config: &FormsConfig) -> Self {
        Self {
            required_minimum: config.attachments.required_minimum,
            upload_timeout: Duration::from_secs(config.upload_timeout_seconds),
            max_concurrent_uploads: config.max_concurrent_uploads,
        }
    }
}

/// A file refused admission, paired with the specific cause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFile {
    pub filename: String,
    pub reason: RejectReason,
}

/// Form-facing attachment surface
pub struct AttachmentController {
    collection: Arc<RwLock<AttachmentCollection>>,
    coordinator: UploadCoordinator,
    required_minimum: usize,
}

impl AttachmentController {
    pub fn new(policy: AttachmentPolicy, uploader: Arc<dyn Uploader>, config: AttachmentConfig) -> Self {
        let collection = Arc::new(RwLock::new(AttachmentCollection::new(policy)));
        let coordinator = UploadCoordinator::new(
            Arc::clone(&collection),
            uploader,
            config.upload_timeout,
            config.max_concurrent_uploads,
        );
        Self {
            collection,
            coordinator,
            required_minimum: config.required_minimum,
        }
    }

    /// Admit a batch of files, starting an upload per admitted file.
    ///
    /// Files are processed in order and earlier admissions count
    /// against capacity for later ones in the same call. Returns one
    /// entry per refused file; an empty vec means everything was
    /// admitted.
    #[instrument(skip(self, descriptors), fields(count = descriptors.len()))]
    pub fn add(&self, descriptors: Vec<FileDescriptor>) -> Vec<RejectedFile> {
        let mut rejected = Vec::new();

        for descriptor in descriptors {
            let admitted = self.collection.write().try_admit(&descriptor);
            match admitted {
                Ok(attachment) => {
                    self.coordinator.spawn_upload(attachment.uid, descriptor);
                }
                Err(reason) => {
                    debug!(filename = %descriptor.filename, reason = %reason, "file rejected");
                    rejected.push(RejectedFile {
                        filename: descriptor.filename,
                        reason,
                    });
                }
            }
        }

        rejected
    }

    /// Remove an attachment at any status, cancelling its upload.
    #[instrument(skip(self))]
    pub fn remove(&self, uid: &str) -> bool {
        let removed = self.collection.write().remove(uid);
        if removed {
            self.coordinator.cancel(uid);
        }
        removed
    }

    /// Retry a failed upload in place (same uid, no re-admission).
    #[instrument(skip(self))]
    pub fn retry(&self, uid: &str) -> bool {
        self.coordinator.retry(uid)
    }

    /// Preload already-persisted attachments in edit mode. They enter
    /// as Done and never upload.
    pub fn load_existing(&self, files: impl IntoIterator<Item = RemoteFile>) -> Vec<Attachment> {
        let mut items = self.collection.write();
        files
            .into_iter()
            .filter_map(|f| items.admit_remote(f.uid, f.filename, f.remote_ref))
            .collect()
    }

    /// Whether the attachment set permits submission: the minimum
    /// count is met and every item is Done. Pending, Uploading and
    /// Failed items all block.
    pub fn is_ready(&self) -> bool {
        let items = self.collection.read();
        items.len() >= self.required_minimum && items.all_done()
    }

    /// Ordered read-only view for rendering
    pub fn snapshot(&self) -> Vec<Attachment> {
        self.collection.read().snapshot()
    }

    /// References of completed uploads, in insertion order
    pub fn completed_refs(&self) -> Vec<(String, String)> {
        self.collection
            .read()
            .snapshot()
            .into_iter()
            .filter_map(|a| a.remote_ref.map(|r| (a.uid, r)))
            .collect()
    }

    /// Abort all outstanding work. Called when the owning form is
    /// unmounted or reset; also runs on drop.
    pub fn discard(&self) {
        self.coordinator.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uploader::{generate_remote_ref, MemoryUploader, UploadError, UploadResult};

    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn policy() -> AttachmentPolicy {
        AttachmentPolicy::new(["jpg", "png", "pdf"], ["exe", "zip"], 3)
    }

    fn descriptor(name: &str) -> FileDescriptor {
        FileDescriptor::new(name, Bytes::from_static(b"data"))
    }

    fn controller(required_minimum: usize) -> AttachmentController {
        AttachmentController::new(
            policy(),
            Arc::new(MemoryUploader::new()),
            AttachmentConfig {
                required_minimum,
                upload_timeout: Duration::from_millis(200),
                max_concurrent_uploads: None,
            },
        )
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Fails every upload of filenames containing "bad".
    struct SelectiveUploader;

    #[async_trait]
    impl Uploader for SelectiveUploader {
        async fn upload(&self, descriptor: &FileDescriptor) -> UploadResult<String> {
            if descriptor.filename.contains("bad") {
                return Err(UploadError::Rejected("scan flagged the file".into()));
            }
            Ok(generate_remote_ref(&descriptor.filename))
        }

        fn name(&self) -> &str {
            "selective"
        }
    }

    /// Fails the first N calls regardless of file, then succeeds.
    struct EventuallyUploader {
        failures_left: AtomicUsize,
    }

    #[async_trait]
    impl Uploader for EventuallyUploader {
        async fn upload(&self, descriptor: &FileDescriptor) -> UploadResult<String> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(UploadError::Network("connection reset".into()));
            }
            Ok(generate_remote_ref(&descriptor.filename))
        }

        fn name(&self) -> &str {
            "eventually"
        }
    }

    #[tokio::test]
    async fn test_batch_admission_reports_each_rejection() {
        let controller = controller(0);

        let rejected = controller.add(vec![
            descriptor("a.jpg"),
            descriptor("b.exe"),
            descriptor("c.png"),
            descriptor("d.pdf"),
            descriptor("e.pdf"),
        ]);

        assert_eq!(rejected.len(), 2);
        assert_eq!(rejected[0].filename, "b.exe");
        assert!(matches!(rejected[0].reason, RejectReason::Forbidden { .. }));
        assert_eq!(rejected[1].filename, "e.pdf");
        assert!(matches!(
            rejected[1].reason,
            RejectReason::CapacityExceeded { .. }
        ));

        let names: Vec<_> = controller
            .snapshot()
            .into_iter()
            .map(|a| a.filename)
            .collect();
        assert_eq!(names, ["a.jpg", "c.png", "d.pdf"]);
    }

    #[tokio::test]
    async fn test_ready_after_all_uploads_settle() {
        let controller = controller(1);
        assert!(!controller.is_ready());

        controller.add(vec![descriptor("a.jpg")]);
        wait_until(|| controller.snapshot()[0].is_done()).await;
        assert!(controller.is_ready());
    }

    #[tokio::test]
    async fn test_failed_item_blocks_readiness_until_removed() {
        let controller = AttachmentController::new(
            policy(),
            Arc::new(SelectiveUploader),
            AttachmentConfig {
                required_minimum: 0,
                upload_timeout: Duration::from_millis(200),
                max_concurrent_uploads: None,
            },
        );

        controller.add(vec![descriptor("good.jpg"), descriptor("bad.png")]);
        wait_until(|| {
            controller
                .snapshot()
                .iter()
                .all(|a| a.status.is_settled())
        })
        .await;
        assert!(!controller.is_ready());

        let failed_uid = controller
            .snapshot()
            .into_iter()
            .find(|a| a.is_failed())
            .unwrap()
            .uid;
        assert!(controller.remove(&failed_uid));
        assert!(controller.is_ready());
    }

    #[tokio::test]
    async fn test_minimum_count_still_required_after_removal() {
        let controller = AttachmentController::new(
            policy(),
            Arc::new(SelectiveUploader),
            AttachmentConfig {
                required_minimum: 1,
                upload_timeout: Duration::from_millis(200),
                max_concurrent_uploads: None,
            },
        );

        controller.add(vec![descriptor("bad.pdf")]);
        wait_until(|| controller.snapshot()[0].is_failed()).await;

        let uid = controller.snapshot()[0].uid.clone();
        controller.remove(&uid);

        // Empty set satisfies "all done" but not the minimum.
        assert!(!controller.is_ready());

        controller.add(vec![descriptor("good.pdf")]);
        wait_until(|| controller.is_ready()).await;
    }

    #[tokio::test]
    async fn test_retry_after_failure_reaches_done() {
        let controller = AttachmentController::new(
            policy(),
            Arc::new(EventuallyUploader {
                failures_left: AtomicUsize::new(1),
            }),
            AttachmentConfig::default(),
        );

        controller.add(vec![descriptor("a.jpg")]);
        wait_until(|| controller.snapshot()[0].is_failed()).await;
        assert!(!controller.is_ready());

        let uid = controller.snapshot()[0].uid.clone();
        assert!(controller.retry(&uid));
        wait_until(|| controller.is_ready()).await;

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].uid, uid);
    }

    #[tokio::test]
    async fn test_edit_mode_preload_then_new_upload() {
        let controller = controller(1);

        let loaded = controller.load_existing(vec![RemoteFile {
            uid: "srv-1".to_string(),
            filename: "old.pdf".to_string(),
            remote_ref: "refs/old".to_string(),
        }]);
        assert_eq!(loaded.len(), 1);
        assert!(controller.is_ready());

        controller.add(vec![descriptor("new.png")]);
        // The fresh upload blocks readiness until it settles as Done.
        assert!(!controller.is_ready());
        wait_until(|| controller.is_ready()).await;

        let refs = controller.completed_refs();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0], ("srv-1".to_string(), "refs/old".to_string()));
    }

    #[tokio::test]
    async fn test_remove_unknown_uid_is_noop() {
        let controller = controller(0);
        assert!(!controller.remove("nope"));
        assert!(!controller.retry("nope"));
    }

    #[tokio::test]
    async fn test_discard_stops_uploads() {
        let controller = controller(0);
        controller.add(vec![descriptor("a.jpg"), descriptor("b.png")]);
        controller.discard();

        tokio::time::sleep(Duration::from_millis(50)).await;
        // Whatever state the items froze in, nothing new is running,
        // and the controller still answers queries.
        assert_eq!(controller.snapshot().len(), 2);
    }
}
