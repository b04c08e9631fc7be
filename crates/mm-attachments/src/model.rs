//! Attachment model

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A candidate file handed to the controller for admission.
///
/// The bytes are kept alive by the coordinator for the lifetime of the
/// attachment so a failed upload can be retried without re-reading the
/// file.
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    /// Original filename as picked by the user
    pub filename: String,
    /// MIME content type
    pub content_type: String,
    /// File contents
    pub data: Bytes,
}

impl FileDescriptor {
    /// Create a descriptor, guessing the content type from the filename
    pub fn new(filename: impl Into<String>, data: Bytes) -> Self {
        let filename = filename.into();
        let content_type = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .to_string();
        Self {
            filename,
            content_type,
            data,
        }
    }

    /// Create a descriptor with an explicit content type
    pub fn with_content_type(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: Bytes,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }
}

/// An already-persisted file as returned by the record detail
/// endpoint, preloaded in edit mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Server-assigned uid
    pub uid: String,
    pub filename: String,
    pub remote_ref: String,
}

/// Per-attachment upload state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentStatus {
    Pending,
    Uploading,
    Done,
    Failed,
}

impl AttachmentStatus {
    /// Whether the upload reached a final state
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Where an attachment came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentOrigin {
    /// Picked by the user in this form session
    Local,
    /// Already persisted server-side, preloaded in edit mode
    Remote,
}

/// An attachment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Stable identity within a collection
    pub uid: String,
    /// Original filename
    pub filename: String,
    /// MIME content type
    pub content_type: String,
    /// File size in bytes (0 for remote placeholders)
    pub size_bytes: u64,
    /// Current upload state
    pub status: AttachmentStatus,
    /// Server-side reference, set once the upload completed
    pub remote_ref: Option<String>,
    /// Failure description, set while the upload is failed
    pub error_message: Option<String>,
    /// Local pick or edit-mode preload
    pub origin: AttachmentOrigin,
    /// When the attachment entered the collection
    pub added_at: DateTime<Utc>,
}

impl Attachment {
    /// Create a freshly admitted local attachment
    pub fn pending(uid: impl Into<String>, descriptor: &FileDescriptor) -> Self {
        Self {
            uid: uid.into(),
            filename: descriptor.filename.clone(),
            content_type: descriptor.content_type.clone(),
            size_bytes: descriptor.size_bytes(),
            status: AttachmentStatus::Pending,
            remote_ref: None,
            error_message: None,
            origin: AttachmentOrigin::Local,
            added_at: Utc::now(),
        }
    }

    /// Create a preloaded attachment for an already-persisted file.
    ///
    /// Remote attachments are done by definition; their bytes are not
    /// held client-side.
    pub fn remote(
        uid: impl Into<String>,
        filename: impl Into<String>,
        remote_ref: impl Into<String>,
    ) -> Self {
        let filename = filename.into();
        let content_type = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .to_string();
        Self {
            uid: uid.into(),
            filename,
            content_type,
            size_bytes: 0,
            status: AttachmentStatus::Done,
            remote_ref: Some(remote_ref.into()),
            error_message: None,
            origin: AttachmentOrigin::Remote,
            added_at: Utc::now(),
        }
    }

    /// Lower-cased extension after the last dot, empty if none
    pub fn extension(&self) -> String {
        extension_of(&self.filename)
    }

    pub fn is_done(&self) -> bool {
        self.status == AttachmentStatus::Done
    }

    pub fn is_failed(&self) -> bool {
        self.status == AttachmentStatus::Failed
    }

    pub fn is_remote(&self) -> bool {
        self.origin == AttachmentOrigin::Remote
    }
}

/// Lower-cased suffix after the last `.` of a filename, empty if there
/// is no dot
pub fn extension_of(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_attachment() {
        let descriptor = FileDescriptor::new("report.pdf", Bytes::from("pdf bytes"));
        let attachment = Attachment::pending("uid-1", &descriptor);

        assert_eq!(attachment.filename, "report.pdf");
        assert_eq!(attachment.content_type, "application/pdf");
        assert_eq!(attachment.size_bytes, 9);
        assert_eq!(attachment.status, AttachmentStatus::Pending);
        assert_eq!(attachment.origin, AttachmentOrigin::Local);
        assert!(attachment.remote_ref.is_none());
    }

    #[test]
    fn test_remote_attachment_is_done() {
        let attachment = Attachment::remote("srv-1", "guide.pdf", "refs/guide");

        assert!(attachment.is_done());
        assert!(attachment.is_remote());
        assert_eq!(attachment.size_bytes, 0);
        assert_eq!(attachment.remote_ref.as_deref(), Some("refs/guide"));
    }

    #[test]
    fn test_extension_derivation() {
        assert_eq!(extension_of("photo.JPG"), "jpg");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("noextension"), "");
        assert_eq!(extension_of("trailing."), "");
    }

    #[test]
    fn test_descriptor_content_type_guess() {
        let descriptor = FileDescriptor::new("slide.pptx", Bytes::new());
        assert!(descriptor.content_type.contains("presentation"));

        let explicit =
            FileDescriptor::with_content_type("data.bin", "application/octet-stream", Bytes::new());
        assert_eq!(explicit.content_type, "application/octet-stream");
    }

    #[test]
    fn test_status_settled() {
        assert!(!AttachmentStatus::Pending.is_settled());
        assert!(!AttachmentStatus::Uploading.is_settled());
        assert!(AttachmentStatus::Done.is_settled());
        assert!(AttachmentStatus::Failed.is_settled());
    }
}
