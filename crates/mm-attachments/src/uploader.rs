//! Upload collaborator boundary
//!
//! One file per call, returning an opaque server-side reference.
//! Implementations must be safe to retry with the same descriptor.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::model::FileDescriptor;

/// Upload failures surfaced onto the owning attachment
#[derive(Debug, Error)]
pub enum UploadError {
    /// The remote side validated and refused the file
    #[error("file rejected: {0}")]
    Rejected(String),
    /// Transport-level failure
    #[error("network error: {0}")]
    Network(String),
    /// The transfer exceeded its deadline
    #[error("upload timed out")]
    TimedOut,
    /// Anything else the backend reports
    #[error("upload backend error: {0}")]
    Backend(String),
}

pub type UploadResult<T> = Result<T, UploadError>;

/// Upload collaborator - transfers one file and yields its remote reference
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Transfer the file, returning an opaque remote reference
    async fn upload(&self, descriptor: &FileDescriptor) -> UploadResult<String>;

    /// Uploader name for logging
    fn name(&self) -> &str;
}

/// Generate an opaque remote reference for a stored file
pub fn generate_remote_ref(filename: &str) -> String {
    format!("uploads/{}/{}", Uuid::new_v4(), filename)
}

/// In-memory uploader for tests and local development
pub struct MemoryUploader {
    files: tokio::sync::RwLock<HashMap<String, Bytes>>,
}

impl Default for MemoryUploader {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryUploader {
    pub fn new() -> Self {
        Self {
            files: tokio::sync::RwLock::new(HashMap::new()),
        }
    }

    /// Fetch previously uploaded bytes by remote reference
    pub async fn stored(&self, remote_ref: &str) -> Option<Bytes> {
        let files = self.files.read().await;
        files.get(remote_ref).cloned()
    }

    pub async fn stored_count(&self) -> usize {
        let files = self.files.read().await;
        files.len()
    }
}

#[async_trait]
impl Uploader for MemoryUploader {
    async fn upload(&self, descriptor: &FileDescriptor) -> UploadResult<String> {
        let remote_ref = generate_remote_ref(&descriptor.filename);

        let mut files = self.files.write().await;
        files.insert(remote_ref.clone(), descriptor.data.clone());
        debug!(filename = %descriptor.filename, remote_ref = %remote_ref, "file stored in memory");

        Ok(remote_ref)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
