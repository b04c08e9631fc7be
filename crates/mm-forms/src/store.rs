//! Record store boundary
//!
//! The load and save collaborators of the minutes form. Saves are not
//! retried automatically; a failure is surfaced and the caller decides.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use mm_core::traits::Id;
use mm_attachments::RemoteFile;
use thiserror::Error;
use tracing::info;

use crate::model::{MinutesDetail, MinutesPayload};

/// Store failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("minutes record not found: {0}")]
    NotFound(Id),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Load/save collaborator for minutes records
#[async_trait]
pub trait MinutesStore: Send + Sync {
    /// Fetch a record with its persisted attachments
    async fn fetch(&self, id: Id) -> StoreResult<MinutesDetail>;

    /// Persist a submission, returning the record id
    async fn save(&self, payload: &MinutesPayload) -> StoreResult<Id>;
}

/// In-memory store for tests
pub struct MemoryMinutesStore {
    records: tokio::sync::RwLock<HashMap<Id, MinutesDetail>>,
    next_id: AtomicI64,
}

impl Default for MemoryMinutesStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryMinutesStore {
    pub fn new() -> Self {
        Self {
            records: tokio::sync::RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Seed an existing record (edit-mode fixtures)
    pub async fn insert(&self, detail: MinutesDetail) {
        let mut records = self.records.write().await;
        self.next_id.fetch_max(detail.id + 1, Ordering::SeqCst);
        records.insert(detail.id, detail);
    }

    pub async fn count(&self) -> usize {
        let records = self.records.read().await;
        records.len()
    }
}

#[async_trait]
impl MinutesStore for MemoryMinutesStore {
    async fn fetch(&self, id: Id) -> StoreResult<MinutesDetail> {
        let records = self.records.read().await;
        records.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn save(&self, payload: &MinutesPayload) -> StoreResult<Id> {
        let mut records = self.records.write().await;

        let id = match payload.id {
            Some(id) => {
                if !records.contains_key(&id) {
                    return Err(StoreError::NotFound(id));
                }
                id
            }
            None => self.next_id.fetch_add(1, Ordering::SeqCst),
        };

        let attachments = payload
            .attachments
            .iter()
            .map(|a| RemoteFile {
                uid: a.uid.clone(),
                filename: a
                    .remote_ref
                    .rsplit('/')
                    .next()
                    .unwrap_or(&a.remote_ref)
                    .to_string(),
                remote_ref: a.remote_ref.clone(),
            })
            .collect();

        let previous = records.get(&id);
        let detail = MinutesDetail {
            id,
            title: payload.title.clone(),
            content: payload.content.clone(),
            attachments,
            created_at: previous.and_then(|d| d.created_at).or_else(|| Some(chrono::Utc::now())),
            updated_at: Some(chrono::Utc::now()),
        };
        records.insert(id, detail);

        info!(id = id, "minutes record saved");
        Ok(id)
    }
}
