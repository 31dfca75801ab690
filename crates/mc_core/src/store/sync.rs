//! Durable upload queue and the one-at-a-time sync cycle.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{error::StoreError, MatchStore};

/// One pending upload, one-to-one with a labeled media record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncQueueItem {
    pub id: Uuid,
    pub media_id: Uuid,
    pub label: String,
}

#[derive(Error, Debug)]
#[error("upload failed: {0}")]
pub struct UploadError(pub String);

/// Remote archive the queue drains into.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload(&self, item: &SyncQueueItem, payload: &[u8]) -> Result<(), UploadError>;
}

/// Injectable connectivity signal; a cycle runs only while online.
pub trait ConnectivityProbe: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Assume-online probe for wired setups and tests.
pub struct AlwaysOnline;

impl ConnectivityProbe for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// Drains the store's upload queue strictly one item at a time.
pub struct SyncWorker {
    store: Arc<MatchStore>,
    uploader: Arc<dyn MediaUploader>,
    connectivity: Arc<dyn ConnectivityProbe>,
    // Mutual exclusion between overlapping cycle triggers. Held only for
    // the duration of one cycle and released on every exit path.
    cycle_guard: Mutex<()>,
}

impl SyncWorker {
    pub fn new(
        store: Arc<MatchStore>,
        uploader: Arc<dyn MediaUploader>,
        connectivity: Arc<dyn ConnectivityProbe>,
    ) -> Self {
        Self { store, uploader, connectivity, cycle_guard: Mutex::new(()) }
    }

    /// Run one sync pass. Returns how many items were uploaded.
    ///
    /// An upload failure aborts the whole cycle; untouched items stay
    /// queued for the next trigger. A trigger arriving while a cycle is
    /// already running is a no-op.
    pub async fn run_cycle(&self) -> Result<usize, StoreError> {
        let Ok(_guard) = self.cycle_guard.try_lock() else {
            debug!("sync cycle already running, skipping trigger");
            return Ok(0);
        };
        if !self.connectivity.is_online() {
            debug!("offline, deferring sync cycle");
            return Ok(0);
        }

        let mut uploaded = 0;
        for item in self.store.queue()? {
            let Some(payload) = self.store.load_media(item.media_id)? else {
                // The blob is gone (deleted or corrupt); the item can
                // never succeed, so drop it instead of wedging the queue.
                warn!(media_id = %item.media_id, "dropping orphaned queue item");
                self.store.remove_queue_item(item.id)?;
                continue;
            };
            match self.uploader.upload(&item, &payload).await {
                Ok(()) => {
                    self.store.confirm_uploaded(&item)?;
                    uploaded += 1;
                    info!(label = %item.label, "media uploaded");
                }
                Err(err) => {
                    warn!(label = %item.label, %err, "upload failed, aborting cycle");
                    break;
                }
            }
        }
        Ok(uploaded)
    }

    /// Items still awaiting upload, shown to the user as a pending count.
    pub fn pending(&self) -> Result<usize, StoreError> {
        Ok(self.store.queue()?.len())
    }
}
