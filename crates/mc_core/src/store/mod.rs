//! Encrypted persistence store.
//!
//! Durable, encrypted storage for the single match snapshot, media blobs
//! and device key material, rooted at a directory and injected into the
//! engine's runtime. Constructed per instance, never a global.
//!
//! Layout:
//!
//! ```text
//! <root>/config.key            key material (32 raw bytes)
//! <root>/snapshot.dat          encrypted snapshot payload
//! <root>/media/<uuid>.dat      encrypted media blobs
//! <root>/media/manifest.json   media index (id, label, created_at)
//! <root>/queue.json            pending-upload FIFO
//! ```

mod crypto;
pub mod error;
mod format;
pub mod sync;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use crypto::{StoreCipher, KEY_LEN};
pub use error::StoreError;
pub use sync::{
    AlwaysOnline, ConnectivityProbe, MediaUploader, SyncQueueItem, SyncWorker, UploadError,
};

use crate::models::MatchSnapshot;

const KEY_FILE: &str = "config.key";
const SNAPSHOT_FILE: &str = "snapshot.dat";
const MEDIA_DIR: &str = "media";
const MANIFEST_FILE: &str = "manifest.json";
const QUEUE_FILE: &str = "queue.json";

/// Index entry for one stored media blob. Entries without a label are
/// buffer-internal artifacts and stay out of user-facing listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaRecord {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Unix milliseconds.
    pub created_at: u64,
}

pub struct MatchStore {
    root: PathBuf,
    cipher: StoreCipher,
}

impl std::fmt::Debug for MatchStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchStore").field("root", &self.root).finish()
    }
}

impl MatchStore {
    /// Open the store at `root`, generating key material on first use.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join(MEDIA_DIR))?;
        let key = Self::load_or_generate_key(&root)?;
        let cipher = StoreCipher::new(&key)?;
        Ok(Self { root, cipher })
    }

    fn load_or_generate_key(root: &Path) -> Result<[u8; KEY_LEN], StoreError> {
        let path = root.join(KEY_FILE);
        if path.exists() {
            let bytes = fs::read(&path)?;
            if bytes.len() == KEY_LEN {
                let mut key = [0u8; KEY_LEN];
                key.copy_from_slice(&bytes);
                return Ok(key);
            }
            warn!(len = bytes.len(), "key material malformed, regenerating");
        }
        let key = StoreCipher::generate_key();
        write_atomic(&path, &key)?;
        info!("generated new device key material");
        Ok(key)
    }

    // ---- snapshot singleton ----

    pub fn save_snapshot(&self, snapshot: &MatchSnapshot) -> Result<(), StoreError> {
        let payload = format::encode_snapshot(snapshot)?;
        let blob = self.cipher.encrypt(&payload)?;
        write_atomic(&self.root.join(SNAPSHOT_FILE), &blob)?;
        debug!(bytes = blob.len(), "snapshot saved");
        Ok(())
    }

    /// Load the snapshot, or `None` when absent. An undecryptable or
    /// corrupt snapshot wipes the store and also returns `None` so the
    /// caller starts from a clean slate instead of failing repeatedly.
    pub fn load_snapshot(&self) -> Result<Option<MatchSnapshot>, StoreError> {
        let path = self.root.join(SNAPSHOT_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let blob = fs::read(&path)?;
        let result = self
            .cipher
            .decrypt(&blob)
            .and_then(|payload| format::decode_snapshot(&payload));
        match result {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) if err.is_data_integrity() => {
                warn!(%err, "snapshot unreadable, wiping store");
                self.start_new_match()?;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    // ---- media ----

    /// Store a media blob encrypted. Labeled media is user-visible and
    /// gets a queue entry for upload; unlabeled blobs are internal.
    pub fn save_media(
        &self,
        payload: &[u8],
        label: Option<&str>,
    ) -> Result<MediaRecord, StoreError> {
        let record = MediaRecord {
            id: Uuid::new_v4(),
            label: label.map(str::to_owned),
            created_at: current_timestamp(),
        };

        let blob = self.cipher.encrypt(payload)?;
        write_atomic(&self.media_path(record.id), &blob)?;

        let mut manifest = self.read_manifest()?;
        manifest.push(record.clone());
        self.write_manifest(&manifest)?;

        if let Some(label) = &record.label {
            let mut queue = self.queue()?;
            queue.push(SyncQueueItem {
                id: Uuid::new_v4(),
                media_id: record.id,
                label: label.clone(),
            });
            self.write_queue(&queue)?;
        }

        debug!(id = %record.id, label = ?record.label, "media saved");
        Ok(record)
    }

    /// Decrypt one media blob. A missing or corrupt blob yields `None`;
    /// corrupt records are removed on the way out.
    pub fn load_media(&self, id: Uuid) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.media_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let blob = fs::read(&path)?;
        match self.cipher.decrypt(&blob) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.is_data_integrity() => {
                warn!(%id, "media blob unreadable, removing record");
                self.delete_media(id)?;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// User-visible recordings: labeled records only.
    pub fn list_media(&self) -> Result<Vec<MediaRecord>, StoreError> {
        Ok(self.read_manifest()?.into_iter().filter(|r| r.label.is_some()).collect())
    }

    /// Remove a media record, its blob, and any queue entry for it.
    pub fn delete_media(&self, id: Uuid) -> Result<(), StoreError> {
        let path = self.media_path(id);
        if path.exists() {
            fs::remove_file(&path)?;
        }

        let mut manifest = self.read_manifest()?;
        manifest.retain(|r| r.id != id);
        self.write_manifest(&manifest)?;

        let mut queue = self.queue()?;
        if queue.iter().any(|item| item.media_id == id) {
            queue.retain(|item| item.media_id != id);
            self.write_queue(&queue)?;
        }
        Ok(())
    }

    // ---- sync queue ----

    pub fn queue(&self) -> Result<Vec<SyncQueueItem>, StoreError> {
        let path = self.root.join(QUEUE_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&fs::read(&path)?)?)
    }

    pub(crate) fn remove_queue_item(&self, id: Uuid) -> Result<(), StoreError> {
        let mut queue = self.queue()?;
        queue.retain(|item| item.id != id);
        self.write_queue(&queue)
    }

    /// Dequeue after a confirmed upload and drop the local copy; synced
    /// media lives in the remote archive from here on.
    pub(crate) fn confirm_uploaded(&self, item: &SyncQueueItem) -> Result<(), StoreError> {
        self.remove_queue_item(item.id)?;
        self.delete_media(item.media_id)
    }

    // ---- lifecycle ----

    /// Clear snapshot, media and queue for a fresh match. Key material
    /// is retained.
    pub fn start_new_match(&self) -> Result<(), StoreError> {
        let snapshot = self.root.join(SNAPSHOT_FILE);
        if snapshot.exists() {
            fs::remove_file(&snapshot)?;
        }
        let media_dir = self.root.join(MEDIA_DIR);
        if media_dir.exists() {
            fs::remove_dir_all(&media_dir)?;
        }
        fs::create_dir_all(&media_dir)?;
        let queue = self.root.join(QUEUE_FILE);
        if queue.exists() {
            fs::remove_file(&queue)?;
        }
        info!("store wiped for new match");
        Ok(())
    }

    // ---- helpers ----

    fn media_path(&self, id: Uuid) -> PathBuf {
        self.root.join(MEDIA_DIR).join(format!("{id}.dat"))
    }

    fn read_manifest(&self) -> Result<Vec<MediaRecord>, StoreError> {
        let path = self.root.join(MEDIA_DIR).join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&fs::read(&path)?)?)
    }

    fn write_manifest(&self, manifest: &[MediaRecord]) -> Result<(), StoreError> {
        let path = self.root.join(MEDIA_DIR).join(MANIFEST_FILE);
        write_atomic(&path, &serde_json::to_vec(manifest)?)
    }

    fn write_queue(&self, queue: &[SyncQueueItem]) -> Result<(), StoreError> {
        write_atomic(&self.root.join(QUEUE_FILE), &serde_json::to_vec(queue)?)
    }
}

/// Atomic write: temp file, fsync, rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp = path.with_extension("tmp");
    {
        let mut file = File::create(&temp)?;
        file.write_all(bytes)?;
        file.flush()?;
        file.sync_all()?;
    }
    fs::rename(&temp, path)?;
    Ok(())
}

pub(crate) fn current_timestamp() -> u64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as u64
}
