//! Personal hidden-menu store with change notification.
//!
//! The hide set is a client-side preference, not a security boundary. It is
//! persisted as a JSON array of node ids and broadcast to readers through a
//! `watch` channel after every successful write.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, watch};
use tracing::{debug, warn};

use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;
use warden_entity::menu::LocalHideSet;

/// Raw persistence for the serialized hide set.
#[async_trait]
pub trait HideStorage: Send + Sync + fmt::Debug {
    /// Read the stored document, or `None` if nothing was stored yet.
    async fn load(&self) -> AppResult<Option<String>>;

    /// Replace the stored document.
    async fn save(&self, raw: &str) -> AppResult<()>;
}

/// Stores the hide set in a JSON file.
#[derive(Debug, Clone)]
pub struct FileHideStorage {
    path: PathBuf,
}

impl FileHideStorage {
    /// Storage backed by the file at `path`. Parent directories are created
    /// on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HideStorage for FileHideStorage {
    async fn load(&self) -> AppResult<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read {}: {e}", self.path.display()),
                e,
            )),
        }
    }

    async fn save(&self, raw: &str) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // Write-then-rename; readers never observe a partial document.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, raw).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Keeps the hide set in memory only.
#[derive(Debug, Default)]
pub struct MemoryHideStorage {
    raw: Mutex<Option<String>>,
}

impl MemoryHideStorage {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-loaded with a raw document, corrupt or not.
    pub fn with_contents(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    /// The currently stored document.
    pub fn contents(&self) -> Option<String> {
        self.raw.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl HideStorage for MemoryHideStorage {
    async fn load(&self) -> AppResult<Option<String>> {
        Ok(self.contents())
    }

    async fn save(&self, raw: &str) -> AppResult<()> {
        let mut guard = self
            .raw
            .lock()
            .map_err(|_| AppError::storage("Hide storage lock poisoned"))?;
        *guard = Some(raw.to_string());
        Ok(())
    }
}

/// The personal hide set, persisted and observable.
pub struct LocalHideStore {
    storage: Arc<dyn HideStorage>,
    tx: watch::Sender<LocalHideSet>,
    write_lock: AsyncMutex<()>,
}

impl fmt::Debug for LocalHideStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalHideStore")
            .field("storage", &self.storage)
            .field("current", &*self.tx.borrow())
            .finish()
    }
}

impl LocalHideStore {
    /// Load the stored set. A document that does not parse is replaced by
    /// the empty set.
    pub async fn open(storage: Arc<dyn HideStorage>) -> AppResult<Self> {
        let initial = match storage.load().await? {
            None => LocalHideSet::new(),
            Some(raw) if raw.trim().is_empty() => LocalHideSet::new(),
            Some(raw) => match serde_json::from_str::<LocalHideSet>(&raw) {
                Ok(set) => set,
                Err(e) => {
                    warn!(error = %e, "Stored hidden-menu list is malformed; resetting to empty");
                    let empty = LocalHideSet::new();
                    if let Err(save_err) = storage.save(&serde_json::to_string(&empty)?).await {
                        warn!(error = %save_err, "Failed to overwrite malformed hidden-menu list");
                    }
                    empty
                }
            },
        };

        let (tx, _rx) = watch::channel(initial);
        Ok(Self {
            storage,
            tx,
            write_lock: AsyncMutex::new(()),
        })
    }

    /// Open a store backed by a JSON file.
    pub async fn open_file(path: impl Into<PathBuf>) -> AppResult<Self> {
        Self::open(Arc::new(FileHideStorage::new(path))).await
    }

    /// Open a store that never touches disk.
    pub async fn in_memory() -> AppResult<Self> {
        Self::open(Arc::new(MemoryHideStorage::new())).await
    }

    /// Snapshot of the current set.
    pub fn current(&self) -> LocalHideSet {
        self.tx.borrow().clone()
    }

    /// Whether `id` is currently hidden.
    pub fn is_hidden(&self, id: &str) -> bool {
        self.tx.borrow().contains(id)
    }

    /// Receiver that observes every committed change.
    pub fn subscribe(&self) -> watch::Receiver<LocalHideSet> {
        self.tx.subscribe()
    }

    /// Hide `id` if shown, show it if hidden. Returns the new set.
    pub async fn toggle(&self, id: &str) -> AppResult<LocalHideSet> {
        let _guard = self.write_lock.lock().await;
        let next = self.tx.borrow().toggled(id);
        self.commit(next).await
    }

    /// Show everything again. Returns the empty set.
    pub async fn reset_all(&self) -> AppResult<LocalHideSet> {
        let _guard = self.write_lock.lock().await;
        self.commit(LocalHideSet::new()).await
    }

    /// Persist first, then publish, so readers never see an unsaved set.
    async fn commit(&self, next: LocalHideSet) -> AppResult<LocalHideSet> {
        self.storage.save(&serde_json::to_string(&next)?).await?;
        debug!(hidden = next.len(), "Hidden-menu list updated");
        self.tx.send_replace(next.clone());
        Ok(next)
    }
}
