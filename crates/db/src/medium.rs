//! Byte-level backends beneath the catalog store.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

#[async_trait]
pub trait CatalogMedium: Send + Sync {
    /// Returns `None` when nothing has been written yet.
    async fn read(&self) -> io::Result<Option<Vec<u8>>>;

    /// Replaces the stored bytes as one step: a reader sees either the old
    /// bytes or the new ones, never a mix.
    async fn replace(&self, bytes: Vec<u8>) -> io::Result<()>;

    fn describe(&self) -> String;
}

/// A single JSON file, replaced by write-to-temp then rename.
#[derive(Clone, Debug)]
pub struct FileMedium {
    path: PathBuf,
}

impl FileMedium {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let file_name =
            self.path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
        self.path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()))
    }

    fn parent(&self) -> Option<&Path> {
        self.path.parent().filter(|parent| !parent.as_os_str().is_empty())
    }
}

#[async_trait]
impl CatalogMedium for FileMedium {
    async fn read(&self) -> io::Result<Option<Vec<u8>>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error),
        }
    }

    async fn replace(&self, bytes: Vec<u8>) -> io::Result<()> {
        if let Some(parent) = self.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = self.temp_path();
        let result = write_then_rename(&temp_path, &self.path, &bytes).await;
        if result.is_err() {
            let _ = fs::remove_file(&temp_path).await;
            return result;
        }

        // The rename has landed; the new catalog is what readers see from here on.
        if let Some(parent) = self.parent() {
            settle_dir_sync(parent, sync_dir(parent).await);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

async fn write_then_rename(temp_path: &Path, target: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(temp_path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(temp_path, target).await
}

/// Reports a failed directory fsync without failing the save it follows.
fn settle_dir_sync(dir: &Path, result: io::Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(error) => {
            warn!(
                event_name = "catalog.medium.dir_sync_failed",
                dir = %dir.display(),
                error = %error,
                "catalog replaced but directory sync failed"
            );
            false
        }
    }
}

#[cfg(unix)]
async fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

/// Process-local medium with switchable faults, for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryMedium {
    bytes: RwLock<Option<Vec<u8>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    write_delay_ms: AtomicU64,
    writes: AtomicUsize,
}

impl InMemoryMedium {
    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self { bytes: RwLock::new(Some(bytes.into())), ..Self::default() }
    }

    pub fn fail_reads(&self, enabled: bool) {
        self.fail_reads.store(enabled, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::SeqCst);
    }

    /// Every subsequent `replace` sleeps this long before committing.
    pub fn delay_writes(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.write_delay_ms.store(millis, Ordering::SeqCst);
    }

    pub async fn contents(&self) -> Option<Vec<u8>> {
        self.bytes.read().await.clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogMedium for InMemoryMedium {
    async fn read(&self) -> io::Result<Option<Vec<u8>>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "reads disabled"));
        }
        Ok(self.bytes.read().await.clone())
    }

    async fn replace(&self, bytes: Vec<u8>) -> io::Result<()> {
        let delay = self.write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "writes disabled"));
        }

        *self.bytes.write().await = Some(bytes);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
