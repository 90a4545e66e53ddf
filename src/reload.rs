//! Hot-swappable database handle
//!
//! Long-running services keep one [`SharedDatabase`] and take a snapshot per
//! request with [`SharedDatabase::current`]. Replacing the file on disk and
//! calling [`SharedDatabase::reload`] (or letting [`SharedDatabase::watch`]
//! do it) swaps the new handle in atomically. In-flight lookups keep the
//! snapshot they started with.

use crate::database::{Database, DatabaseOpener};
use crate::error::LoadError;
use arc_swap::ArcSwap;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Event fired after a reload attempt
#[derive(Debug, Clone)]
pub struct ReloadEvent {
    /// Path to the database file
    pub path: PathBuf,
    /// Whether reload succeeded
    pub success: bool,
    /// Error message if reload failed (None on success)
    pub error: Option<String>,
    /// Generation counter after the attempt
    pub generation: u64,
}

/// Callback type for reload notifications
pub type ReloadCallback = Arc<dyn Fn(ReloadEvent) + Send + Sync>;

struct Shared {
    opener: DatabaseOpener,
    current: ArcSwap<Database>,
    /// Starts at 1, incremented on every successful swap
    generation: AtomicU64,
}

/// Database handle that can be replaced while in use
///
/// Cloning is cheap; clones share the same underlying handle.
///
/// ```no_run
/// use geodat::SharedDatabase;
///
/// let shared = SharedDatabase::open("GeoLiteCity.dat")?;
/// let db = shared.current();
/// println!("{}", db.lookup("8.8.8.8")?);
///
/// // After replacing the file on disk
/// shared.reload()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct SharedDatabase {
    inner: Arc<Shared>,
}

impl SharedDatabase {
    /// Open a database file with default options (memory-mapped)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        Self::with_opener(Database::from(path.as_ref()))
    }

    /// Open a database with a configured opener, reused on every reload
    pub fn with_opener(opener: DatabaseOpener) -> Result<Self, LoadError> {
        let initial = opener.open()?;
        Ok(Self {
            inner: Arc::new(Shared {
                opener,
                current: ArcSwap::from_pointee(initial),
                generation: AtomicU64::new(1),
            }),
        })
    }

    /// Snapshot of the current database
    pub fn current(&self) -> Arc<Database> {
        self.inner.current.load_full()
    }

    /// Number of successful loads so far
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    /// Path the database is loaded from
    pub fn path(&self) -> &Path {
        self.inner.opener.path()
    }

    /// Load the file again and swap it in
    ///
    /// On failure the current handle stays in place and the error is returned.
    /// Returns the new generation.
    pub fn reload(&self) -> Result<u64, LoadError> {
        let fresh = self.inner.opener.open()?;
        self.inner.current.store(Arc::new(fresh));
        let generation = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;
        info!(
            "reloaded {} (generation {})",
            self.path().display(),
            generation
        );
        Ok(generation)
    }

    /// Reload and describe the outcome as an event
    #[cfg_attr(not(feature = "watch"), allow(dead_code))]
    fn reload_event(&self, path: &Path) -> ReloadEvent {
        match self.reload() {
            Ok(generation) => ReloadEvent {
                path: path.to_path_buf(),
                success: true,
                error: None,
                generation,
            },
            Err(e) => {
                warn!("reload of {} failed, keeping current database: {}", path.display(), e);
                ReloadEvent {
                    path: path.to_path_buf(),
                    success: false,
                    error: Some(e.to_string()),
                    generation: self.generation(),
                }
            }
        }
    }

    /// Watch the database file and reload it when it changes
    ///
    /// The parent directory is watched, so both in-place writes and atomic
    /// renames onto the path are seen. Reloads after the file has been quiet
    /// for 200 ms. The watcher stops
    /// when the returned [`Watch`] is dropped.
    #[cfg(feature = "watch")]
    pub fn watch(&self, callback: Option<ReloadCallback>) -> Result<Watch, LoadError> {
        watcher::spawn(self.clone(), callback)
    }
}

impl std::fmt::Debug for SharedDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedDatabase")
            .field("path", &self.path())
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(feature = "watch")]
pub use watcher::Watch;

#[cfg(feature = "watch")]
mod watcher {
    use super::{ReloadCallback, SharedDatabase};
    use crate::error::LoadError;
    use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
    use std::ffi::OsStr;
    use std::path::PathBuf;
    use std::sync::mpsc::{self, RecvTimeoutError};
    use std::thread;
    use std::time::{Duration, Instant};

    const DEBOUNCE: Duration = Duration::from_millis(200);
    const POLL: Duration = Duration::from_millis(50);

    /// Running file watcher; stops on drop
    pub struct Watch {
        shutdown_tx: mpsc::Sender<()>,
        handle: Option<thread::JoinHandle<()>>,
        _watcher: RecommendedWatcher,
    }

    impl Drop for Watch {
        fn drop(&mut self) {
            let _ = self.shutdown_tx.send(());
            if let Some(handle) = self.handle.take() {
                let _ = handle.join();
            }
        }
    }

    pub(super) fn spawn(
        shared: SharedDatabase,
        callback: Option<ReloadCallback>,
    ) -> Result<Watch, LoadError> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        // Watch the directory: an atomic rename replaces the file's inode
        let file = shared.path().to_path_buf();
        let name = file
            .file_name()
            .map(|name| name.to_os_string())
            .ok_or_else(|| LoadError::Io(format!("Not a file path: {}", file.display())))?;
        let dir = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let dir = dir
            .canonicalize()
            .map_err(|e| LoadError::Io(format!("Failed to canonicalize {}: {}", dir.display(), e)))?;

        let mut watcher = RecommendedWatcher::new(event_tx, Config::default())
            .map_err(|e| LoadError::Io(format!("Failed to create file watcher: {}", e)))?;
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| LoadError::Io(format!("Failed to watch {}: {}", dir.display(), e)))?;

        let handle = thread::Builder::new()
            .name("geodat-watch".to_string())
            .spawn(move || {
                let mut last_event: Option<Instant> = None;

                loop {
                    if shutdown_rx.try_recv().is_ok() {
                        break;
                    }

                    match event_rx.recv_timeout(POLL) {
                        Ok(Ok(event)) => {
                            if touches(&event, &name) {
                                last_event = Some(Instant::now());
                            }
                        }
                        Ok(Err(e)) => log::debug!("file watcher error: {}", e),
                        Err(RecvTimeoutError::Timeout) => {
                            if last_event.is_some_and(|t| t.elapsed() >= DEBOUNCE) {
                                let event = shared.reload_event(&file);
                                if let Some(callback) = &callback {
                                    callback(event);
                                }
                                last_event = None;
                            }
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .map_err(|e| LoadError::Io(format!("Failed to spawn watcher thread: {}", e)))?;

        Ok(Watch {
            shutdown_tx,
            handle: Some(handle),
            _watcher: watcher,
        })
    }

    /// Whether a directory event concerns the watched file name
    fn touches(event: &Event, name: &OsStr) -> bool {
        event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::COUNTRY_BEGIN;
    use tempfile::NamedTempFile;

    /// Whole address space in one country
    fn single_country_db(stored_country: u32) -> Vec<u8> {
        let mut data = Vec::new();
        for _ in 0..2 {
            data.extend_from_slice(&(COUNTRY_BEGIN + stored_country).to_le_bytes()[..3]);
        }
        data.extend_from_slice(b"\xFF\xFF\xFF\x01");
        data
    }

    fn write_db(file: &NamedTempFile, bytes: &[u8]) {
        std::fs::write(file.path(), bytes).unwrap();
    }

    #[test]
    fn test_reload_swaps_database() {
        let file = NamedTempFile::new().unwrap();
        write_db(&file, &single_country_db(77));

        let shared = SharedDatabase::with_opener(Database::from(file.path()).in_memory()).unwrap();
        assert_eq!(shared.generation(), 1);
        let before = shared.current();
        assert_eq!(before.lookup("1.1.1.1").unwrap().country_code(), Some("GB"));

        write_db(&file, &single_country_db(225));
        assert_eq!(shared.reload().unwrap(), 2);

        assert_eq!(shared.current().lookup("1.1.1.1").unwrap().country_code(), Some("US"));
        // Old snapshot is untouched
        assert_eq!(before.lookup("1.1.1.1").unwrap().country_code(), Some("GB"));
    }

    #[test]
    fn test_failed_reload_keeps_old_database() {
        let file = NamedTempFile::new().unwrap();
        write_db(&file, &single_country_db(77));
        let shared = SharedDatabase::with_opener(Database::from(file.path()).in_memory()).unwrap();

        // Org edition cannot be served
        write_db(&file, b"\x01\x00\x00\x01\x00\x00\xFF\xFF\xFF\x05\x01\x00\x00");
        assert!(matches!(
            shared.reload(),
            Err(LoadError::UnsupportedEdition(_))
        ));
        assert_eq!(shared.generation(), 1);
        assert_eq!(shared.current().lookup("1.1.1.1").unwrap().country_code(), Some("GB"));

        let event = shared.reload_event(file.path());
        assert!(!event.success);
        assert!(event.error.is_some());
        assert_eq!(event.generation, 1);
    }

    #[test]
    fn test_clones_share_state() {
        let file = NamedTempFile::new().unwrap();
        write_db(&file, &single_country_db(77));
        let shared = SharedDatabase::with_opener(Database::from(file.path()).in_memory()).unwrap();
        let clone = shared.clone();

        write_db(&file, &single_country_db(56));
        clone.reload().unwrap();
        assert_eq!(shared.generation(), 2);
        assert_eq!(shared.current().lookup("1.1.1.1").unwrap().country_code(), Some("DE"));
    }

    #[test]
    fn test_open_missing_file() {
        assert!(matches!(
            SharedDatabase::open("/nonexistent/geodat/GeoIP.dat"),
            Err(LoadError::Io(_))
        ));
    }

    #[cfg(feature = "watch")]
    #[test]
    fn test_watch_reloads_on_change() {
        use std::sync::mpsc;
        use std::time::Duration;

        let file = NamedTempFile::new().unwrap();
        write_db(&file, &single_country_db(77));
        let shared = SharedDatabase::with_opener(Database::from(file.path()).in_memory()).unwrap();

        let (tx, rx) = mpsc::channel();
        let tx = std::sync::Mutex::new(tx);
        let callback: ReloadCallback = Arc::new(move |event| {
            let _ = tx.lock().unwrap().send(event);
        });
        let watch = shared.watch(Some(callback)).unwrap();

        write_db(&file, &single_country_db(225));
        let event = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(event.success);
        assert!(event.generation >= 2);
        assert_eq!(shared.current().lookup("1.1.1.1").unwrap().country_code(), Some("US"));

        drop(watch);
    }

    #[cfg(feature = "watch")]
    #[test]
    fn test_watch_survives_atomic_rename() {
        use std::sync::mpsc;
        use std::time::Duration;

        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("GeoIP.dat");
        std::fs::write(&target, single_country_db(77)).unwrap();
        let shared = SharedDatabase::with_opener(Database::from(&target).in_memory()).unwrap();

        let (tx, rx) = mpsc::channel();
        let tx = std::sync::Mutex::new(tx);
        let callback: ReloadCallback = Arc::new(move |event| {
            let _ = tx.lock().unwrap().send(event);
        });
        let _watch = shared.watch(Some(callback)).unwrap();

        // Two replacements in a row: the second must still be seen
        for (stored, code) in [(225, "US"), (56, "DE")] {
            let staged = dir.path().join("GeoIP.dat.tmp");
            std::fs::write(&staged, single_country_db(stored)).unwrap();
            std::fs::rename(&staged, &target).unwrap();

            let deadline = std::time::Instant::now() + Duration::from_secs(10);
            loop {
                let remaining = deadline.saturating_duration_since(std::time::Instant::now());
                let event = rx.recv_timeout(remaining).unwrap();
                assert!(event.success, "reload failed: {:?}", event.error);
                if shared.current().lookup("1.1.1.1").unwrap().country_code() == Some(code) {
                    break;
                }
            }
        }
    }
}
