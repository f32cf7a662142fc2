//! Owner of the optional [`ModelHandle`]: guarded lazy loading and load status.
//!
//! The handle is shared through `Arc` and read without locking once loaded.
//! Loading is serialized behind one guard; callers that queued behind an
//! attempt reuse its outcome instead of deserializing the artifact again.

use super::error::LoadError;
use super::handle::ModelHandle;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct ModelRegistry {
    path: PathBuf,
    reload_interval: Duration,
    handle: RwLock<Option<Arc<ModelHandle>>>,
    last_error: RwLock<Option<String>>,
    /// Load guard; holds the time of the last attempt.
    last_attempt: Mutex<Option<Instant>>,
    attempts: AtomicU64,
}

/// Snapshot for health reporting.
#[derive(Debug, Clone)]
pub struct RegistryStatus {
    pub loaded: bool,
    pub path: PathBuf,
    pub exists: bool,
    pub last_error: Option<String>,
    pub sha256: Option<String>,
    pub scorer: Option<&'static str>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub loaded_at: Option<DateTime<Utc>>,
    pub attempts: u64,
}

impl ModelRegistry {
    /// Nothing is loaded until [`Self::load_now`] or [`Self::ensure_loaded`].
    /// Lazy attempts after a failure are spaced by `reload_interval`.
    pub fn new(path: impl Into<PathBuf>, reload_interval: Duration) -> Self {
        Self {
            path: path.into(),
            reload_interval,
            handle: RwLock::new(None),
            last_error: RwLock::new(None),
            last_attempt: Mutex::new(None),
            attempts: AtomicU64::new(0),
        }
    }

    /// Registry around an already-built handle.
    pub fn with_handle(handle: ModelHandle) -> Self {
        let registry = Self::new(handle.path().to_path_buf(), Duration::ZERO);
        *registry.handle.write() = Some(Arc::new(handle));
        registry
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> Option<Arc<ModelHandle>> {
        self.handle.read().clone()
    }

    /// Loaded handle, attempting one guarded load if absent. `None` means unavailable.
    pub fn ensure_loaded(&self) -> Option<Arc<ModelHandle>> {
        if let Some(handle) = self.current() {
            return Some(handle);
        }
        let seen = self.attempts.load(Ordering::Acquire);
        let mut last_attempt = self.last_attempt.lock();

        // Someone else loaded, or tried, while we waited for the guard.
        if let Some(handle) = self.current() {
            return Some(handle);
        }
        if self.attempts.load(Ordering::Acquire) != seen {
            return None;
        }
        if let Some(at) = *last_attempt {
            if at.elapsed() < self.reload_interval {
                return None;
            }
        }

        *last_attempt = Some(Instant::now());
        self.attempt_load().ok()
    }

    /// Unconditional load attempt (startup, operator-triggered reload).
    pub fn load_now(&self) -> Result<Arc<ModelHandle>, LoadError> {
        let mut last_attempt = self.last_attempt.lock();
        *last_attempt = Some(Instant::now());
        self.attempt_load()
    }

    pub fn load_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Acquire)
    }

    pub fn status(&self) -> RegistryStatus {
        let handle = self.current();
        RegistryStatus {
            loaded: handle.is_some(),
            path: self.path.clone(),
            exists: self.path.exists(),
            last_error: self.last_error.read().clone(),
            sha256: handle.as_ref().and_then(|h| h.sha256().map(String::from)),
            scorer: handle.as_ref().map(|h| h.scorer_kind()),
            name: handle.as_ref().and_then(|h| h.metadata().name.clone()),
            version: handle.as_ref().and_then(|h| h.metadata().version.clone()),
            loaded_at: handle.as_ref().map(|h| h.loaded_at()),
            attempts: self.load_attempts(),
        }
    }

    /// Caller must hold the load guard.
    fn attempt_load(&self) -> Result<Arc<ModelHandle>, LoadError> {
        let result = ModelHandle::load(&self.path);
        self.attempts.fetch_add(1, Ordering::AcqRel);
        match result {
            Ok(handle) => {
                info!(
                    path = %self.path.display(),
                    scorer = handle.scorer_kind(),
                    features = handle.feature_width(),
                    sha256 = handle.sha256().unwrap_or_default(),
                    "model loaded"
                );
                debug!(features = ?handle.feature_names(), "model feature layout");
                let handle = Arc::new(handle);
                *self.handle.write() = Some(handle.clone());
                *self.last_error.write() = None;
                Ok(handle)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "model load failed; scoring unavailable");
                *self.last_error.write() = Some(e.to_string());
                Err(e)
            }
        }
    }
}
