use super::model::VideoSettings;
use crate::error::Result;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Durable key-value storage for [`VideoSettings`]
///
/// Writes are fire-and-forget: a store logs its own failures and the caller
/// never waits on or retries persistence.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> VideoSettings;
    fn save(&self, settings: &VideoSettings);
}

/// Settings persisted as a JSON document on disk
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<VideoSettings>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        let settings: VideoSettings = serde_json::from_str(&raw)?;
        Ok(Some(settings))
    }

    fn write(&self, settings: &VideoSettings) -> Result<()> {
        let encoded = serde_json::to_string_pretty(settings)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, encoded)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> VideoSettings {
        match self.read() {
            Ok(Some(settings)) => {
                info!("Loaded settings from {}", self.path.display());
                settings.clamped()
            }
            Ok(None) => {
                info!(
                    "No settings file at {}, using defaults",
                    self.path.display()
                );
                VideoSettings::default()
            }
            Err(e) => {
                warn!(
                    "Failed to read settings from {}: {}, using defaults",
                    self.path.display(),
                    e
                );
                VideoSettings::default()
            }
        }
    }

    fn save(&self, settings: &VideoSettings) {
        match self.write(settings) {
            Ok(()) => debug!("Settings written to {}", self.path.display()),
            Err(e) => warn!(
                "Failed to write settings to {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Volatile store used by tests and dry runs
#[derive(Default)]
pub struct MemorySettingsStore {
    settings: Mutex<VideoSettings>,
    writes: AtomicUsize,
}

impl MemorySettingsStore {
    pub fn new(settings: VideoSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn snapshot(&self) -> VideoSettings {
        self.settings.lock().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> VideoSettings {
        self.settings.lock().clone()
    }

    fn save(&self, settings: &VideoSettings) {
        *self.settings.lock() = settings.clone();
        self.writes.fetch_add(1, Ordering::Relaxed);
    }
}
