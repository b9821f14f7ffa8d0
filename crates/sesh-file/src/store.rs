//! Filesystem storage for persisted session slots.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde_json::{Map, Value};
use tracing::{debug, instrument, trace};

use sesh_core::Result;
use sesh_core::error::{Error, StorageError};
use sesh_core::storage::{Slot, SlotStorage};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

fn map_io(err: std::io::Error) -> Error {
    Error::Storage(StorageError::new(format!("IO error: {}", err)))
}

/// Write `contents` to a fresh file that only the owner can read.
///
/// The mode is set at creation. A leftover file from an interrupted write
/// is removed first.
fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => return Err(map_io(e)),
        _ => {}
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).map_err(map_io)?;
    file.write_all(contents).map_err(map_io)?;
    file.sync_all().map_err(map_io)
}

/// Slot storage backed by a single JSON document on disk.
///
/// The document is an object keyed by slot name. Every write goes to a
/// temporary file that is renamed over the original while an exclusive lock
/// on a sibling `.lock` file is held, so concurrent processes sharing the
/// same state never observe a partial batch. The file is readable by its
/// owner only on Unix.
///
/// Keys this crate does not know about are preserved.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Create a storage at the given file path. Nothing is touched on disk
    /// until the first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The state file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }

    fn open_lock(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(map_io)?;
        }

        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(map_io)
    }

    fn read_document(&self) -> Result<Map<String, Value>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(map_io(e)),
        };

        if json.trim().is_empty() {
            return Ok(Map::new());
        }

        serde_json::from_str(&json).map_err(|e| {
            StorageError::new(format!(
                "state file {} is not a JSON object: {}",
                self.path.display(),
                e
            ))
            .into()
        })
    }

    fn write_document(&self, document: &Map<String, Value>) -> Result<()> {
        if document.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(map_io(e)),
                _ => Ok(()),
            };
        }

        let json = serde_json::to_string_pretty(document)
            .map_err(|e| StorageError::new(format!("failed to encode state: {}", e)))?;

        let temp_path = self.temp_path();
        write_private(&temp_path, json.as_bytes())?;
        fs::rename(&temp_path, &self.path).map_err(map_io)
    }

    /// Read-modify-write the document under the exclusive lock.
    fn update(&self, f: impl FnOnce(&mut Map<String, Value>)) -> Result<()> {
        let lock_file = self.open_lock()?;
        lock_file.lock_exclusive().map_err(map_io)?;

        let result = self.read_document().and_then(|mut document| {
            f(&mut document);
            self.write_document(&document)
        });

        lock_file.unlock().map_err(map_io)?;
        result
    }
}

impl SlotStorage for FileStorage {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self, slot: Slot) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let lock_file = self.open_lock()?;
        lock_file.lock_shared().map_err(map_io)?;
        let document = self.read_document();
        lock_file.unlock().map_err(map_io)?;

        let value = document?
            .get(slot.key())
            .and_then(Value::as_str)
            .map(str::to_string);
        trace!(present = value.is_some(), "Loaded slot");
        Ok(value)
    }

    #[instrument(skip(self, entries), fields(path = %self.path.display(), count = entries.len()))]
    fn store(&self, entries: &[(Slot, String)]) -> Result<()> {
        self.update(|document| {
            for (slot, value) in entries {
                document.insert(slot.key().to_string(), Value::String(value.clone()));
            }
        })?;
        debug!("Stored slots");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn remove(&self, slots: &[Slot]) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }

        self.update(|document| {
            for slot in slots {
                document.remove(slot.key());
            }
        })?;
        debug!("Removed slots");
        Ok(())
    }
}
