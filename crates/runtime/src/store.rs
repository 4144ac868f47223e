//! Save-store port implementations.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use skilltree_core::{PortError, SaveStore};
use tracing::debug;

/// File-backed store. Each `(slot, user)` pair maps to one binary file;
/// writes go through a temp file and an atomic rename.
pub struct FileSaveStore {
    base_dir: PathBuf,
}

impl FileSaveStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, PortError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(|err| PortError::host(err.to_string()))?;
        Ok(Self { base_dir })
    }

    fn slot_path(&self, slot: &str, user_index: u32) -> PathBuf {
        self.base_dir.join(format!("{slot}_{user_index}.sav"))
    }
}

impl SaveStore for FileSaveStore {
    fn load(&self, slot: &str, user_index: u32) -> Result<Option<Vec<u8>>, PortError> {
        let path = self.slot_path(slot, user_index);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|err| PortError::host(err.to_string()))?;
        debug!(path = %path.display(), len = bytes.len(), "save slot loaded");
        Ok(Some(bytes))
    }

    fn save(&mut self, slot: &str, user_index: u32, bytes: &[u8]) -> Result<(), PortError> {
        let path = self.slot_path(slot, user_index);
        let temp_path = path.with_extension("sav.tmp");

        fs::write(&temp_path, bytes).map_err(|err| PortError::host(err.to_string()))?;
        fs::rename(&temp_path, &path).map_err(|err| PortError::host(err.to_string()))?;

        debug!(path = %path.display(), len = bytes.len(), "save slot written");
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemorySaveStore {
    slots: HashMap<(String, u32), Vec<u8>>,
}

impl MemorySaveStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl SaveStore for MemorySaveStore {
    fn load(&self, slot: &str, user_index: u32) -> Result<Option<Vec<u8>>, PortError> {
        Ok(self.slots.get(&(slot.to_string(), user_index)).cloned())
    }

    fn save(&mut self, slot: &str, user_index: u32, bytes: &[u8]) -> Result<(), PortError> {
        self.slots
            .insert((slot.to_string(), user_index), bytes.to_vec());
        Ok(())
    }
}
