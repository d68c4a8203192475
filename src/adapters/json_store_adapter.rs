//! JSON file store for saved positions and last-used settings.
//!
//! A missing or unreadable file reads as empty; corruption is logged, not
//! propagated, so a damaged file never blocks a position check. Before a
//! write replaces a corrupt positions file, the damaged file is moved aside
//! to `<name>.bak`.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::domain::error::PosCheckError;
use crate::domain::saved_position::{next_id, NewPosition, SavedPosition};
use crate::domain::validation::PositionInput;
use crate::ports::position_store_port::PositionStorePort;

pub const DEFAULT_SETTINGS_PATH: &str = "web_settings.json";
pub const DEFAULT_POSITIONS_PATH: &str = "saved_positions.json";

pub struct JsonFileStore {
    settings_path: PathBuf,
    positions_path: PathBuf,
    /// Held across every read-modify-write of the positions file.
    write_lock: Mutex<()>,
}

enum Loaded<T> {
    Missing,
    Parsed(T),
    Corrupt,
}

impl JsonFileStore {
    pub fn new(settings_path: PathBuf, positions_path: PathBuf) -> Self {
        Self {
            settings_path,
            positions_path,
            write_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, PosCheckError> {
        self.write_lock.lock().map_err(|_| PosCheckError::Storage {
            reason: format!("lock on {} poisoned", self.positions_path.display()),
        })
    }

    fn write_positions(&self, positions: &[SavedPosition]) -> Result<(), PosCheckError> {
        write_json(&self.positions_path, positions)
    }

    fn backup_corrupt_positions(&self) -> Result<(), PosCheckError> {
        let mut name = OsString::from(self.positions_path.as_os_str());
        name.push(".bak");
        let backup = PathBuf::from(name);
        fs::rename(&self.positions_path, &backup).map_err(|e| PosCheckError::Storage {
            reason: format!(
                "failed to move corrupt {} aside: {}",
                self.positions_path.display(),
                e
            ),
        })?;
        warn!(
            "Moved corrupt {} to {}",
            self.positions_path.display(),
            backup.display()
        );
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Loaded<T> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return Loaded::Missing,
    };
    match serde_json::from_str(&contents) {
        Ok(value) => Loaded::Parsed(value),
        Err(e) => {
            warn!("Failed to parse {}: {}", path.display(), e);
            Loaded::Corrupt
        }
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PosCheckError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| PosCheckError::Storage {
        reason: format!("failed to serialize {}: {}", path.display(), e),
    })?;
    fs::write(path, json).map_err(|e| PosCheckError::Storage {
        reason: format!("failed to write {}: {}", path.display(), e),
    })
}

impl PositionStorePort for JsonFileStore {
    fn load_settings(&self) -> Result<Option<PositionInput>, PosCheckError> {
        match read_json(&self.settings_path) {
            Loaded::Parsed(settings) => Ok(Some(settings)),
            Loaded::Missing | Loaded::Corrupt => Ok(None),
        }
    }

    fn save_settings(&self, settings: &PositionInput) -> Result<(), PosCheckError> {
        write_json(&self.settings_path, settings)
    }

    fn list_positions(&self) -> Result<Vec<SavedPosition>, PosCheckError> {
        let positions = match read_json(&self.positions_path) {
            Loaded::Parsed(positions) => positions,
            Loaded::Missing | Loaded::Corrupt => Vec::new(),
        };
        info!("Loaded {} saved positions", positions.len());
        Ok(positions)
    }

    fn add_position(&self, position: NewPosition) -> Result<SavedPosition, PosCheckError> {
        let _guard = self.lock()?;
        let mut positions: Vec<SavedPosition> = match read_json(&self.positions_path) {
            Loaded::Parsed(positions) => positions,
            Loaded::Missing => Vec::new(),
            Loaded::Corrupt => {
                self.backup_corrupt_positions()?;
                Vec::new()
            }
        };
        let saved = position.into_saved(next_id(&positions));
        positions.push(saved.clone());
        self.write_positions(&positions)?;
        info!("Saved position {} ({})", saved.id, saved.name);
        Ok(saved)
    }

    fn delete_position(&self, id: u64) -> Result<bool, PosCheckError> {
        let _guard = self.lock()?;
        let mut positions: Vec<SavedPosition> = match read_json(&self.positions_path) {
            Loaded::Parsed(positions) => positions,
            Loaded::Missing | Loaded::Corrupt => return Ok(false),
        };
        let before = positions.len();
        positions.retain(|p| p.id != id);
        if positions.len() == before {
            return Ok(false);
        }
        self.write_positions(&positions)?;
        info!("Deleted position {}", id);
        Ok(true)
    }
}
