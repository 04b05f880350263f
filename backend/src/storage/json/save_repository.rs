//! # Save Repository
//!
//! Sole read/write path to the persisted save document.
//!
//! The store guarantees a save always exists: a missing file is synthesized
//! from the configured starting coins, and an unreadable one is replaced by a
//! fresh default after the failure is logged. Every overwrite goes through a
//! temp file and a rename, so `save.json` is never left half written.
//!
//! ## Backups
//!
//! Before an existing save is overwritten (when a backup is requested) it is
//! copied into `backups/` as `save-<epoch millis>-<sequence>.json`. At most
//! [`MAX_BACKUPS`] copies are kept; the oldest are deleted first.
//!
//! ## Single writer
//!
//! All operations run through a [`SaveSession`], which holds the store's lock
//! for as long as it lives. Callers that load, mutate and write open one
//! session for the whole unit of work.
//!
//! The lock is not re-entrant. The store-level shortcuts (`load`, `write`,
//! `reset`, `import`, `list_backups`) each open their own session, so they
//! must never be called on a thread that already holds one; use the
//! session's methods instead.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use shared::SaveData;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use tracing::{debug, error, info};

use super::config_provider::ConfigProvider;
use super::connection::JsonConnection;
use crate::domain::clock::Clock;
use crate::domain::models::ImportError;
use crate::domain::save_validation::{check_save_shape, validate_save};

/// Number of backup copies retained in the backup directory
pub const MAX_BACKUPS: usize = 3;

const BACKUP_PREFIX: &str = "save-";
const BACKUP_SUFFIX: &str = ".json";

pub struct SaveStore {
    connection: JsonConnection,
    config: Arc<ConfigProvider>,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl SaveStore {
    pub fn new(connection: JsonConnection, config: Arc<ConfigProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            connection,
            config,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    pub fn connection(&self) -> &JsonConnection {
        &self.connection
    }

    /// Take the store's lock for a load, mutate, write unit of work.
    ///
    /// Blocks while another session is alive, including one held by the
    /// calling thread, which would never be released.
    pub fn session(&self) -> SaveSession<'_> {
        let guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        SaveSession {
            store: self,
            _guard: guard,
        }
    }

    /// Take the lock only if no session is alive right now
    pub fn try_session(&self) -> Option<SaveSession<'_>> {
        let guard = match self.write_lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return None,
        };
        Some(SaveSession {
            store: self,
            _guard: guard,
        })
    }

    /// One-shot session shortcut. Never call while holding a session.
    pub fn load(&self) -> Result<SaveData> {
        self.session().load()
    }

    /// One-shot session shortcut. Never call while holding a session.
    pub fn write(&self, save: &mut SaveData, backup: bool) -> Result<()> {
        self.session().write(save, backup)
    }

    pub fn reset(&self) -> Result<SaveData> {
        self.session().reset()
    }

    pub fn import(&self, candidate: &Value) -> Result<SaveData, ImportError> {
        self.session().import(candidate)
    }

    /// Shallow structural check, see [`validate_save`]
    pub fn validate(&self, candidate: &Value) -> bool {
        validate_save(candidate)
    }

    pub fn list_backups(&self) -> Result<Vec<PathBuf>> {
        self.session().list_backups()
    }

    fn default_save(&self) -> Result<SaveData> {
        let settings = self.config.settings()?;
        let now = self.clock.now();
        Ok(SaveData::fresh(settings.starting_coins, now))
    }
}

/// Exclusive access to the save for the lifetime of the value
pub struct SaveSession<'a> {
    store: &'a SaveStore,
    _guard: MutexGuard<'a, ()>,
}

impl SaveSession<'_> {
    /// Load the current save, creating or recreating it when needed.
    ///
    /// A missing save is initialized without a backup. A save that cannot be
    /// read or parsed is logged and replaced by a fresh default.
    pub fn load(&self) -> Result<SaveData> {
        let connection = &self.store.connection;
        connection.ensure_directories()?;
        let save_path = connection.save_path();

        if !save_path.exists() {
            info!("No save found at {}, creating a new one", save_path.display());
            return self.write_default();
        }

        let parsed = fs::read_to_string(&save_path)
            .context("Failed to read save file")
            .and_then(|raw| serde_json::from_str::<SaveData>(&raw).context("Failed to parse save file"));

        match parsed {
            Ok(save) => Ok(save),
            Err(e) => {
                error!(
                    "Save file {} is unreadable, replacing it with a new save: {:#}",
                    save_path.display(),
                    e
                );
                self.write_default()
            }
        }
    }

    /// Persist `save`, refreshing its `exported_at`.
    ///
    /// With `backup` set and a save already on disk, that save is copied into
    /// the backup directory first.
    pub fn write(&self, save: &mut SaveData, backup: bool) -> Result<()> {
        let connection = &self.store.connection;
        connection.ensure_directories()?;

        if backup && connection.save_path().exists() {
            self.backup_current()?;
        }

        save.exported_at = self.store.clock.now();
        self.write_atomically(save)
    }

    /// Back up the current save and replace it with a fresh default
    pub fn reset(&self) -> Result<SaveData> {
        let mut save = self.store.default_save()?;
        self.write(&mut save, true)?;
        info!("Save reset to defaults");
        Ok(save)
    }

    /// Replace the current save wholesale with `candidate`.
    ///
    /// Rejected candidates leave the save file and backups untouched.
    pub fn import(&self, candidate: &Value) -> Result<SaveData, ImportError> {
        check_save_shape(candidate)?;
        let mut save =
            SaveData::deserialize(candidate).map_err(|e| ImportError::Malformed(e.to_string()))?;

        self.write(&mut save, true)?;
        info!(
            "Imported save with {} habits and {} completions",
            save.habits.len(),
            save.completions.len()
        );
        Ok(save)
    }

    /// Backup files, oldest first
    pub fn list_backups(&self) -> Result<Vec<PathBuf>> {
        let backup_dir = self.store.connection.backup_directory();
        let mut names = self.backup_names()?;
        names.sort();
        Ok(names.into_iter().map(|name| backup_dir.join(name)).collect())
    }

    fn write_default(&self) -> Result<SaveData> {
        let mut save = self.store.default_save()?;
        self.write(&mut save, false)?;
        Ok(save)
    }

    fn backup_current(&self) -> Result<()> {
        self.rotate_backups()?;

        let backup_path = self
            .store
            .connection
            .backup_directory()
            .join(self.next_backup_name()?);
        fs::copy(self.store.connection.save_path(), &backup_path)
            .with_context(|| format!("Failed to create backup {}", backup_path.display()))?;

        debug!("Created backup: {}", backup_path.display());
        Ok(())
    }

    /// Delete the oldest backups until there is room for one more
    fn rotate_backups(&self) -> Result<()> {
        let mut backups = self.list_backups()?.into_iter();
        let mut remaining = backups.len();

        while remaining >= MAX_BACKUPS {
            let Some(oldest) = backups.next() else { break };
            fs::remove_file(&oldest)
                .with_context(|| format!("Failed to remove backup {}", oldest.display()))?;
            debug!("Removed old backup: {}", oldest.display());
            remaining -= 1;
        }
        Ok(())
    }

    /// Timestamped name that sorts after every existing backup from the same
    /// millisecond
    fn next_backup_name(&self) -> Result<String> {
        let millis = self.store.clock.now().timestamp_millis();
        let stamp = format!("{}{:013}-", BACKUP_PREFIX, millis);

        let sequence = self
            .backup_names()?
            .iter()
            .filter_map(|name| {
                name.strip_prefix(&stamp)?
                    .strip_suffix(BACKUP_SUFFIX)?
                    .parse::<u32>()
                    .ok()
            })
            .max()
            .map_or(0, |highest| highest + 1);

        Ok(format!("{}{:03}{}", stamp, sequence, BACKUP_SUFFIX))
    }

    fn backup_names(&self) -> Result<Vec<String>> {
        let backup_dir = self.store.connection.backup_directory();
        let entries = fs::read_dir(&backup_dir)
            .with_context(|| format!("Failed to list backups in {}", backup_dir.display()))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.context("Failed to read backup directory entry")?;
            if let Some(name) = entry.file_name().to_str() {
                if name.starts_with(BACKUP_PREFIX) && name.ends_with(BACKUP_SUFFIX) {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }

    fn write_atomically(&self, save: &SaveData) -> Result<()> {
        let connection = &self.store.connection;
        let temp_path = connection.temp_save_path();
        let save_path = connection.save_path();

        let json = serde_json::to_string_pretty(save).context("Failed to serialize save")?;
        {
            let mut file = File::create(&temp_path)
                .with_context(|| format!("Failed to create {}", temp_path.display()))?;
            file.write_all(json.as_bytes())
                .with_context(|| format!("Failed to write {}", temp_path.display()))?;
            file.sync_all()
                .with_context(|| format!("Failed to sync {}", temp_path.display()))?;
        }
        fs::rename(&temp_path, &save_path)
            .with_context(|| format!("Failed to replace {}", save_path.display()))?;

        debug!("Wrote save to {}", save_path.display());
        Ok(())
    }
}
