use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the live save document inside the data directory
pub const SAVE_FILE_NAME: &str = "save.json";
/// Name of the backup directory inside the data directory
pub const BACKUP_DIR_NAME: &str = "backups";

const DEFAULT_DATA_DIR: &str = "./data";

/// JsonConnection resolves where the save document and its backups live
#[derive(Debug, Clone)]
pub struct JsonConnection {
    data_directory: PathBuf,
}

impl JsonConnection {
    /// Create a connection rooted at `data_directory`, creating it if needed
    pub fn new<P: AsRef<Path>>(data_directory: P) -> Result<Self> {
        let connection = Self {
            data_directory: data_directory.as_ref().to_path_buf(),
        };
        connection.ensure_directories()?;
        Ok(connection)
    }

    /// Create a connection in the directory named by `DATA_DIR`, or `./data`
    pub fn new_default() -> Result<Self> {
        let data_directory = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));

        info!("Using data directory: {}", data_directory.display());
        Self::new(data_directory)
    }

    pub fn data_directory(&self) -> &Path {
        &self.data_directory
    }

    pub fn save_path(&self) -> PathBuf {
        self.data_directory.join(SAVE_FILE_NAME)
    }

    /// Scratch file the save is written to before being renamed into place
    pub fn temp_save_path(&self) -> PathBuf {
        self.data_directory.join(format!("{}.tmp", SAVE_FILE_NAME))
    }

    pub fn backup_directory(&self) -> PathBuf {
        self.data_directory.join(BACKUP_DIR_NAME)
    }

    /// Create the data and backup directories if they are missing.
    ///
    /// Called before every read or write; a failure here is fatal for the
    /// operation that triggered it.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [self.data_directory.clone(), self.backup_directory()] {
            if !dir.exists() {
                fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create directory {}", dir.display()))?;
                debug!("Created directory: {}", dir.display());
            }
        }
        Ok(())
    }
}
