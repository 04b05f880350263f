//! Whole-save operations: export, import and reset.
//!
//! Import and reset replace the save wholesale and always back up the
//! previous one first. Export is read-only.

use anyhow::{Context, Result};
use serde_json::Value;
use shared::{ExportSaveResponse, ImportSaveResponse, ResetSaveResponse, SaveData};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::clock::Clock;
use crate::domain::models::{ImportError, ResetError, RESET_CONFIRMATION};
use crate::storage::SaveStore;

const EXPORT_FILE_PREFIX: &str = "habit-clinic-save";

#[derive(Clone)]
pub struct SaveService {
    save_store: Arc<SaveStore>,
    clock: Arc<dyn Clock>,
}

impl SaveService {
    pub fn new(save_store: Arc<SaveStore>, clock: Arc<dyn Clock>) -> Self {
        Self { save_store, clock }
    }

    pub fn current_save(&self) -> Result<SaveData> {
        self.save_store.load()
    }

    /// Serialize the current save for download, named after today's UTC date
    pub fn export_save(&self) -> Result<ExportSaveResponse> {
        let save = self.save_store.load()?;
        let contents = serde_json::to_string_pretty(&save).context("Failed to serialize save")?;
        let date = self.clock.now().format("%Y-%m-%d");

        Ok(ExportSaveResponse {
            filename: format!("{}-{}.json", EXPORT_FILE_PREFIX, date),
            contents,
        })
    }

    /// Import a save from the raw text of an uploaded file
    pub fn import_save_str(&self, text: &str) -> Result<ImportSaveResponse, ImportError> {
        let candidate: Value =
            serde_json::from_str(text).map_err(|e| ImportError::Unparseable(e.to_string()))?;
        self.import_save(&candidate)
    }

    pub fn import_save(&self, candidate: &Value) -> Result<ImportSaveResponse, ImportError> {
        match self.save_store.import(candidate) {
            Ok(save) => Ok(ImportSaveResponse {
                save,
                success_message: "Save imported successfully! Your progress has been restored."
                    .to_string(),
            }),
            Err(e) => {
                warn!("Rejected save import: {}", e);
                Err(e)
            }
        }
    }

    /// Start over, provided the caller typed the confirmation phrase
    pub fn reset_save(&self, confirmation: &str) -> Result<ResetSaveResponse, ResetError> {
        if confirmation != RESET_CONFIRMATION {
            return Err(ResetError::ConfirmationMismatch);
        }

        let save = self.save_store.reset()?;
        info!("Save reset by request");

        Ok(ResetSaveResponse {
            save,
            success_message: "Save reset successfully. Your journey begins anew!".to_string(),
        })
    }
}
