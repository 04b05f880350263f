use crate::domain::save_validation::SaveShapeError;

/// Confirmation phrase a reset request must carry
pub const RESET_CONFIRMATION: &str = "RESET";

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Invalid save file format: {0}")]
    InvalidFormat(#[from] SaveShapeError),
    #[error("Failed to parse save file: {0}")]
    Unparseable(String),
    #[error("Save file contains records that cannot be read: {0}")]
    Malformed(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ResetError {
    #[error("Please type \"RESET\" to confirm")]
    ConfirmationMismatch,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
