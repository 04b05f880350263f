#[derive(Debug, thiserror::Error)]
pub enum PurchaseError {
    #[error("Invalid upgrade key")]
    InvalidUpgradeKey,
    #[error("Upgrade not found: {0}")]
    UpgradeNotFound(String),
    #[error("Upgrade already owned: {0}")]
    AlreadyOwned(String),
    #[error("Not enough coins: need {required}, have {available}")]
    NotEnoughCoins { required: i64, available: i64 },
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
