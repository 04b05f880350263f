/// Smallest coin reward a habit can carry
pub const MIN_COIN_REWARD: i64 = 1;
/// Largest coin reward a habit can carry
pub const MAX_COIN_REWARD: i64 = 5;

/// Clamp a requested coin reward into the allowed range
pub fn clamp_coin_reward(requested: i64) -> i64 {
    requested.clamp(MIN_COIN_REWARD, MAX_COIN_REWARD)
}

#[derive(Debug, thiserror::Error)]
pub enum HabitError {
    #[error("Habit name is required")]
    EmptyName,
    #[error("Habit ID is required")]
    MissingHabitId,
    #[error("Habit not found: {0}")]
    HabitNotFound(String),
    #[error("Habit already completed today")]
    AlreadyCompletedToday,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
