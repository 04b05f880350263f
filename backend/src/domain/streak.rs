//! Habit streak transitions.
//!
//! Streaks are counted in calendar days of the player's time zone, not in
//! rolling 24 hour windows. A completion on the day right after the previous
//! one extends the streak; anything later starts over at 1. Each instant is
//! mapped to its day with the offset in force at that instant, so a daylight
//! saving change never moves an earlier completion onto another day.

use chrono::{DateTime, Utc};
use shared::{Completion, Habit};
use uuid::Uuid;

use crate::domain::clock::Calendar;
use crate::domain::models::HabitError;

/// Where a habit stands relative to "today"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakState {
    NeverCompleted,
    CompletedToday,
    /// Last completed yesterday, so completing today extends the streak
    Active,
    /// Last completed before yesterday
    Broken,
}

/// Outcome of a successful completion
#[derive(Debug, Clone, PartialEq)]
pub struct StreakAdvance {
    /// The habit with its streak fields updated
    pub habit: Habit,
    /// History record to append to the save
    pub completion: Completion,
}

/// Pure streak state machine for a single habit
#[derive(Debug, Clone, Copy, Default)]
pub struct HabitStreakEngine;

impl HabitStreakEngine {
    pub fn new() -> Self {
        Self
    }

    /// Classify `habit` relative to the day `now` falls on in `calendar`
    pub fn state<C: Calendar + ?Sized>(
        &self,
        habit: &Habit,
        now: DateTime<Utc>,
        calendar: &C,
    ) -> StreakState {
        let Some(last) = habit.last_completed else {
            return StreakState::NeverCompleted;
        };
        let last_day = calendar.local_day(last);
        let today = calendar.local_day(now);

        if last_day == today {
            StreakState::CompletedToday
        } else if Some(last_day) == today.pred_opt() {
            StreakState::Active
        } else {
            StreakState::Broken
        }
    }

    /// Record a completion of `habit` at `now`.
    ///
    /// Rejects a second completion on the same calendar day without touching
    /// anything. The completion's reward is a snapshot of the habit's current
    /// `coin_reward`; crediting it to the game state is up to the caller.
    pub fn advance<C: Calendar + ?Sized>(
        &self,
        habit: &Habit,
        now: DateTime<Utc>,
        calendar: &C,
    ) -> Result<StreakAdvance, HabitError> {
        let streak = match self.state(habit, now, calendar) {
            StreakState::CompletedToday => return Err(HabitError::AlreadyCompletedToday),
            StreakState::Active => habit.streak.saturating_add(1),
            StreakState::NeverCompleted | StreakState::Broken => 1,
        };

        let mut updated = habit.clone();
        updated.streak = streak;
        updated.longest_streak = updated.longest_streak.max(streak);
        updated.last_completed = Some(now);

        let completion = Completion {
            id: Uuid::new_v4().to_string(),
            habit_id: habit.id.clone(),
            completed_at: now,
            coins_awarded: habit.coin_reward,
        };

        Ok(StreakAdvance {
            habit: updated,
            completion,
        })
    }
}
