//! Habit management for the clinic.
//!
//! ## Business Rules
//!
//! - Habit names are trimmed and must not be empty
//! - Coin rewards are clamped into 1..=5 regardless of what was requested
//! - A habit can be completed at most once per calendar day
//! - Deleting a habit keeps its completion history
//!
//! Every mutation is one load, mutate, write unit inside a single save
//! session. Rejections return before anything is written.

use anyhow::Result;
use shared::{
    CompleteHabitResponse, CreateHabitRequest, CreateHabitResponse, DeleteHabitResponse, Habit,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::clock::Clock;
use crate::domain::models::{clamp_coin_reward, HabitError, MIN_COIN_REWARD};
use crate::domain::streak::HabitStreakEngine;
use crate::storage::{ConfigProvider, SaveStore};

#[derive(Clone)]
pub struct HabitService {
    save_store: Arc<SaveStore>,
    config: Arc<ConfigProvider>,
    clock: Arc<dyn Clock>,
    streak_engine: HabitStreakEngine,
}

impl HabitService {
    pub fn new(save_store: Arc<SaveStore>, config: Arc<ConfigProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            save_store,
            config,
            clock,
            streak_engine: HabitStreakEngine::new(),
        }
    }

    pub fn list_habits(&self) -> Result<Vec<Habit>> {
        Ok(self.save_store.load()?.habits)
    }

    /// Create a habit and append it to the save
    pub fn create_habit(&self, request: CreateHabitRequest) -> Result<CreateHabitResponse, HabitError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(HabitError::EmptyName);
        }

        let recurrence = match request.recurrence {
            Some(recurrence) => recurrence,
            None => self.config.settings()?.habit_settings.default_recurrence,
        };
        let now = self.clock.now();

        let habit = Habit {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            coin_reward: clamp_coin_reward(request.coin_reward.unwrap_or(MIN_COIN_REWARD)),
            recurrence,
            streak: 0,
            longest_streak: 0,
            last_completed: None,
            created_at: now,
        };

        let session = self.save_store.session();
        let mut save = session.load()?;
        save.habits.push(habit.clone());
        session.write(&mut save, true)?;

        info!("Created habit {} ({})", habit.name, habit.id);

        Ok(CreateHabitResponse {
            success_message: format!("Habit \"{}\" created", habit.name),
            habit,
        })
    }

    /// Complete a habit for today, crediting its reward
    pub fn complete_habit(&self, habit_id: &str) -> Result<CompleteHabitResponse, HabitError> {
        if habit_id.is_empty() {
            return Err(HabitError::MissingHabitId);
        }

        let session = self.save_store.session();
        let mut save = session.load()?;

        let index = save
            .habits
            .iter()
            .position(|h| h.id == habit_id)
            .ok_or_else(|| HabitError::HabitNotFound(habit_id.to_string()))?;

        let advance = self
            .streak_engine
            .advance(&save.habits[index], self.clock.now(), &*self.clock)?;
        let coins_awarded = advance.completion.coins_awarded;

        save.habits[index] = advance.habit;
        save.game_state.coins += coins_awarded;
        save.game_state.lifetime_coins += coins_awarded;
        save.completions.push(advance.completion.clone());
        session.write(&mut save, true)?;

        let habit = &save.habits[index];
        info!(
            "Completed habit {}: +{} coins, streak {}",
            habit.name, coins_awarded, habit.streak
        );

        Ok(CompleteHabitResponse {
            habit_name: habit.name.clone(),
            coins_awarded,
            new_streak: habit.streak,
            total_coins: save.game_state.coins,
            completion: advance.completion,
        })
    }

    /// Remove a habit; its completions stay in the history
    pub fn delete_habit(&self, habit_id: &str) -> Result<DeleteHabitResponse, HabitError> {
        if habit_id.is_empty() {
            return Err(HabitError::MissingHabitId);
        }

        let session = self.save_store.session();
        let mut save = session.load()?;

        let index = save
            .habits
            .iter()
            .position(|h| h.id == habit_id)
            .ok_or_else(|| HabitError::HabitNotFound(habit_id.to_string()))?;
        let removed = save.habits.remove(index);
        session.write(&mut save, true)?;

        info!("Deleted habit {} ({})", removed.name, removed.id);

        Ok(DeleteHabitResponse {
            habit_id: removed.id,
            success_message: format!("Habit \"{}\" deleted", removed.name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::FixedClock;
    use crate::storage::json::test_utils::{NewYork2025, TestEnvironment};
    use chrono::{DateTime, Duration};
    use shared::Recurrence;

    fn create_test_service(env: &TestEnvironment) -> HabitService {
        HabitService::new(env.save_store.clone(), env.config.clone(), env.dyn_clock())
    }

    fn request(name: &str, coin_reward: Option<i64>) -> CreateHabitRequest {
        CreateHabitRequest {
            name: name.to_string(),
            coin_reward,
            recurrence: None,
        }
    }

    #[test]
    fn test_create_habit_trims_name_and_applies_defaults() -> Result<()> {
        let env = TestEnvironment::new()?;
        let service = create_test_service(&env);

        let response = service.create_habit(request("  Practice /r/ sounds  ", None))?;

        assert_eq!(response.habit.name, "Practice /r/ sounds");
        assert_eq!(response.habit.coin_reward, 1);
        assert_eq!(response.habit.recurrence, Recurrence::Daily);
        assert_eq!(response.habit.streak, 0);
        assert_eq!(response.habit.longest_streak, 0);
        assert!(response.habit.last_completed.is_none());
        assert_eq!(service.list_habits()?, vec![response.habit]);
        Ok(())
    }

    #[test]
    fn test_create_habit_clamps_coin_reward() -> Result<()> {
        let env = TestEnvironment::new()?;
        let service = create_test_service(&env);

        let high = service.create_habit(request("Read research", Some(50)))?;
        let low = service.create_habit(request("Stretch", Some(-2)))?;

        assert_eq!(high.habit.coin_reward, 5);
        assert_eq!(low.habit.coin_reward, 1);
        Ok(())
    }

    #[test]
    fn test_create_habit_keeps_requested_recurrence() -> Result<()> {
        let env = TestEnvironment::new()?;
        let service = create_test_service(&env);

        let response = service.create_habit(CreateHabitRequest {
            name: "Write session notes".to_string(),
            coin_reward: Some(2),
            recurrence: Some(Recurrence::Weekly),
        })?;

        assert_eq!(response.habit.recurrence, Recurrence::Weekly);
        Ok(())
    }

    #[test]
    fn test_create_habit_rejects_blank_name() -> Result<()> {
        let env = TestEnvironment::new()?;
        let service = create_test_service(&env);

        let result = service.create_habit(request("   ", Some(3)));

        assert!(matches!(result, Err(HabitError::EmptyName)));
        assert!(service.list_habits()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_complete_habit_awards_coins_and_records_completion() -> Result<()> {
        let env = TestEnvironment::new()?;
        let service = create_test_service(&env);
        let habit = service.create_habit(request("Review caseload", Some(3)))?.habit;

        let response = service.complete_habit(&habit.id)?;

        assert_eq!(response.habit_name, "Review caseload");
        assert_eq!(response.coins_awarded, 3);
        assert_eq!(response.new_streak, 1);
        assert_eq!(response.total_coins, 13);

        let save = env.save_store.load()?;
        assert_eq!(save.game_state.coins, 13);
        assert_eq!(save.game_state.lifetime_coins, 3);
        assert_eq!(save.completions, vec![response.completion]);
        Ok(())
    }

    #[test]
    fn test_second_completion_same_day_changes_nothing() -> Result<()> {
        let env = TestEnvironment::new()?;
        let service = create_test_service(&env);
        let habit = service.create_habit(request("Review caseload", Some(3)))?.habit;
        service.complete_habit(&habit.id)?;
        let before = env.save_store.load()?;

        env.clock.advance(Duration::hours(2));
        let result = service.complete_habit(&habit.id);

        assert!(matches!(result, Err(HabitError::AlreadyCompletedToday)));
        let after = env.save_store.load()?;
        assert_eq!(after.game_state.coins, before.game_state.coins);
        assert_eq!(after.completions.len(), 1);
        assert_eq!(after.habits[0].streak, 1);
        Ok(())
    }

    #[test]
    fn test_streak_grows_on_consecutive_days_and_resets_after_gap() -> Result<()> {
        let env = TestEnvironment::new()?;
        let service = create_test_service(&env);
        let habit = service.create_habit(request("Read research", Some(2)))?.habit;

        service.complete_habit(&habit.id)?;
        env.clock.advance(Duration::days(1));
        assert_eq!(service.complete_habit(&habit.id)?.new_streak, 2);
        env.clock.advance(Duration::days(1));
        assert_eq!(service.complete_habit(&habit.id)?.new_streak, 3);

        env.clock.advance(Duration::days(3));
        assert_eq!(service.complete_habit(&habit.id)?.new_streak, 1);

        let stored = &env.save_store.load()?.habits[0];
        assert_eq!(stored.streak, 1);
        assert_eq!(stored.longest_streak, 3);
        Ok(())
    }

    #[test]
    fn test_complete_unknown_or_missing_habit() -> Result<()> {
        let env = TestEnvironment::new()?;
        let service = create_test_service(&env);

        assert!(matches!(service.complete_habit(""), Err(HabitError::MissingHabitId)));
        assert!(matches!(
            service.complete_habit("no-such-habit"),
            Err(HabitError::HabitNotFound(id)) if id == "no-such-habit"
        ));
        assert_eq!(env.save_store.load()?.game_state.coins, 10);
        Ok(())
    }

    #[test]
    fn test_delete_habit_keeps_completions() -> Result<()> {
        let env = TestEnvironment::new()?;
        let service = create_test_service(&env);
        let habit = service.create_habit(request("Stretch", Some(1)))?.habit;
        service.complete_habit(&habit.id)?;

        let response = service.delete_habit(&habit.id)?;

        assert_eq!(response.habit_id, habit.id);
        let save = env.save_store.load()?;
        assert!(save.habits.is_empty());
        assert_eq!(save.completions.len(), 1);
        assert_eq!(save.completions[0].habit_id, habit.id);
        Ok(())
    }

    #[test]
    fn test_delete_unknown_habit() -> Result<()> {
        let env = TestEnvironment::new()?;
        let service = create_test_service(&env);

        assert!(matches!(service.delete_habit(""), Err(HabitError::MissingHabitId)));
        assert!(matches!(
            service.delete_habit("missing"),
            Err(HabitError::HabitNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_completion_days_survive_daylight_saving_change() -> Result<()> {
        let env = TestEnvironment::new()?;
        let at = |s: &str| DateTime::parse_from_rfc3339(s).unwrap();
        // 00:30 EDT on Nov 2
        let clock = Arc::new(FixedClock::with_calendar(
            at("2025-11-02T04:30:00Z").with_timezone(&chrono::Utc),
            NewYork2025,
        ));
        let service = HabitService::new(env.save_store.clone(), env.config.clone(), clock.clone());
        let habit = service.create_habit(request("Practice articulation", Some(2)))?.habit;
        service.complete_habit(&habit.id)?;

        // 23:00 EST, still Nov 2 after the clocks went back
        clock.set(at("2025-11-03T04:00:00Z"));
        assert!(matches!(
            service.complete_habit(&habit.id),
            Err(HabitError::AlreadyCompletedToday)
        ));

        // 00:30 EST on Nov 3
        clock.set(at("2025-11-03T05:30:00Z"));
        assert_eq!(service.complete_habit(&habit.id)?.new_streak, 2);
        assert_eq!(env.save_store.load()?.completions.len(), 2);
        Ok(())
    }

    #[test]
    fn test_concurrent_creates_are_all_kept() -> Result<()> {
        let env = TestEnvironment::new()?;
        let service = create_test_service(&env);

        std::thread::scope(|scope| {
            for i in 0..8 {
                let service = service.clone();
                scope.spawn(move || {
                    service
                        .create_habit(request(&format!("Habit {}", i), Some(1)))
                        .unwrap();
                });
            }
        });

        let mut names: Vec<String> = service.list_habits()?.into_iter().map(|h| h.name).collect();
        names.sort();
        let expected: Vec<String> = (0..8).map(|i| format!("Habit {}", i)).collect();
        assert_eq!(names, expected);
        Ok(())
    }
}
