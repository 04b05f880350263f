//! Lazy settlement of idle rewards.
//!
//! There is no timer: rewards for the time since the last settlement are
//! computed whenever a caller asks, and credited only when they amount to at
//! least one coin. Otherwise `last_idle_tick` stays put so the elapsed time
//! keeps accumulating.

use anyhow::Result;
use shared::IdleSettlementResponse;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::clock::Clock;
use crate::domain::idle_rewards::{format_idle_time, IdleRewardEngine};
use crate::storage::{ConfigProvider, SaveStore};

#[derive(Clone)]
pub struct IdleService {
    save_store: Arc<SaveStore>,
    config: Arc<ConfigProvider>,
    clock: Arc<dyn Clock>,
    engine: IdleRewardEngine,
}

impl IdleService {
    pub fn new(save_store: Arc<SaveStore>, config: Arc<ConfigProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            save_store,
            config,
            clock,
            engine: IdleRewardEngine::new(),
        }
    }

    pub fn settle_idle_rewards(&self) -> Result<IdleSettlementResponse> {
        let settings = self.config.settings()?;
        let catalog = self.config.upgrades()?;
        let now = self.clock.now();

        let session = self.save_store.session();
        let mut save = session.load()?;

        let rewards = self
            .engine
            .compute(&save, &settings.idle_settings, &catalog.upgrades, &now);
        let applied = rewards.coins > 0;

        if applied {
            let game_state = &mut save.game_state;
            game_state.coins += rewards.coins;
            game_state.lifetime_coins += rewards.coins;
            game_state.clients_seen += rewards.clients;
            game_state.last_idle_tick = now;
            session.write(&mut save, true)?;

            info!(
                "Idle rewards: {} clients, {} coins over {}{}",
                rewards.clients,
                rewards.coins,
                format_idle_time(rewards.time_elapsed_ms),
                if rewards.capped { " (capped)" } else { "" }
            );
        } else {
            debug!("No idle rewards after {} ms", rewards.time_elapsed_ms);
        }

        Ok(IdleSettlementResponse {
            rewards,
            applied,
            formatted_time: format_idle_time(rewards.time_elapsed_ms),
            game_state: save.game_state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::idle_rewards::MS_PER_HOUR;
    use crate::storage::json::test_utils::{test_start, TestEnvironment};
    use chrono::{Duration, Utc};

    fn create_test_service(env: &TestEnvironment) -> IdleService {
        IdleService::new(env.save_store.clone(), env.config.clone(), env.dyn_clock())
    }

    #[test]
    fn test_settlement_credits_rewards_and_advances_tick() -> Result<()> {
        let env = TestEnvironment::new()?;
        let service = create_test_service(&env);
        env.save_store.load()?;

        env.clock.advance(Duration::hours(2));
        let response = service.settle_idle_rewards()?;

        // 5 clients/hour * 2 hours * 2 coins
        assert!(response.applied);
        assert_eq!(response.rewards.clients, 10);
        assert_eq!(response.rewards.coins, 20);
        assert_eq!(response.formatted_time, "2 hours");

        let save = env.save_store.load()?;
        assert_eq!(save.game_state.coins, 30);
        assert_eq!(save.game_state.lifetime_coins, 20);
        assert_eq!(save.game_state.clients_seen, 10);
        assert_eq!(
            save.game_state.last_idle_tick,
            (test_start() + Duration::hours(2)).with_timezone(&Utc)
        );
        assert_eq!(response.game_state, save.game_state);
        Ok(())
    }

    #[test]
    fn test_sub_coin_rewards_are_not_applied() -> Result<()> {
        let env = TestEnvironment::new()?;
        let service = create_test_service(&env);
        let initial = env.save_store.load()?;

        env.clock.advance(Duration::minutes(10));
        let response = service.settle_idle_rewards()?;

        assert!(!response.applied);
        assert_eq!(response.rewards.coins, 0);
        let save = env.save_store.load()?;
        assert_eq!(save.game_state, initial.game_state);
        assert!(env.save_store.list_backups()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_unapplied_time_keeps_accumulating() -> Result<()> {
        let env = TestEnvironment::new()?;
        let service = create_test_service(&env);
        env.save_store.load()?;

        // 5 clients/hour needs 12 minutes for the first client
        env.clock.advance(Duration::minutes(10));
        assert!(!service.settle_idle_rewards()?.applied);

        env.clock.advance(Duration::minutes(5));
        let response = service.settle_idle_rewards()?;

        assert!(response.applied);
        assert_eq!(response.rewards.clients, 1);
        assert_eq!(response.rewards.coins, 2);
        assert_eq!(response.formatted_time, "15 minutes");
        Ok(())
    }

    #[test]
    fn test_long_absence_is_capped() -> Result<()> {
        let env = TestEnvironment::new()?;
        let service = create_test_service(&env);
        env.save_store.load()?;

        env.clock.advance(Duration::hours(30));
        let response = service.settle_idle_rewards()?;

        assert!(response.rewards.capped);
        assert_eq!(response.rewards.time_elapsed_ms, 8 * MS_PER_HOUR);
        assert_eq!(response.rewards.coins, 80);
        assert_eq!(response.formatted_time, "8 hours");
        Ok(())
    }

    #[test]
    fn test_purchased_upgrades_raise_income() -> Result<()> {
        let env = TestEnvironment::new()?;
        let service = create_test_service(&env);
        let mut save = env.save_store.load()?;
        save.purchased_upgrades = vec!["receptionist".to_string()];
        env.save_store.write(&mut save, false)?;

        env.clock.advance(Duration::hours(2));
        let response = service.settle_idle_rewards()?;

        assert_eq!(response.rewards.clients, 10);
        assert_eq!(response.rewards.coins, 30);
        Ok(())
    }
}
