//! Offline ("idle") reward accrual.
//!
//! Converts the wall-clock time since the last settlement into clients seen
//! and coins earned. Nothing here mutates the save; applying the result is the
//! caller's job, and only worth doing when coins were actually earned.

use chrono::{DateTime, TimeZone, Utc};
use shared::{IdleRewardResult, IdleSettings, SaveData, Upgrade};
use tracing::debug;

/// Minimum offline time before anything is credited
pub const MIN_IDLE_MS: i64 = 60_000;
pub const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_MINUTE: i64 = 60_000;

/// Clients per hour added by each unit of `clientCapacity`
const CLIENTS_PER_CAPACITY: f64 = 0.1;
/// Coins per client added by each unit of `satisfactionPercent`
const COINS_PER_SATISFACTION: f64 = 0.05;
/// Bonus per habit with a live streak
const STREAK_BONUS_PER_HABIT: f64 = 0.01;

/// Effective income rates after upgrades are applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdleRates {
    pub clients_per_hour: f64,
    pub coins_per_client: f64,
    pub income_multiplier: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IdleRewardEngine;

impl IdleRewardEngine {
    pub fn new() -> Self {
        Self
    }

    /// Base rates plus the additive effects of every purchased upgrade.
    ///
    /// Keys missing from the catalog are skipped.
    pub fn rates(
        &self,
        purchased_upgrades: &[String],
        settings: &IdleSettings,
        catalog: &[Upgrade],
    ) -> IdleRates {
        let mut rates = IdleRates {
            clients_per_hour: settings.base_clients_per_hour,
            coins_per_client: settings.base_coins_per_client,
            income_multiplier: 1.0,
        };

        for key in purchased_upgrades {
            let Some(upgrade) = catalog.iter().find(|u| &u.key == key) else {
                debug!("Skipping unknown upgrade key: {}", key);
                continue;
            };
            let effects = &upgrade.effects;
            if let Some(capacity) = effects.client_capacity {
                rates.clients_per_hour += capacity * CLIENTS_PER_CAPACITY;
            }
            if let Some(satisfaction) = effects.satisfaction_percent {
                rates.coins_per_client += satisfaction * COINS_PER_SATISFACTION;
            }
            if let Some(multiplier) = effects.income_multiplier {
                rates.income_multiplier += multiplier;
            }
        }

        rates
    }

    /// Rewards earned between `save.game_state.last_idle_tick` and `now`
    pub fn compute<Tz: TimeZone>(
        &self,
        save: &SaveData,
        settings: &IdleSettings,
        catalog: &[Upgrade],
        now: &DateTime<Tz>,
    ) -> IdleRewardResult {
        let elapsed = (now.with_timezone(&Utc) - save.game_state.last_idle_tick).num_milliseconds();
        if elapsed < MIN_IDLE_MS {
            return IdleRewardResult::nothing(elapsed);
        }

        // Time beyond the cap is discarded, never banked
        let max_elapsed = (settings.max_idle_hours * MS_PER_HOUR as f64) as i64;
        let effective_elapsed = elapsed.min(max_elapsed);
        let capped = elapsed > max_elapsed;

        let rates = self.rates(&save.purchased_upgrades, settings, catalog);

        let hours_elapsed = effective_elapsed as f64 / MS_PER_HOUR as f64;
        let clients = (rates.clients_per_hour * hours_elapsed).floor() as i64;
        let base_coins = clients as f64 * rates.coins_per_client * rates.income_multiplier;

        let active_streaks = save.habits.iter().filter(|h| h.streak > 0).count();
        let streak_multiplier = 1.0 + active_streaks as f64 * STREAK_BONUS_PER_HABIT;

        let coins = (base_coins * streak_multiplier).floor() as i64;

        IdleRewardResult {
            coins,
            clients,
            time_elapsed_ms: effective_elapsed,
            capped,
        }
    }
}

/// Render a duration as "N hours and M minutes", dropping a zero unit
pub fn format_idle_time(ms: i64) -> String {
    let ms = ms.max(0);
    let hours = ms / MS_PER_HOUR;
    let minutes = (ms % MS_PER_HOUR) / MS_PER_MINUTE;

    if hours == 0 {
        plural(minutes, "minute")
    } else if minutes == 0 {
        plural(hours, "hour")
    } else {
        format!("{} and {}", plural(hours, "hour"), plural(minutes, "minute"))
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("{} {}", count, unit)
    } else {
        format!("{} {}s", count, unit)
    }
}
