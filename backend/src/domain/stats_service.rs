//! Read-only progress reporting.
//!
//! `summary` backs the player's stats page; `clinic_stats` explains what the
//! purchased upgrades contribute, effect by effect.

use anyhow::Result;
use shared::{
    CategoryGroup, ClinicStatsResponse, EffectSource, EffectStat, EffectTotals,
    StatsSummaryResponse, Upgrade, UpgradeCategory,
};
use std::sync::Arc;
use tracing::warn;

use crate::domain::clock::Clock;
use crate::storage::{ConfigProvider, SaveStore};

const MS_PER_DAY: i64 = 86_400_000;

const BASE_CLIENT_CAPACITY: f64 = 5.0;
const BASE_SATISFACTION_PERCENT: f64 = 0.0;
const BASE_INCOME_MULTIPLIER: f64 = 1.0;

#[derive(Clone)]
pub struct StatsService {
    save_store: Arc<SaveStore>,
    config: Arc<ConfigProvider>,
    clock: Arc<dyn Clock>,
}

impl StatsService {
    pub fn new(save_store: Arc<SaveStore>, config: Arc<ConfigProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            save_store,
            config,
            clock,
        }
    }

    pub fn summary(&self) -> Result<StatsSummaryResponse> {
        let save = self.save_store.load()?;
        let now = self.clock.now();

        // Day one is the day the save was created
        let elapsed_ms = (now - save.game_state.created_at).num_milliseconds();
        let days_playing = elapsed_ms.div_euclid(MS_PER_DAY) + 1;
        let best_streak = save
            .habits
            .iter()
            .map(|h| h.longest_streak)
            .max()
            .unwrap_or(0);

        Ok(StatsSummaryResponse {
            coins: save.game_state.coins,
            lifetime_coins: save.game_state.lifetime_coins,
            clients_seen: save.game_state.clients_seen,
            habits_count: save.habits.len(),
            completions_count: save.completions.len(),
            upgrades_count: save.purchased_upgrades.len(),
            days_playing,
            best_streak,
            created_at: save.game_state.created_at,
        })
    }

    pub fn clinic_stats(&self) -> Result<ClinicStatsResponse> {
        let catalog = self.config.upgrades()?;
        let save = self.save_store.load()?;

        let purchased: Vec<&Upgrade> = save
            .purchased_upgrades
            .iter()
            .filter_map(|key| {
                let upgrade = catalog.upgrades.iter().find(|u| &u.key == key);
                if upgrade.is_none() {
                    warn!("Purchased upgrade {} is not in the catalog", key);
                }
                upgrade
            })
            .collect();

        let mut stats = EffectTotals {
            client_capacity: empty_stat(BASE_CLIENT_CAPACITY),
            satisfaction_percent: empty_stat(BASE_SATISFACTION_PERCENT),
            income_multiplier: empty_stat(BASE_INCOME_MULTIPLIER),
        };
        for upgrade in &purchased {
            let effects = &upgrade.effects;
            add_source(&mut stats.client_capacity, upgrade, effects.client_capacity);
            add_source(&mut stats.satisfaction_percent, upgrade, effects.satisfaction_percent);
            add_source(&mut stats.income_multiplier, upgrade, effects.income_multiplier);
        }

        let upgrades_by_category = UpgradeCategory::ALL
            .iter()
            .map(|&category| CategoryGroup {
                category,
                upgrades: purchased
                    .iter()
                    .filter(|u| u.category == category)
                    .map(|&u| u.clone())
                    .collect(),
            })
            .collect();

        Ok(ClinicStatsResponse {
            stats,
            upgrades_by_category,
            total_upgrades: purchased.len(),
            total_spent: purchased.iter().map(|u| u.cost).sum(),
        })
    }
}

fn empty_stat(base: f64) -> EffectStat {
    EffectStat {
        base,
        bonus: 0.0,
        sources: Vec::new(),
    }
}

/// Zero-valued effects do not count as a source
fn add_source(stat: &mut EffectStat, upgrade: &Upgrade, value: Option<f64>) {
    if let Some(value) = value.filter(|v| *v != 0.0) {
        stat.bonus += value;
        stat.sources.push(EffectSource {
            name: upgrade.name.clone(),
            value,
        });
    }
}
