//! Test utilities with automatic cleanup and deterministic time
//!
//! Every environment lives in its own temporary directory, which is removed
//! when the environment is dropped, even if the test panics.

use anyhow::Result;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use shared::{
    HabitSettings, IdleSettings, Recurrence, SettingsConfig, StreakMilestone, StreakRewardsConfig,
    Upgrade, UpgradeCategory, UpgradeEffect, UpgradesConfig,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use super::config_provider::{ConfigProvider, SETTINGS_FILE, STREAK_REWARDS_FILE, UPGRADES_FILE};
use super::connection::JsonConnection;
use super::save_repository::SaveStore;
use crate::domain::clock::{Calendar, Clock, FixedClock};

/// Moment every test environment starts at
pub const TEST_START: &str = "2025-06-15T12:00:00Z";

pub fn test_start() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(TEST_START).expect("valid test start time")
}

/// US Eastern time for 2025: EDT (UTC-4) from 2025-03-09T07:00Z until
/// 2025-11-02T06:00Z, EST (UTC-5) otherwise
pub struct NewYork2025;

impl Calendar for NewYork2025 {
    fn local_day(&self, instant: DateTime<Utc>) -> NaiveDate {
        let dst_start = Utc.with_ymd_and_hms(2025, 3, 9, 7, 0, 0).unwrap();
        let dst_end = Utc.with_ymd_and_hms(2025, 11, 2, 6, 0, 0).unwrap();
        let hours = if instant >= dst_start && instant < dst_end { -4 } else { -5 };
        let offset = FixedOffset::east_opt(hours * 3600).unwrap();
        instant.with_timezone(&offset).date_naive()
    }
}

pub fn test_settings() -> SettingsConfig {
    SettingsConfig {
        idle_settings: IdleSettings {
            base_clients_per_hour: 5.0,
            max_idle_hours: 8.0,
            base_coins_per_client: 2.0,
        },
        habit_settings: HabitSettings {
            max_coin_reward: 5,
            default_recurrence: Recurrence::Daily,
        },
        starting_coins: 10,
    }
}

fn upgrade(key: &str, category: UpgradeCategory, name: &str, cost: i64, effects: UpgradeEffect) -> Upgrade {
    Upgrade {
        key: key.to_string(),
        category,
        name: name.to_string(),
        description: format!("{} for the clinic", name),
        cost,
        effects,
        sprite: None,
        position: None,
    }
}

pub fn test_catalog() -> UpgradesConfig {
    UpgradesConfig {
        upgrades: vec![
            upgrade(
                "articulation_cards",
                UpgradeCategory::Assessment,
                "Articulation Cards",
                150,
                UpgradeEffect {
                    client_capacity: Some(5.0),
                    income_multiplier: Some(0.25),
                    ..UpgradeEffect::default()
                },
            ),
            upgrade(
                "plant",
                UpgradeCategory::Decor,
                "Potted Plant",
                25,
                UpgradeEffect {
                    satisfaction_percent: Some(2.0),
                    ..UpgradeEffect::default()
                },
            ),
            upgrade(
                "receptionist",
                UpgradeCategory::Staff,
                "Receptionist",
                100,
                UpgradeEffect {
                    income_multiplier: Some(0.5),
                    ..UpgradeEffect::default()
                },
            ),
            upgrade(
                "waiting_chairs",
                UpgradeCategory::Expansion,
                "Waiting Room Chairs",
                50,
                UpgradeEffect {
                    client_capacity: Some(10.0),
                    ..UpgradeEffect::default()
                },
            ),
        ],
    }
}

pub fn test_streak_rewards() -> StreakRewardsConfig {
    StreakRewardsConfig {
        milestones: vec![
            StreakMilestone {
                days: 3,
                coins: 5,
                message: "Three days running!".to_string(),
            },
            StreakMilestone {
                days: 7,
                coins: 15,
                message: "A full week!".to_string(),
            },
            StreakMilestone {
                days: 30,
                coins: 100,
                message: "A month of practice!".to_string(),
            },
        ],
    }
}

/// Write the test catalog, settings and milestones as config files in `dir`
pub fn write_config_documents(dir: &Path) -> Result<()> {
    fs::write(dir.join(UPGRADES_FILE), serde_json::to_string(&test_catalog())?)?;
    fs::write(dir.join(SETTINGS_FILE), serde_json::to_string(&test_settings())?)?;
    fs::write(
        dir.join(STREAK_REWARDS_FILE),
        serde_json::to_string(&test_streak_rewards())?,
    )?;
    Ok(())
}

/// RAII test environment holding a save store on a temporary directory
pub struct TestEnvironment {
    /// Kept alive so the directory survives until drop
    _temp_dir: TempDir,
    pub base_path: PathBuf,
    pub connection: JsonConnection,
    pub config: Arc<ConfigProvider>,
    pub clock: Arc<FixedClock>,
    pub save_store: Arc<SaveStore>,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let base_path = temp_dir.path().to_path_buf();
        let connection = JsonConnection::new(&base_path)?;
        let config = Arc::new(ConfigProvider::from_documents(
            test_catalog(),
            test_settings(),
            test_streak_rewards(),
        ));
        let clock = Arc::new(FixedClock::new(test_start()));
        let save_store = Arc::new(SaveStore::new(
            connection.clone(),
            config.clone(),
            clock.clone(),
        ));

        Ok(TestEnvironment {
            _temp_dir: temp_dir,
            base_path,
            connection,
            config,
            clock,
            save_store,
        })
    }

    /// The clock as the trait object services expect
    pub fn dyn_clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }
}
