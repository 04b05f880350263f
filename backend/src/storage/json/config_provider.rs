//! Read-only game configuration.
//!
//! The upgrade catalog, tunable settings and streak milestone table are JSON
//! documents in the config directory. Each one is parsed the first time it is
//! asked for and then cached until [`ConfigProvider::clear_cache`] is called,
//! which works through a shared reference so a provider already handed to
//! services can still be reloaded. The provider is handed to services
//! explicitly rather than living in a global.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use shared::{SettingsConfig, StreakRewardsConfig, Upgrade, UpgradeCategory, UpgradesConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

pub const UPGRADES_FILE: &str = "upgrades.json";
pub const SETTINGS_FILE: &str = "settings.json";
pub const STREAK_REWARDS_FILE: &str = "streakRewards.json";

const DEFAULT_CONFIG_DIR: &str = "./config";

type Cached<T> = RwLock<Option<Arc<T>>>;

/// Lazily loaded, cached configuration documents
#[derive(Debug)]
pub struct ConfigProvider {
    config_directory: PathBuf,
    upgrades: Cached<UpgradesConfig>,
    settings: Cached<SettingsConfig>,
    streak_rewards: Cached<StreakRewardsConfig>,
}

impl ConfigProvider {
    /// Create a provider that reads documents from `config_directory` on demand
    pub fn new<P: AsRef<Path>>(config_directory: P) -> Self {
        Self {
            config_directory: config_directory.as_ref().to_path_buf(),
            upgrades: RwLock::new(None),
            settings: RwLock::new(None),
            streak_rewards: RwLock::new(None),
        }
    }

    /// Create a provider for the directory named by `CONFIG_DIR`, or `./config`
    pub fn new_default() -> Self {
        let config_directory = std::env::var("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_DIR));

        info!("Using config directory: {}", config_directory.display());
        Self::new(config_directory)
    }

    /// Create a provider whose caches are already populated.
    ///
    /// Nothing is read from disk unless the cache is cleared afterwards.
    pub fn from_documents(
        upgrades: UpgradesConfig,
        settings: SettingsConfig,
        streak_rewards: StreakRewardsConfig,
    ) -> Self {
        Self {
            config_directory: PathBuf::from(DEFAULT_CONFIG_DIR),
            upgrades: RwLock::new(Some(Arc::new(upgrades))),
            settings: RwLock::new(Some(Arc::new(settings))),
            streak_rewards: RwLock::new(Some(Arc::new(streak_rewards))),
        }
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    pub fn upgrades(&self) -> Result<Arc<UpgradesConfig>> {
        self.cached(&self.upgrades, UPGRADES_FILE)
    }

    pub fn settings(&self) -> Result<Arc<SettingsConfig>> {
        self.cached(&self.settings, SETTINGS_FILE)
    }

    pub fn streak_rewards(&self) -> Result<Arc<StreakRewardsConfig>> {
        self.cached(&self.streak_rewards, STREAK_REWARDS_FILE)
    }

    /// Look up a catalog entry by key
    pub fn get_upgrade(&self, key: &str) -> Result<Option<Upgrade>> {
        Ok(self
            .upgrades()?
            .upgrades
            .iter()
            .find(|u| u.key == key)
            .cloned())
    }

    pub fn available_upgrades(&self) -> Result<Vec<Upgrade>> {
        Ok(self.upgrades()?.upgrades.clone())
    }

    pub fn upgrades_by_category(&self, category: UpgradeCategory) -> Result<Vec<Upgrade>> {
        Ok(self
            .upgrades()?
            .upgrades
            .iter()
            .filter(|u| u.category == category)
            .cloned()
            .collect())
    }

    pub fn all_categories(&self) -> [UpgradeCategory; 5] {
        UpgradeCategory::ALL
    }

    /// Drop every cached document so the next access re-reads from disk
    pub fn clear_cache(&self) {
        *self.upgrades.write().unwrap_or_else(PoisonError::into_inner) = None;
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = None;
        *self.streak_rewards.write().unwrap_or_else(PoisonError::into_inner) = None;
        info!("Cleared cached config documents");
    }

    fn cached<T: DeserializeOwned>(&self, slot: &Cached<T>, file_name: &str) -> Result<Arc<T>> {
        let hit = slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone);
        if let Some(document) = hit {
            return Ok(document);
        }

        // Another caller may have loaded it while we waited for the write lock
        let mut slot = slot.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(document) = slot.as_ref() {
            return Ok(Arc::clone(document));
        }
        let document = self.read_document(file_name)?;
        *slot = Some(Arc::clone(&document));
        Ok(document)
    }

    fn read_document<T: DeserializeOwned>(&self, file_name: &str) -> Result<Arc<T>> {
        let path = self.config_directory.join(file_name);
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let document = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        info!("Loaded {}", path.display());
        Ok(Arc::new(document))
    }
}
