//! Upgrade shop.
//!
//! Upgrades are bought once with coins and are never removed afterwards.

use anyhow::Result;
use shared::{PurchaseUpgradeResponse, ShopListingResponse};
use std::sync::Arc;
use tracing::info;

use crate::domain::models::PurchaseError;
use crate::storage::{ConfigProvider, SaveStore};

#[derive(Clone)]
pub struct ShopService {
    save_store: Arc<SaveStore>,
    config: Arc<ConfigProvider>,
}

impl ShopService {
    pub fn new(save_store: Arc<SaveStore>, config: Arc<ConfigProvider>) -> Self {
        Self { save_store, config }
    }

    /// Full catalog alongside what the player owns and can spend
    pub fn shop_listing(&self) -> Result<ShopListingResponse> {
        let upgrades = self.config.available_upgrades()?;
        let save = self.save_store.load()?;

        Ok(ShopListingResponse {
            upgrades,
            purchased_upgrades: save.purchased_upgrades,
            coins: save.game_state.coins,
        })
    }

    pub fn purchase_upgrade(&self, upgrade_key: &str) -> Result<PurchaseUpgradeResponse, PurchaseError> {
        if upgrade_key.is_empty() {
            return Err(PurchaseError::InvalidUpgradeKey);
        }

        let upgrade = self
            .config
            .get_upgrade(upgrade_key)?
            .ok_or_else(|| PurchaseError::UpgradeNotFound(upgrade_key.to_string()))?;

        let session = self.save_store.session();
        let mut save = session.load()?;

        if save.owns_upgrade(upgrade_key) {
            return Err(PurchaseError::AlreadyOwned(upgrade_key.to_string()));
        }
        if save.game_state.coins < upgrade.cost {
            return Err(PurchaseError::NotEnoughCoins {
                required: upgrade.cost,
                available: save.game_state.coins,
            });
        }

        save.game_state.coins -= upgrade.cost;
        save.purchased_upgrades.push(upgrade.key.clone());
        session.write(&mut save, true)?;

        info!(
            "Purchased upgrade {} for {} coins, {} left",
            upgrade.key, upgrade.cost, save.game_state.coins
        );

        Ok(PurchaseUpgradeResponse {
            upgrade_key: upgrade.key,
            new_balance: save.game_state.coins,
            success_message: format!("{} added to your clinic!", upgrade.name),
        })
    }
}
