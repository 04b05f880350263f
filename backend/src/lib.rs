//! # Clinic Backend
//!
//! Persisted game-state engine for the habit clinic: the save document, the
//! rules that mutate it and the engines that derive streaks and idle income.
//!
//! The backend is UI-agnostic. Any outer layer (a web handler, a desktop UI,
//! the bundled binary) builds an [`AppState`] once and calls the services on
//! it; every call is synchronous and blocks only on local file I/O.
//!
//! ## Architecture
//!
//! ```text
//! Outer layer (routes, UI)
//!     ↓
//! Domain Layer (services and pure engines)
//!     ↓
//! Storage Layer (save store, config provider)
//! ```

pub mod domain;
pub mod storage;

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::domain::{
    Clock, HabitService, IdleService, SaveService, ShopService, StatsService, SystemClock,
};
use crate::storage::{ConfigProvider, JsonConnection, SaveStore};

pub use shared;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub save_store: Arc<SaveStore>,
    pub config: Arc<ConfigProvider>,
    pub habit_service: HabitService,
    pub shop_service: ShopService,
    pub idle_service: IdleService,
    pub save_service: SaveService,
    pub stats_service: StatsService,
}

/// Initialize the backend from `DATA_DIR` and `CONFIG_DIR` with the system clock
pub fn initialize_backend() -> Result<AppState> {
    info!("Setting up data directory");
    let connection = JsonConnection::new_default()?;
    let config = Arc::new(ConfigProvider::new_default());

    Ok(build_app_state(connection, config, Arc::new(SystemClock)))
}

/// Wire every service onto one shared save store
pub fn build_app_state(
    connection: JsonConnection,
    config: Arc<ConfigProvider>,
    clock: Arc<dyn Clock>,
) -> AppState {
    info!("Setting up domain services");
    let save_store = Arc::new(SaveStore::new(connection, config.clone(), clock.clone()));

    AppState {
        habit_service: HabitService::new(save_store.clone(), config.clone(), clock.clone()),
        shop_service: ShopService::new(save_store.clone(), config.clone()),
        idle_service: IdleService::new(save_store.clone(), config.clone(), clock.clone()),
        save_service: SaveService::new(save_store.clone(), clock.clone()),
        stats_service: StatsService::new(save_store.clone(), config.clone(), clock),
        save_store,
        config,
    }
}
