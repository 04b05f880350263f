//! # JSON Storage Module
//!
//! File-based persistence for the clinic. The whole game lives in one JSON
//! document; read-only game tunables live in a separate config directory.
//!
//! ## Layout
//!
//! ```text
//! <DATA_DIR>/save.json                        current save
//! <DATA_DIR>/backups/save-<millis>-<seq>.json rolling backups (3 kept)
//! <CONFIG_DIR>/upgrades.json                  upgrade catalog
//! <CONFIG_DIR>/settings.json                  idle rates, starting coins
//! <CONFIG_DIR>/streakRewards.json             streak milestone table
//! ```

pub mod config_provider;
pub mod connection;
pub mod save_repository;

#[cfg(test)]
pub mod test_utils;

pub use config_provider::ConfigProvider;
pub use connection::JsonConnection;
pub use save_repository::{SaveSession, SaveStore, MAX_BACKUPS};
