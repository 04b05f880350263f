//! # Domain Module
//!
//! Business logic for the habit clinic.
//!
//! ## Architecture
//!
//! ```text
//! Services (habits, shop, idle settlement, save management, stats)
//!     ↓
//! Engines (streak transitions, idle reward computation, save validation)
//!     ↓
//! Storage (save store, config provider)
//! ```
//!
//! The engines are pure: they take a snapshot and a moment in time and return
//! a result without touching disk. Services own the load, mutate, write cycle
//! and run it inside one save session.

pub mod clock;
pub mod habit_service;
pub mod idle_rewards;
pub mod idle_service;
pub mod models;
pub mod save_service;
pub mod save_validation;
pub mod shop_service;
pub mod stats_service;
pub mod streak;

pub use clock::{Calendar, Clock, FixedClock, SystemClock};
pub use habit_service::HabitService;
pub use idle_rewards::{format_idle_time, IdleRates, IdleRewardEngine};
pub use idle_service::IdleService;
pub use save_service::SaveService;
pub use save_validation::{check_save_shape, validate_save, SaveShapeError};
pub use shop_service::ShopService;
pub use stats_service::StatsService;
pub use streak::{HabitStreakEngine, StreakAdvance, StreakState};
