use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Schema version written into every new save
pub const SAVE_VERSION: u32 = 1;

/// The single persisted document holding all player progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveData {
    /// Schema version tag
    pub version: u32,
    /// Refreshed on every write (RFC 3339)
    pub exported_at: DateTime<Utc>,
    pub game_state: GameState,
    pub habits: Vec<Habit>,
    /// Append-only completion history, in insertion order
    pub completions: Vec<Completion>,
    /// Purchased upgrade keys; each key appears at most once
    pub purchased_upgrades: Vec<String>,
    /// Milestone day-thresholds already claimed, keyed by habit id
    pub claimed_streak_rewards: BTreeMap<String, Vec<u32>>,
}

impl SaveData {
    /// Build a brand new save seeded with the configured starting coins
    pub fn fresh(starting_coins: i64, now: DateTime<Utc>) -> Self {
        Self {
            version: SAVE_VERSION,
            exported_at: now,
            game_state: GameState {
                coins: starting_coins,
                lifetime_coins: 0,
                clients_seen: 0,
                last_idle_tick: now,
                created_at: now,
            },
            habits: Vec::new(),
            completions: Vec::new(),
            purchased_upgrades: Vec::new(),
            claimed_streak_rewards: BTreeMap::new(),
        }
    }

    pub fn owns_upgrade(&self, upgrade_key: &str) -> bool {
        self.purchased_upgrades.iter().any(|k| k == upgrade_key)
    }
}

/// Singleton economic state of the clinic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Current spendable balance
    pub coins: i64,
    /// Total coins ever earned (never decreases)
    pub lifetime_coins: i64,
    /// Total clients ever seen (never decreases)
    pub clients_seen: i64,
    /// Last moment idle rewards were settled
    pub last_idle_tick: DateTime<Utc>,
    /// Set once when the save is first created
    pub created_at: DateTime<Utc>,
}

/// How often a habit is meant to recur.
///
/// Stored for display only: streaks are always counted in calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Recurrence {
    Daily,
    Weekly,
    OneOff,
}

impl Default for Recurrence {
    fn default() -> Self {
        Recurrence::Daily
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recurrence::Daily => write!(f, "daily"),
            Recurrence::Weekly => write!(f, "weekly"),
            Recurrence::OneOff => write!(f, "one-off"),
        }
    }
}

/// A recurring task the player completes to earn coins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub name: String,
    /// Coins awarded per completion, always within 1..=5
    pub coin_reward: i64,
    pub recurrence: Recurrence,
    /// Current consecutive-day count
    pub streak: u32,
    /// Running maximum of `streak`
    pub longest_streak: u32,
    pub last_completed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Immutable record of a single habit completion.
///
/// Survives deletion of the habit it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub id: String,
    pub habit_id: String,
    pub completed_at: DateTime<Utc>,
    /// Reward snapshot taken at completion time
    pub coins_awarded: i64,
}

/// Shop category an upgrade belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeCategory {
    Assessment,
    Tool,
    Decor,
    Staff,
    Expansion,
}

impl UpgradeCategory {
    /// Every category, in shop display order
    pub const ALL: [UpgradeCategory; 5] = [
        UpgradeCategory::Assessment,
        UpgradeCategory::Tool,
        UpgradeCategory::Decor,
        UpgradeCategory::Staff,
        UpgradeCategory::Expansion,
    ];
}

/// Additive modifiers an upgrade applies to idle income
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeEffect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_capacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satisfaction_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_multiplier: Option<f64>,
}

/// Where the scene renderer places an upgrade's sprite
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpritePosition {
    pub x: f64,
    pub y: f64,
}

/// A one-time purchasable clinic upgrade from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upgrade {
    pub key: String,
    pub category: UpgradeCategory,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cost: i64,
    #[serde(default)]
    pub effects: UpgradeEffect,
    #[serde(default)]
    pub sprite: Option<String>,
    #[serde(default)]
    pub position: Option<SpritePosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradesConfig {
    pub upgrades: Vec<Upgrade>,
}

/// Bonus paid out once a habit streak reaches `days`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakMilestone {
    pub days: u32,
    pub coins: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakRewardsConfig {
    pub milestones: Vec<StreakMilestone>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdleSettings {
    pub base_clients_per_hour: f64,
    pub max_idle_hours: f64,
    pub base_coins_per_client: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitSettings {
    pub max_coin_reward: i64,
    pub default_recurrence: Recurrence,
}

/// Tunable game settings loaded from `settings.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsConfig {
    pub idle_settings: IdleSettings,
    pub habit_settings: HabitSettings,
    pub starting_coins: i64,
}

/// Advisory outcome of an idle reward computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdleRewardResult {
    pub coins: i64,
    pub clients: i64,
    /// Elapsed time actually credited (after the cap)
    pub time_elapsed_ms: i64,
    /// True when offline time exceeded the cap and the excess was dropped
    pub capped: bool,
}

impl IdleRewardResult {
    pub fn nothing(elapsed_ms: i64) -> Self {
        Self {
            coins: 0,
            clients: 0,
            time_elapsed_ms: elapsed_ms,
            capped: false,
        }
    }
}

/// Request for creating a new habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHabitRequest {
    pub name: String,
    /// Clamped into 1..=5; defaults to 1
    pub coin_reward: Option<i64>,
    /// Defaults to the configured recurrence
    pub recurrence: Option<Recurrence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHabitResponse {
    pub habit: Habit,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteHabitResponse {
    pub habit_name: String,
    pub coins_awarded: i64,
    pub new_streak: u32,
    pub total_coins: i64,
    pub completion: Completion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteHabitResponse {
    pub habit_id: String,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopListingResponse {
    pub upgrades: Vec<Upgrade>,
    pub purchased_upgrades: Vec<String>,
    pub coins: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseUpgradeResponse {
    pub upgrade_key: String,
    pub new_balance: i64,
    pub success_message: String,
}

/// Result of settling idle rewards on read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdleSettlementResponse {
    pub rewards: IdleRewardResult,
    /// Whether the rewards were credited and persisted
    pub applied: bool,
    /// Human readable credited time, e.g. "2 hours and 5 minutes"
    pub formatted_time: String,
    pub game_state: GameState,
}

/// A save serialized for download
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSaveResponse {
    pub filename: String,
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSaveResponse {
    pub save: SaveData,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetSaveResponse {
    pub save: SaveData,
    pub success_message: String,
}

/// Lifetime progress numbers for the stats page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummaryResponse {
    pub coins: i64,
    pub lifetime_coins: i64,
    pub clients_seen: i64,
    pub habits_count: usize,
    pub completions_count: usize,
    pub upgrades_count: usize,
    pub days_playing: i64,
    pub best_streak: u32,
    pub created_at: DateTime<Utc>,
}

/// One upgrade's contribution to an effect total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSource {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectStat {
    pub base: f64,
    pub bonus: f64,
    pub sources: Vec<EffectSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectTotals {
    pub client_capacity: EffectStat,
    pub satisfaction_percent: EffectStat,
    pub income_multiplier: EffectStat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub category: UpgradeCategory,
    pub upgrades: Vec<Upgrade>,
}

/// Breakdown of what the purchased upgrades do for the clinic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicStatsResponse {
    pub stats: EffectTotals,
    pub upgrades_by_category: Vec<CategoryGroup>,
    pub total_upgrades: usize,
    pub total_spent: i64,
}
