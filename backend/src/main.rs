use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use clinic_backend::initialize_backend;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let state = initialize_backend()?;

    let settlement = state.idle_service.settle_idle_rewards()?;
    if settlement.applied {
        info!(
            "Welcome back! While you were away for {}, your clinic saw {} clients and earned {} coins",
            settlement.formatted_time, settlement.rewards.clients, settlement.rewards.coins
        );
    }

    let summary = state.stats_service.summary()?;
    info!(
        "Day {}: {} coins ({} lifetime), {} habits, {} upgrades, best streak {}",
        summary.days_playing,
        summary.coins,
        summary.lifetime_coins,
        summary.habits_count,
        summary.upgrades_count,
        summary.best_streak
    );
    info!("Save file: {}", state.save_store.connection().save_path().display());

    Ok(())
}
