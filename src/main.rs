use anyhow::{anyhow, Context, Result};
use disol::config::AppConfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "disol=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load_default().context("failed to load configuration")?;
    info!(
        storage = %config.storage_dir().display(),
        voice = config.speech.command.is_some(),
        "Starting DIsol"
    );

    disol::ui::run(config).map_err(|e| anyhow!("UI error: {}", e))?;

    Ok(())
}
