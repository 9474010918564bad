use anyhow::Result;
use coffee_calc::config::{LogFormat, Settings};
use coffee_calc::Application;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    match settings.logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new()?;
    init_tracing(&settings);

    let recipe = std::env::args_os().nth(1).map(PathBuf::from);
    info!("Starting Coffee Calc");

    let app = Application::with_settings(settings)?;
    if let Some(summary) = app.run(recipe.as_deref()).await? {
        info!(
            steps = summary.steps,
            total_time = summary.total_time,
            total_grams = summary.total_grams,
            "Playback finished"
        );
    }

    Ok(())
}
