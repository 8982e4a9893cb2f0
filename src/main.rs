use anyhow::Result;
use parley::app::{run_console, Assistant, Capabilities};
use parley::settings::Settings;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Parley assistant");

    let settings = Settings::load();

    // Platform speech capabilities are wired in by the embedding
    // environment; the console runs without them.
    let assistant = Assistant::new(settings, Capabilities::none());
    run_console(assistant).await?;

    Ok(())
}
