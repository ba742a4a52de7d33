//! Librarium - single-user library management application

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use librarium::{config::AppConfig, console, repository::Repository, services::Services};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing; logs also go to the configured file when set
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("librarium={}", config.logging.level).into());

    let mut appender_guard = None;
    let file_layer = config.logging.file.as_deref().map(|file| {
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(".", file));
        appender_guard = Some(guard);
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    tracing::info!("Starting Librarium v{}", env!("CARGO_PKG_VERSION"));

    // Open the database and apply migrations
    let repository = Repository::connect(&config.database).await?;

    tracing::info!("Connected to database");

    // Create services and seed the admin account on first run
    let services = Services::new(repository, &config);
    services.auth.ensure_default_user().await?;

    console::run(&services).await?;

    drop(appender_guard);
    Ok(())
}
