/// Manila worker - runs the asynchronous job pipelines
///
/// Builds the application context, spawns the thumbnail and welcome
/// worker loops, and runs until interrupted.
use manila::{jobs, AppContext, Config, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "manila=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Create application context
    let (ctx, receivers) = AppContext::new(config).await?;

    let status = ctx.status().await;
    tracing::info!(db = status.db, redis = status.redis, "manila worker starting");

    // Start the pipelines
    tokio::spawn(jobs::run_thumbnail_worker(
        ctx.file_store.clone(),
        ctx.storage.clone(),
        receivers.thumbnails,
        receivers.failure_tx.clone(),
    ));
    tokio::spawn(jobs::run_welcome_worker(
        ctx.users.clone(),
        ctx.notifier.clone(),
        receivers.welcomes,
        receivers.failure_tx,
    ));
    tokio::spawn(jobs::log_failures(receivers.failures));

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    Ok(())
}
