use std::sync::Arc;

use engine::{BookingEvent, Engine};
use migration::{Migrator, MigratorTrait};
use settings::Database;
use tokio::sync::broadcast::error::RecvError;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "booking={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.database).await?;
    let engine = Arc::new(
        Engine::builder()
            .database(db)
            .posting_point(settings.ledger.posting_point)
            .build()
            .await?,
    );
    tracing::info!(
        "engine ready, settlement entries posted at {}",
        engine.posting_point()
    );

    let mut events = engine.subscribe();
    tasks.spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!("event logger lagged, {missed} events skipped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    if let Some(server) = settings.server {
        let engine = Arc::clone(&engine);
        tasks.spawn(async move {
            tracing::info!("Found server settings...");
            let config = server::ServerConfig {
                bind: server.bind.unwrap_or_else(|| "127.0.0.1".to_string()),
                port: server.port,
                api_token: server.api_token,
            };
            server::run(engine, config).await;
        });
    } else {
        tracing::warn!("no [server] settings, nothing to serve");
        return Ok(());
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

/// Stands in for customer notifications.
fn log_event(event: &BookingEvent) {
    match serde_json::to_string(event) {
        Ok(json) => tracing::info!(reference = event.reference(), "booking event {json}"),
        Err(err) => tracing::error!("failed to serialize booking event: {err}"),
    }
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
