use migration::{Migrator, MigratorTrait};
use receipt::{DEFAULT_ENDPOINT, ReceiptScanner, VisionClient};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "moneta={level},server={level},engine={level},receipt={level}",
            level = settings.app.level
        ))
        .init();

    let http = settings.server;
    let timezone = http.timezone()?;
    tracing::info!("using timezone {timezone}");

    let db = parse_database(&http.database).await?;

    let mut builder = engine::Engine::builder()
        .database(db.clone())
        .timezone(timezone);
    if let Some(months) = http.trend_months {
        builder = builder.trend_months(months);
    }
    let engine = builder.build().await?;

    let receipts = match settings.receipt {
        Some(receipt) if !receipt.api_key.is_empty() => {
            let endpoint = receipt
                .endpoint
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
            let vision = VisionClient::new(reqwest::Client::new(), endpoint, receipt.api_key);
            Some(ReceiptScanner::with_keywords(vision)?)
        }
        _ => {
            tracing::warn!("no receipt api_key configured, receipt scanning disabled");
            None
        }
    };

    let state = server::ServerState::new(engine, db, receipts);
    let listener = tokio::net::TcpListener::bind(http.address()).await?;
    server::run_with_listener(state, listener).await?;

    Ok(())
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
