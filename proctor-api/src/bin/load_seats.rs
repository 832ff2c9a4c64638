//! Imports a seat layout CSV into Postgres.
//!
//! Usage: `load_seats [layout.csv]`, defaulting to `seats.csv`. Connection
//! settings come from the regular config layers.

use anyhow::{bail, Context};
use proctor_core::layout::load_layout;
use proctor_core::SeatRepository;
use proctor_store::app_config::Config;
use proctor_store::{DbClient, PostgresSeatRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "seats.csv".to_string());

    let config = Config::load()?;
    let Some(db) = config.database else {
        bail!("no [database] section configured");
    };

    let seats = load_layout(&path).with_context(|| format!("Failed to load layout {}", path))?;
    tracing::info!("Parsed {} seats from {}", seats.len(), path);

    let client = DbClient::new(&db.url, db.max_connections).await?;
    client.migrate().await?;

    PostgresSeatRepository::new(client.pool)
        .insert_seats(&seats)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to insert seats: {}", e))?;

    Ok(())
}
