use std::sync::Arc;
use anyhow::Context;
use proctor_core::layout::load_layout;
use proctor_core::seating::picker_for;
use proctor_core::{AssignmentStore, ChangeNotifier, InMemorySeatRepository, SeatRepository, SeatingService};
use proctor_store::app_config::Config;
use proctor_store::{DbClient, EventProducer, KafkaRelay, PostgresSeatRepository, RedisClient};
use crate::realtime::RealtimeHub;
use crate::state::{AppState, AuthConfig};

const CLIENT_BUFFER: usize = 64;

/// Wires repositories, picker, notifier and the realtime hub from config.
pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let seating = &config.seating;

    let repo: Arc<dyn SeatRepository> = match &config.database {
        Some(db) => {
            let client = DbClient::new(&db.url, db.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            client.migrate().await.context("Failed to run migrations")?;
            Arc::new(PostgresSeatRepository::new(client.pool))
        }
        None => {
            let seats = match &seating.layout_path {
                Some(path) => load_layout(path)
                    .with_context(|| format!("Failed to load layout {}", path))?,
                None => Vec::new(),
            };
            tracing::warn!("No database configured, serving {} seats from memory", seats.len());
            Arc::new(InMemorySeatRepository::with_seats(seats))
        }
    };

    let picker = picker_for(&seating.strategy, seating.row_width)?;
    tracing::info!("Seating strategy: {}", picker.name());

    let realtime = Arc::new(RealtimeHub::new(CLIENT_BUFFER));
    if let Some(kafka) = &config.kafka {
        let producer = EventProducer::new(&kafka.brokers).context("Failed to create Kafka producer")?;
        realtime
            .attach(Arc::new(KafkaRelay::new(producer, vec![seating.topic.clone()])))
            .await;
    }

    let redis = match &config.redis {
        Some(redis) => Some(Arc::new(
            RedisClient::new(&redis.url).await.context("Failed to connect to Redis")?,
        )),
        None => None,
    };

    let service = SeatingService::new(
        AssignmentStore::new(repo, picker),
        ChangeNotifier::new(seating.notify_chunk_size),
        realtime.clone(),
        seating.topic.clone(),
    );

    Ok(AppState {
        seating: Arc::new(service),
        realtime,
        redis,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    })
}
