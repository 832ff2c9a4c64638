pub mod app_config;
pub mod database;
pub mod seat_repo;
pub mod redis_repo;
pub mod events;

pub use database::DbClient;
pub use seat_repo::PostgresSeatRepository;
pub use redis_repo::RedisClient;
pub use events::{EventProducer, KafkaRelay};
