pub mod alert_message;
pub mod app_config;
pub mod availability_client;
pub mod database;
pub mod events;
pub mod user_repo;
pub mod watch_repo;

pub use availability_client::HttpAvailabilitySource;
pub use database::DbClient;
pub use events::{EventProducer, KafkaAlertSender};
pub use user_repo::PostgresUserStore;
pub use watch_repo::PostgresWatchStore;
