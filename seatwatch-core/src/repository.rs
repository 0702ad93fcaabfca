use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::watch::Watch;

/// Owner of a watch, as far as notification delivery is concerned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Repository trait for watch persistence
#[async_trait]
pub trait WatchStore: Send + Sync {
    /// Watches with an enabled alert whose flight has not departed yet.
    async fn find_active_alert_watches(&self) -> Result<Vec<Watch>, StoreError>;

    /// Full overwrite of one watch, alert state included.
    async fn upsert(&self, watch: &Watch) -> Result<(), StoreError>;
}

/// Repository trait for user lookups
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, owner_id: &str) -> Result<Option<User>, StoreError>;
}
