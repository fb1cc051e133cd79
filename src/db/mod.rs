//! Database module
pub mod entities;
pub mod repo;
pub mod types;

use crate::conversation::Sale;
use crate::error::AppResult;
use async_trait::async_trait;
use entities::tickets;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

pub async fn establish_connection(database_url: &str) -> AppResult<DatabaseConnection> {
    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(5)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    let connection = Database::connect(opt).await?;
    info!("Connected to database");

    Ok(connection)
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ticket not found")]
    NotFound,
    #[error("ticket {0} already passed control")]
    AlreadyEntered(i64),
    #[error("a ticket for {0} already exists")]
    Duplicate(String),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Ticket persistence used by the conversation processor.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Tickets whose normalised surname starts with `prefix`.
    async fn search_by_surname(&self, prefix: &str) -> Result<Vec<tickets::Model>, StoreError>;

    /// Tickets whose normalised full name equals `name`.
    async fn search_by_full_name(&self, name: &str) -> Result<Vec<tickets::Model>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<tickets::Model, StoreError>;

    /// Flags the ticket as having passed the control zone.
    async fn mark_entered(&self, id: i64) -> Result<tickets::Model, StoreError>;

    /// Persists a sale and returns the new ticket number.
    async fn sell_ticket(&self, sale: &Sale, seller: &str) -> Result<i64, StoreError>;
}
