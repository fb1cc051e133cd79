//! Mirroring of sales into the organisers' spreadsheet.

mod client;

pub use client::SheetClient;

use crate::conversation::Sale;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("sheet service rejected the row ({status}): {message}")]
    Rejected { status: u16, message: String },
}

#[async_trait]
pub trait SaleSink: Send + Sync {
    async fn record_sale(&self, sale: &Sale, seller: &str, ticket_number: i64) -> Result<(), SheetError>;
}

/// Used when no spreadsheet is configured.
pub struct NoopSink;

#[async_trait]
impl SaleSink for NoopSink {
    async fn record_sale(&self, _sale: &Sale, _seller: &str, _ticket_number: i64) -> Result<(), SheetError> {
        Ok(())
    }
}
