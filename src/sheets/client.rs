use super::{SaleSink, SheetError};
use crate::config::SheetConfig;
use crate::conversation::Sale;
use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Row appended by the spreadsheet web app
#[derive(Debug, Serialize)]
struct SaleRow<'a> {
    secret: &'a str,
    table_id: &'a str,
    ticket_number: i64,
    full_name: &'a str,
    ticket_type: String,
    price: u32,
    repost: bool,
    seller: &'a str,
    sold_at: String,
}

#[derive(Debug, Deserialize)]
struct SheetResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
}

pub struct SheetClient {
    client: reqwest::Client,
    config: SheetConfig,
}

impl SheetClient {
    pub fn new(config: SheetConfig) -> Result<Self, SheetError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_sec))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl SaleSink for SheetClient {
    async fn record_sale(&self, sale: &Sale, seller: &str, ticket_number: i64) -> Result<(), SheetError> {
        let row = SaleRow {
            secret: &self.config.secret,
            table_id: &self.config.table_id,
            ticket_number,
            full_name: &sale.full_name,
            ticket_type: sale.ticket_type.to_string(),
            price: sale.price,
            repost: sale.repost,
            seller,
            sold_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        };

        let response = self
            .client
            .post(&self.config.deployment_url)
            .json(&row)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SheetError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        // The web app answers 200 with a status field even on failure
        let body = response.text().await?;
        if let Ok(parsed) = serde_json::from_str::<SheetResponse>(&body) {
            if !parsed.status.is_empty() && !parsed.status.eq_ignore_ascii_case("ok") {
                warn!("Sheet rejected ticket {}: {}", ticket_number, body);
                return Err(SheetError::Rejected {
                    status: status.as_u16(),
                    message: parsed.message.unwrap_or(parsed.status),
                });
            }
        }

        info!("Ticket {} recorded in sheet", ticket_number);
        Ok(())
    }
}
