use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub sales: SalesConfig,
    #[serde(default)]
    pub laces: LacesConfig,
    /// Spreadsheet mirroring (optional, sales are not mirrored when absent)
    #[serde(default)]
    pub sheet: Option<SheetConfig>,
    #[serde(default)]
    pub ticket_image: TicketImageConfig,
    #[serde(default)]
    pub access: AccessConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub api_url: Option<String>,
    /// Upper bound on updates processed at the same time
    #[serde(default = "default_max_concurrent_updates")]
    pub max_concurrent_updates: usize,
}

fn default_max_concurrent_updates() -> usize {
    64
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "data/logs".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SalesConfig {
    /// Number of VIP tables; `ВИП1..=ВИПn` are sellable
    #[serde(default = "default_vip_tables_count")]
    pub vip_tables_count: u8,
    /// Accepted ticket prices
    #[serde(default = "default_prices")]
    pub prices: Vec<u32>,
    /// Discounted price only special-price sellers may enter
    #[serde(default = "default_special_price")]
    pub special_price: Option<u32>,
}

fn default_vip_tables_count() -> u8 {
    5
}

fn default_prices() -> Vec<u32> {
    vec![17, 20, 22, 25, 30]
}

fn default_special_price() -> Option<u32> {
    Some(15)
}

impl Default for SalesConfig {
    fn default() -> Self {
        Self {
            vip_tables_count: default_vip_tables_count(),
            prices: default_prices(),
            special_price: default_special_price(),
        }
    }
}

/// Wristband colour per ticket type, shown to the entrance staff
#[derive(Debug, Deserialize, Clone)]
pub struct LacesConfig {
    pub base: String,
    pub vip: String,
    pub org: String,
}

impl Default for LacesConfig {
    fn default() -> Self {
        Self {
            base: "Желтый".to_string(),
            vip: "Синий".to_string(),
            org: "Красный".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SheetConfig {
    /// Web-app deployment URL that appends rows to the sales sheet
    pub deployment_url: String,
    pub secret: String,
    pub table_id: String,
    #[serde(default = "default_sheet_timeout_sec")]
    pub timeout_sec: u64,
}

fn default_sheet_timeout_sec() -> u64 {
    15
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TicketImageConfig {
    /// Background image the ticket number is stamped onto; a plain card is drawn when unset
    pub template: Option<String>,
}

/// Telegram usernames allowed to use each part of the bot
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AccessConfig {
    #[serde(default)]
    pub checkers: Vec<String>,
    #[serde(default)]
    pub sellers: Vec<String>,
    #[serde(default)]
    pub vip_sellers: Vec<String>,
    #[serde(default)]
    pub special_price_sellers: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config.toml").required(false))
            .add_source(
                config::Environment::with_prefix("AFTERPARTY")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("sales.prices")
                    .with_list_parse_key("access.checkers")
                    .with_list_parse_key("access.sellers")
                    .with_list_parse_key("access.vip_sellers")
                    .with_list_parse_key("access.special_price_sellers"),
            );

        let config: Config = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.telegram.max_concurrent_updates == 0 {
            anyhow::bail!("telegram.max_concurrent_updates must be at least 1");
        }
        if self.sales.prices.is_empty() {
            anyhow::bail!("sales.prices must list at least one price");
        }
        if self.sales.vip_tables_count == 0 && !self.access.vip_sellers.is_empty() {
            anyhow::bail!("access.vip_sellers is set but sales.vip_tables_count is 0");
        }
        if let Some(sheet) = &self.sheet {
            url::Url::parse(&sheet.deployment_url)
                .with_context(|| format!("Invalid sheet.deployment_url: {}", sheet.deployment_url))?;
        }
        Ok(())
    }

    pub fn log_level(&self) -> tracing::Level {
        match self.logging.level.to_lowercase().as_str() {
            "error" => tracing::Level::ERROR,
            "warn" => tracing::Level::WARN,
            "info" => tracing::Level::INFO,
            "debug" => tracing::Level::DEBUG,
            "trace" => tracing::Level::TRACE,
            _ => tracing::Level::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Result<Config> {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse(
            r#"
            [telegram]
            bot_token = "123:abc"

            [database]
            url = "sqlite::memory:"
            "#,
        )
        .unwrap();

        assert_eq!(config.telegram.max_concurrent_updates, 64);
        assert_eq!(config.sales.prices, vec![17, 20, 22, 25, 30]);
        assert_eq!(config.sales.special_price, Some(15));
        assert_eq!(config.sales.vip_tables_count, 5);
        assert!(config.sheet.is_none());
        assert_eq!(config.log_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = parse(
            r#"
            [telegram]
            bot_token = "123:abc"
            max_concurrent_updates = 0

            [database]
            url = "sqlite::memory:"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_sheet_url_rejected() {
        let result = parse(
            r#"
            [telegram]
            bot_token = "123:abc"

            [database]
            url = "sqlite::memory:"

            [sheet]
            deployment_url = "not a url"
            secret = "s"
            table_id = "t"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_access_lists() {
        let config = parse(
            r#"
            [telegram]
            bot_token = "123:abc"

            [database]
            url = "sqlite::memory:"

            [access]
            checkers = ["door1"]
            sellers = ["anna", "boris"]
            "#,
        )
        .unwrap();
        assert_eq!(config.access.checkers, vec!["door1"]);
        assert_eq!(config.access.sellers.len(), 2);
        assert!(config.access.vip_sellers.is_empty());
    }
}
