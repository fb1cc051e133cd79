use afterparty_bot::bot::{self, TelegramNotifier};
use afterparty_bot::config::Config;
use afterparty_bot::conversation::{AllowList, SessionStore};
use afterparty_bot::db::{self, repo::Repo, TicketStore};
use afterparty_bot::runtime::{dispatch, AdmissionGate, Processor};
use afterparty_bot::sheets::{NoopSink, SaleSink, SheetClient};
use afterparty_bot::ticket_image::{PngTicketRenderer, TicketRenderer};
use anyhow::{Context, Result};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;

    let log_level = config.log_level();
    let log_dir = &config.logging.dir;

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir))?;

    // Daily rotated log file
    let file_appender = tracing_appender::rolling::daily(log_dir, "afterparty_bot.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let local_timer = ChronoLocal::rfc_3339();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_line_number(true)
        .with_file(true)
        .with_target(false)
        .with_timer(local_timer.clone());

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_timer(local_timer)
        .with_writer(non_blocking);

    let filter_layer = EnvFilter::from_default_env()
        .add_directive(log_level.into())
        .add_directive("sqlx=warn".parse()?)
        .add_directive("sea_orm=warn".parse()?);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("Starting Afterparty Bot...");
    info!("Logs are written to: {}", log_dir);

    // Connect to database
    let db = db::establish_connection(&config.database.url).await?;

    migration::Migrator::up(&db, None).await?;
    info!("✅ Database migrations completed");

    let repo = Arc::new(Repo::new(db));
    repo.ping().await?;
    info!("✅ Database ping successful");

    let sheet: Arc<dyn SaleSink> = match config.sheet.clone() {
        Some(sheet_config) => {
            info!("✅ Sales are mirrored to sheet {}", sheet_config.table_id);
            Arc::new(SheetClient::new(sheet_config)?)
        }
        None => {
            warn!("No [sheet] section configured, sales are stored in the database only");
            Arc::new(NoopSink)
        }
    };

    let renderer: Arc<dyn TicketRenderer> =
        Arc::new(PngTicketRenderer::new(config.ticket_image.template.as_deref())?);
    info!("✅ Ticket renderer initialized");

    let mut bot = Bot::new(config.telegram.bot_token.clone());
    if let Some(api_url) = &config.telegram.api_url {
        let url = url::Url::parse(api_url)
            .with_context(|| format!("Invalid telegram.api_url: {}", api_url))?;
        bot = bot.set_api_url(url);
        info!("Using custom Telegram API endpoint {}", api_url);
    }
    let bot = bot.throttle(Limits::default());

    let store: Arc<dyn TicketStore> = repo;
    let processor = Arc::new(Processor::new(
        Arc::new(SessionStore::new()),
        AllowList::from_config(&config.access),
        config.sales.clone(),
        config.laces.clone(),
        store,
        Arc::new(TelegramNotifier::new(bot.clone())),
        sheet,
        renderer,
    ));

    let capacity = config.telegram.max_concurrent_updates;
    let gate = AdmissionGate::new(capacity);
    let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
    let dispatch_handle = tokio::spawn(dispatch::run(inbound_rx, gate, processor));

    info!("🤖 Bot initialized (up to {} updates in flight)", capacity);

    // Returns on ctrl-c; dropping the sender lets the dispatch loop drain
    bot::run(bot, inbound_tx).await?;

    info!("Shutting down gracefully, waiting for in-flight updates...");
    let handled = dispatch_handle
        .await
        .context("Dispatch loop terminated abnormally")?;

    info!("✅ Shutdown complete ({} updates handled)", handled);
    Ok(())
}
