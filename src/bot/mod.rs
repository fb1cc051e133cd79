pub mod commands;
pub mod notifier;

use crate::runtime::{Inbound, Payload};
use anyhow::Result;
use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
use teloxide::dptree;
use teloxide::prelude::*;
use teloxide::types::{BotCommandScope, Me};
use teloxide::utils::command::BotCommands;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub use commands::Command;
pub use notifier::{Notifier, TelegramNotifier, ThrottledBot};

type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;
type HandlerResult = Result<(), HandlerError>;

/// Receives Telegram updates until ctrl-c and forwards them to the dispatch loop.
///
/// The sender is dropped when this returns, which lets the dispatch loop drain.
pub async fn run(bot: ThrottledBot, inbound: mpsc::Sender<Inbound>) -> Result<()> {
    info!("Starting Telegram Bot...");

    setup_commands(&bot).await;

    Dispatcher::builder(bot, build_handler_tree())
        .dependencies(dptree::deps![inbound])
        .default_handler(|_| async {})
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Telegram dispatcher stopped");
    Ok(())
}

fn build_handler_tree() -> teloxide::dispatching::UpdateHandler<HandlerError> {
    let message_handler = Update::filter_message().branch(
        Message::filter_text()
            .filter(is_private_chat)
            .endpoint(forward_message),
    );

    let callback_handler = Update::filter_callback_query().endpoint(forward_callback);

    dptree::entry()
        .branch(message_handler)
        .branch(callback_handler)
}

/// The dialogue is one-on-one; group messages are not served.
fn is_private_chat(message: Message) -> bool {
    message.chat.is_private()
}

/// Removes `@<bot>` mentions so they never end up in a buyer's name or a price.
fn strip_mention(text: &str, bot_username: &str) -> String {
    let mention = format!("@{}", bot_username);
    text.split_whitespace()
        .filter(|word| !word.eq_ignore_ascii_case(&mention))
        .collect::<Vec<_>>()
        .join(" ")
}

async fn forward_message(
    msg: Message,
    me: Me,
    text: String,
    inbound: mpsc::Sender<Inbound>,
) -> HandlerResult {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let update = Inbound {
        chat_id: msg.chat.id.0,
        user_id: user.id.0 as i64,
        username: user.username.clone(),
        payload: Payload::Text(strip_mention(&text, me.username())),
    };
    forward(&inbound, update).await;
    Ok(())
}

async fn forward_callback(q: CallbackQuery, inbound: mpsc::Sender<Inbound>) -> HandlerResult {
    let (Some(data), Some(chat_id)) = (q.data.clone(), q.message.as_ref().map(|m| m.chat().id))
    else {
        return Ok(());
    };

    let update = Inbound {
        chat_id: chat_id.0,
        user_id: q.from.id.0 as i64,
        username: q.from.username.clone(),
        payload: Payload::Callback {
            id: q.id.0.clone(),
            data,
        },
    };
    forward(&inbound, update).await;
    Ok(())
}

async fn forward(inbound: &mpsc::Sender<Inbound>, update: Inbound) {
    let chat_id = update.chat_id;
    if inbound.send(update).await.is_err() {
        warn!("Dispatch loop is gone, dropping update for chat {}", chat_id);
    }
}

async fn setup_commands(bot: &ThrottledBot) {
    if let Err(e) = bot
        .set_my_commands(Command::bot_commands())
        .scope(BotCommandScope::Default)
        .await
    {
        warn!("Failed to set bot commands: {:#}", e);
    } else {
        info!("✅ Set bot commands");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_mention() {
        assert_eq!(strip_mention("@AfterpartyBot Ivan Petrov", "AfterpartyBot"), "Ivan Petrov");
        assert_eq!(strip_mention("20 @afterpartybot", "AfterpartyBot"), "20");
        assert_eq!(strip_mention("/sell@AfterpartyBot", "AfterpartyBot"), "/sell@AfterpartyBot");
        assert_eq!(strip_mention("Ivan Petrov", "AfterpartyBot"), "Ivan Petrov");
    }

    #[test]
    fn test_mention_with_digits_does_not_become_price() {
        let text = strip_mention("@party2025bot 20", "party2025bot");
        assert_eq!(text, "20");
    }
}
