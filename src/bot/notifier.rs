use crate::conversation::Choice;
use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::adaptors::Throttle;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQueryId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, KeyboardButton,
    KeyboardMarkup, KeyboardRemove, ReplyMarkup,
};
use tracing::info;

pub type ThrottledBot = Throttle<Bot>;

/// Outbound side of the chat transport. Failures are reported to the caller, who
/// logs them; nothing is retried.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;

    async fn send_choice(&self, chat_id: i64, prompt: &str, choice: &Choice) -> Result<()>;

    async fn send_image(&self, chat_id: i64, png: Vec<u8>, caption: &str) -> Result<()>;

    async fn answer_callback(&self, callback_id: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct TelegramNotifier {
    bot: ThrottledBot,
}

impl TelegramNotifier {
    pub fn new(bot: ThrottledBot) -> Self {
        Self { bot }
    }
}

fn reply_markup(choice: &Choice) -> ReplyMarkup {
    match choice {
        Choice::Keyboard(rows) => {
            let rows: Vec<Vec<KeyboardButton>> = rows
                .iter()
                .map(|row| row.iter().map(KeyboardButton::new).collect())
                .collect();
            ReplyMarkup::Keyboard(KeyboardMarkup::new(rows).resize_keyboard())
        }
        Choice::Inline(rows) => {
            let rows: Vec<Vec<InlineKeyboardButton>> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|(label, data)| InlineKeyboardButton::callback(label, data))
                        .collect()
                })
                .collect();
            ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(rows))
        }
        Choice::RemoveKeyboard => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .await
            .context("Failed to send Telegram message")?;
        Ok(())
    }

    async fn send_choice(&self, chat_id: i64, prompt: &str, choice: &Choice) -> Result<()> {
        self.bot
            .send_message(ChatId(chat_id), prompt)
            .reply_markup(reply_markup(choice))
            .await
            .context("Failed to send Telegram message with keyboard")?;
        Ok(())
    }

    async fn send_image(&self, chat_id: i64, png: Vec<u8>, caption: &str) -> Result<()> {
        info!("Sending ticket image to chat {}", chat_id);
        self.bot
            .send_photo(ChatId(chat_id), InputFile::memory(png).file_name("ticket.png"))
            .caption(caption)
            .await
            .context("Failed to send ticket image")?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        self.bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()))
            .await
            .context("Failed to answer callback query")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_markup_keeps_callback_data() {
        let choice = Choice::Inline(vec![vec![("Ivan (ID: 3)".to_string(), "enter:3".to_string())]]);
        match reply_markup(&choice) {
            ReplyMarkup::InlineKeyboard(markup) => {
                assert_eq!(markup.inline_keyboard.len(), 1);
                assert_eq!(markup.inline_keyboard[0][0].text, "Ivan (ID: 3)");
            }
            other => panic!("unexpected markup {other:?}"),
        }
    }

    #[test]
    fn test_keyboard_rows() {
        let choice = Choice::Keyboard(vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["c".to_string()],
        ]);
        match reply_markup(&choice) {
            ReplyMarkup::Keyboard(markup) => {
                assert_eq!(markup.keyboard.len(), 2);
                assert_eq!(markup.keyboard[0].len(), 2);
            }
            other => panic!("unexpected markup {other:?}"),
        }
    }
}
