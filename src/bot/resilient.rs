//! Operator replies with automatic retry on transient Telegram API failures.

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatId, KeyboardMarkup, Message};

/// Send a reply with automatic retry on network failures.
///
/// Uses [`crate::utils::retry_telegram_operation`] with exponential backoff
/// to handle transient network errors. When `keyboard` is set it replaces the
/// operator's reply keyboard.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn send_reply_resilient(
    bot: &Bot,
    chat_id: ChatId,
    text: impl Into<String>,
    keyboard: Option<KeyboardMarkup>,
) -> Result<Message> {
    let text = text.into();
    crate::utils::retry_telegram_operation(|| async {
        let mut req = bot.send_message(chat_id, text.clone());
        if let Some(markup) = keyboard.clone() {
            req = req.reply_markup(markup);
        }
        req.await
            .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))
    })
    .await
}
