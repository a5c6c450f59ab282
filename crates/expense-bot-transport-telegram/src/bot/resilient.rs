//! Resilient messaging with automatic retry for Telegram API operations.
//!
//! Replies are retried on transient network failures using exponential
//! backoff with jitter.

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatId, Message};

/// Send a plain-text message with automatic retry on network failures.
///
/// Uses [`expense_bot_core::utils::retry_transport_operation`].
///
/// # Errors
///
/// Returns the last error after all retries are exhausted.
pub async fn send_message_resilient(
    bot: &Bot,
    chat_id: ChatId,
    text: impl Into<String>,
) -> Result<Message> {
    let text = text.into();
    expense_bot_core::utils::retry_transport_operation(|| async {
        bot.send_message(chat_id, text.clone())
            .await
            .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))
    })
    .await
}
