use crate::bot::photo::TelegramPhoto;
use crate::bot::resilient::send_message_resilient;
use anyhow::Result;
use expense_bot_core::tracker::{Event, ExpenseTracker};
use std::sync::Arc;
use teloxide::{prelude::*, utils::command::BotCommands};
use tracing::{info, warn};

/// Display name of the sender for logs.
#[must_use]
pub fn get_user_name(msg: &Message) -> String {
    if let Some(ref user) = msg.from {
        if let Some(ref username) = user.username {
            return username.clone();
        }
        if !user.first_name.is_empty() {
            return user.first_name.clone();
        }
    }
    "Unknown".to_string()
}

/// Safe extraction of user ID from a message.
/// Returns 0 if the user information is missing.
#[must_use]
pub fn get_user_id_safe(msg: &Message) -> i64 {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

/// Whether a text message is an expense line rather than a slash command.
///
/// Commands the bot does not know (`/stats`, `/report march`,
/// `/start@OtherBot`) are not expense lines either.
#[must_use]
pub fn is_expense_text(text: &str) -> bool {
    !text.starts_with('/')
}

/// Supported bot commands
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Show usage
    #[command(description = "Show how to log an expense.")]
    Start,
    /// Monthly totals from the dashboard
    #[command(description = "Monthly report.")]
    Report,
    /// Spreadsheet link
    #[command(description = "Link to the spreadsheet.")]
    Source,
    /// Command list
    #[command(description = "Show this list.")]
    Help,
}

async fn reply(bot: &Bot, msg: &Message, text: Option<String>) -> Result<()> {
    if let Some(text) = text {
        send_message_resilient(bot, msg.chat.id, text).await?;
    }
    Ok(())
}

/// Handle a bot command.
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    tracker: Arc<ExpenseTracker>,
) -> Result<()> {
    let user_id = get_user_id_safe(&msg);
    info!("User {user_id} ({}) sent a command.", get_user_name(&msg));

    let text = match cmd {
        Command::Start => tracker.handle(user_id, Event::Greeting).await,
        Command::Report => tracker.handle(user_id, Event::Report).await,
        Command::Source => tracker.handle(user_id, Event::Source).await,
        Command::Help => tracker
            .authorize(user_id)
            .ok()
            .map(|()| Command::descriptions().to_string()),
    };
    reply(&bot, &msg, text).await
}

/// Handle a photo message: store it as the pending receipt.
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn handle_photo(bot: Bot, msg: Message, tracker: Arc<ExpenseTracker>) -> Result<()> {
    let user_id = get_user_id_safe(&msg);
    let Some(photo) = TelegramPhoto::from_message(bot.clone(), &msg) else {
        warn!("Photo message from user {user_id} carries no sizes.");
        return Ok(());
    };

    info!("Receipt photo received from user {user_id}.");
    let text = tracker.handle(user_id, Event::Photo(&photo)).await;
    reply(&bot, &msg, text).await
}

/// Handle a plain text message as an expense line.
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn handle_text(bot: Bot, msg: Message, tracker: Arc<ExpenseTracker>) -> Result<()> {
    let user_id = get_user_id_safe(&msg);
    let Some(text) = msg.text() else {
        return Ok(());
    };

    info!("Expense line received from user {user_id}.");
    let text = tracker.handle(user_id, Event::Text(text)).await;
    reply(&bot, &msg, text).await
}

#[cfg(test)]
mod tests {
    use super::{is_expense_text, Command};
    use teloxide::utils::command::BotCommands;

    #[test]
    fn test_expense_lines_pass() {
        assert!(is_expense_text("Food 500 Dinner"));
        assert!(is_expense_text("food 500"));
        assert!(is_expense_text("Taxi 120 /airport"));
        assert!(is_expense_text(" /spaced"));
    }

    #[test]
    fn test_slash_commands_are_not_expense_lines() {
        assert!(!is_expense_text("/stats"));
        assert!(!is_expense_text("/report march"));
        assert!(!is_expense_text("/start@OtherBot"));
        assert!(!is_expense_text("/"));
    }

    #[test]
    fn test_known_commands_parse() {
        assert!(matches!(
            Command::parse("/report", "expense_bot"),
            Ok(Command::Report)
        ));
        assert!(matches!(
            Command::parse("/source@expense_bot", "expense_bot"),
            Ok(Command::Source)
        ));
        assert!(Command::parse("/stats", "expense_bot").is_err());
        assert!(Command::parse("/start@OtherBot", "expense_bot").is_err());
    }
}
