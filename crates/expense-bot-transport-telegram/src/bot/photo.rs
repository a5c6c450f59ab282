//! Photo download from Telegram file storage.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use expense_bot_core::tracker::PhotoSource;
use expense_bot_core::utils::retry_transport_operation;
use std::path::Path;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{FileId, PhotoSize};

/// Largest size of a photo message, fetched through the Bot API.
pub struct TelegramPhoto {
    bot: Bot,
    file_id: FileId,
}

impl TelegramPhoto {
    /// Pick the largest size attached to `msg`, if it carries a photo.
    #[must_use]
    pub fn from_message(bot: Bot, msg: &Message) -> Option<Self> {
        largest(msg.photo()?).map(|photo| Self {
            bot,
            file_id: photo.file.id.clone(),
        })
    }
}

/// Telegram lists sizes smallest first; pick by area to not rely on it.
fn largest(sizes: &[PhotoSize]) -> Option<&PhotoSize> {
    sizes
        .iter()
        .max_by_key(|size| u64::from(size.width) * u64::from(size.height))
}

#[async_trait]
impl PhotoSource for TelegramPhoto {
    async fn download_to(&self, dest: &Path) -> Result<()> {
        retry_transport_operation(|| async {
            let file = self.bot.get_file(self.file_id.clone()).await?;
            // Truncates leftovers of a failed attempt
            let mut out = tokio::fs::File::create(dest).await?;
            self.bot
                .download_file(&file.path, &mut out)
                .await
                .map_err(|e| anyhow!("Telegram download error: {e}"))?;
            Ok(())
        })
        .await
    }
}
