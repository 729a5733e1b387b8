//! Telegram-backed channel transport
//!
//! Downloads operator photos through the Bot API file endpoint and posts the
//! outbound unit to the configured channel. Captions and text posts are sent
//! with HTML parse mode.

use crate::publisher::{ChannelTransport, ContentPublisher, OutboundPhoto, PublishError};
use async_trait::async_trait;
use std::path::Path;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile, InputMedia, InputMediaPhoto, ParseMode, Recipient};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Publisher wired to the live channel
pub type TelegramPublisher = ContentPublisher<TelegramChannel>;

/// Bot API client bound to one destination channel
#[derive(Clone)]
pub struct TelegramChannel {
    bot: Bot,
    channel: Recipient,
}

impl TelegramChannel {
    /// Creates a transport posting to `channel`.
    #[must_use]
    pub const fn new(bot: Bot, channel: Recipient) -> Self {
        Self { bot, channel }
    }
}

fn media_item(photo: OutboundPhoto) -> InputMedia {
    let mut media = InputMediaPhoto::new(InputFile::file(photo.path));
    if let Some(caption) = photo.caption {
        media = media.caption(caption).parse_mode(ParseMode::Html);
    }
    InputMedia::Photo(media)
}

#[async_trait]
impl ChannelTransport for TelegramChannel {
    async fn download(&self, file_id: &str, destination: &Path) -> Result<(), PublishError> {
        let file = self
            .bot
            .get_file(FileId(file_id.to_owned()))
            .await
            .map_err(|e| PublishError::Download(e.to_string()))?;

        let mut dst = tokio::fs::File::create(destination).await?;
        self.bot
            .download_file(&file.path, &mut dst)
            .await
            .map_err(|e| PublishError::Download(e.to_string()))?;
        dst.flush().await?;

        debug!(file_id = %file_id, path = %destination.display(), "Photo downloaded");
        Ok(())
    }

    async fn send_photos(&self, mut photos: Vec<OutboundPhoto>) -> Result<(), PublishError> {
        // Media groups need at least two items
        if photos.len() == 1 {
            if let Some(photo) = photos.pop() {
                let mut req = self
                    .bot
                    .send_photo(self.channel.clone(), InputFile::file(photo.path));
                if let Some(caption) = photo.caption {
                    req = req.caption(caption).parse_mode(ParseMode::Html);
                }
                req.await
                    .map_err(|e| PublishError::Dispatch(e.to_string()))?;
            }
            return Ok(());
        }

        let media: Vec<InputMedia> = photos.into_iter().map(media_item).collect();
        self.bot
            .send_media_group(self.channel.clone(), media)
            .await
            .map_err(|e| PublishError::Dispatch(e.to_string()))?;
        Ok(())
    }

    async fn send_text(&self, text: String) -> Result<(), PublishError> {
        self.bot
            .send_message(self.channel.clone(), text)
            .parse_mode(ParseMode::Html)
            .await
            .map_err(|e| PublishError::Dispatch(e.to_string()))?;
        Ok(())
    }
}
