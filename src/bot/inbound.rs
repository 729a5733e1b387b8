use crate::content::InboundItem;
use teloxide::types::Message;

/// Reduces a Telegram message to the fields the publisher works with.
///
/// Only the largest size of a photo is kept.
#[must_use]
pub fn inbound_item(msg: &Message) -> InboundItem {
    InboundItem {
        chat_id: msg.chat.id.0,
        message_id: msg.id.0,
        media_group_id: msg.media_group_id().map(ToString::to_string),
        text: msg.text().map(ToString::to_string),
        caption: msg.caption().map(ToString::to_string),
        photo_file_id: msg
            .photo()
            .and_then(|sizes| sizes.last())
            .map(|photo| photo.file.id.0.clone()),
    }
}
