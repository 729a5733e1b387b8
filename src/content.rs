//! Transport-agnostic view of what the operator submitted.
//!
//! The Telegram layer converts incoming messages into [`InboundItem`]s so the
//! album aggregator and the publisher can be driven without a live bot.

use crate::album::Groupable;

/// One inbound message, reduced to the fields the bot acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundItem {
    /// Conversation the message came from
    pub chat_id: i64,
    /// Per-chat message sequence identifier
    pub message_id: i32,
    /// Media group (album) identifier, if the message belongs to one
    pub media_group_id: Option<String>,
    /// Plain message text
    pub text: Option<String>,
    /// Caption attached to media
    pub caption: Option<String>,
    /// File ID of the largest photo size, if the message carries a photo
    pub photo_file_id: Option<String>,
}

impl InboundItem {
    /// Plain text message.
    #[must_use]
    pub fn text(chat_id: i64, message_id: i32, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            message_id,
            media_group_id: None,
            text: Some(text.into()),
            caption: None,
            photo_file_id: None,
        }
    }

    /// Photo message, optionally captioned.
    #[must_use]
    pub fn photo(
        chat_id: i64,
        message_id: i32,
        file_id: impl Into<String>,
        caption: Option<&str>,
    ) -> Self {
        Self {
            chat_id,
            message_id,
            media_group_id: None,
            text: None,
            caption: caption.map(ToString::to_string),
            photo_file_id: Some(file_id.into()),
        }
    }

    /// Marks the item as a member of the given album.
    #[must_use]
    pub fn in_group(mut self, media_group_id: impl Into<String>) -> Self {
        self.media_group_id = Some(media_group_id.into());
        self
    }
}

impl Groupable for InboundItem {
    fn group_id(&self) -> Option<&str> {
        self.media_group_id.as_deref()
    }

    fn sequence(&self) -> i64 {
        i64::from(self.message_id)
    }
}

/// A unit of content handed to the gate and the publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// A single, ungrouped message
    Single(InboundItem),
    /// Album members in ascending message order
    Album(Vec<InboundItem>),
}

impl Submission {
    /// Conversation that produced the submission.
    ///
    /// Returns `None` only for an empty album.
    #[must_use]
    pub fn chat_id(&self) -> Option<i64> {
        match self {
            Self::Single(item) => Some(item.chat_id),
            Self::Album(items) => items.first().map(|item| item.chat_id),
        }
    }

    /// Text that the conversation gate interprets as a key or a menu command.
    ///
    /// Albums never carry commands.
    #[must_use]
    pub fn command_text(&self) -> Option<&str> {
        match self {
            Self::Single(item) => item.text.as_deref(),
            Self::Album(_) => None,
        }
    }

    /// Caption attached to the first published photo.
    #[must_use]
    pub fn photo_caption(&self) -> Option<&str> {
        match self {
            Self::Single(item) => item.caption.as_deref().or(item.text.as_deref()),
            Self::Album(items) => items.first().and_then(|item| item.caption.as_deref()),
        }
    }

    /// Text published when no photo makes it into the outbound unit.
    ///
    /// For a single message this is its text when it carries no photo; for an
    /// album it is the caption of the first item.
    #[must_use]
    pub fn fallback_text(&self) -> Option<&str> {
        match self {
            Self::Single(item) if item.photo_file_id.is_some() => None,
            Self::Single(item) => item.text.as_deref(),
            Self::Album(items) => items.first().and_then(|item| item.caption.as_deref()),
        }
    }

    /// File IDs of every photo, in publication order.
    #[must_use]
    pub fn photo_file_ids(&self) -> Vec<&str> {
        match self {
            Self::Single(item) => item.photo_file_id.as_deref().into_iter().collect(),
            Self::Album(items) => items
                .iter()
                .filter_map(|item| item.photo_file_id.as_deref())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_photo_caption_falls_back_to_text() {
        let mut item = InboundItem::photo(1, 10, "f1", None);
        item.text = Some("plain".to_string());
        let submission = Submission::Single(item);
        assert_eq!(submission.photo_caption(), Some("plain"));
        assert_eq!(submission.fallback_text(), None);
        assert_eq!(submission.photo_file_ids(), vec!["f1"]);
    }

    #[test]
    fn test_text_only_message() {
        let submission = Submission::Single(InboundItem::text(1, 10, "hello"));
        assert_eq!(submission.command_text(), Some("hello"));
        assert_eq!(submission.fallback_text(), Some("hello"));
        assert!(submission.photo_file_ids().is_empty());
    }

    #[test]
    fn test_album_uses_first_caption_only() {
        let submission = Submission::Album(vec![
            InboundItem::photo(1, 10, "a", None).in_group("g"),
            InboundItem::photo(1, 11, "b", Some("second")).in_group("g"),
        ]);
        assert_eq!(submission.photo_caption(), None);
        assert_eq!(submission.command_text(), None);
        assert_eq!(submission.photo_file_ids(), vec!["a", "b"]);
        assert_eq!(submission.chat_id(), Some(1));
        assert_eq!(Submission::Album(Vec::new()).chat_id(), None);
    }
}
