//! Reply texts and keyboards shown to the operator.

use teloxide::types::{KeyboardButton, KeyboardMarkup};

/// Main menu button that starts a new post
pub const COMPOSE_LABEL: &str = "📝 Create post";
/// Cancel menu button that ends the session
pub const CANCEL_LABEL: &str = "❌ Cancel";

/// Keyboard with the single "create post" action
///
/// # Examples
///
/// ```
/// use channel_poster::bot::views::main_menu;
/// let keyboard = main_menu();
/// assert_eq!(keyboard.keyboard.len(), 1);
/// ```
#[must_use]
pub fn main_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(COMPOSE_LABEL)]]).resize_keyboard()
}

/// Keyboard with the single "cancel" action
#[must_use]
pub fn cancel_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(CANCEL_LABEL)]]).resize_keyboard()
}

/// Keyboard layout attached to a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Menu {
    /// [`main_menu`]
    Main,
    /// [`cancel_menu`]
    Cancel,
}

impl Menu {
    /// Builds the keyboard markup
    #[must_use]
    pub fn markup(self) -> KeyboardMarkup {
        match self {
            Self::Main => main_menu(),
            Self::Cancel => cancel_menu(),
        }
    }
}

/// Every reply the bot sends to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Ask for the secret key
    EnterKey,
    /// Key accepted
    Authorized,
    /// Key rejected
    WrongKey,
    /// Ask for the post content
    SendContent,
    /// Session ended by the operator
    Cancelled,
    /// Message arrived without an active session
    StartRequired,
    /// Post reached the channel
    Published,
    /// Nothing in the submission could be published
    NothingPublished,
    /// Publishing failed
    PublishFailed,
}

impl Prompt {
    /// Reply text
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::EnterKey => "Enter the authorization key:",
            Self::Authorized => "Authorization successful! You can now create posts.",
            Self::WrongKey => "Invalid authorization key. Please try again.",
            Self::SendContent => "Send the post (text, photo or album):",
            Self::Cancelled => "Cancelled",
            Self::StartRequired => "You are not authorized. Send /start to begin.",
            Self::Published => "✅ Post published!",
            Self::NothingPublished => "⚠️ Nothing to publish: no usable text or photos.",
            Self::PublishFailed => "🚨 Failed to publish the post. Please try again.",
        }
    }

    /// Keyboard to show with the reply, if it changes the current one
    #[must_use]
    pub const fn menu(self) -> Option<Menu> {
        match self {
            Self::EnterKey | Self::SendContent => Some(Menu::Cancel),
            Self::Authorized | Self::Cancelled | Self::Published => Some(Menu::Main),
            Self::WrongKey
            | Self::StartRequired
            | Self::NothingPublished
            | Self::PublishFailed => None,
        }
    }
}
