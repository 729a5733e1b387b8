/// Telegram-backed channel transport
pub mod channel;
/// Conversation gate: authorization and menu routing
pub mod gate;
/// Command and submission handlers
pub mod handlers;
/// Conversion of Telegram messages into inbound items
pub mod inbound;
/// Operator replies with retry
pub mod resilient;
/// User state and dialogue management
pub mod state;
/// Reply texts and keyboards
pub mod views;

pub use channel::{TelegramChannel, TelegramPublisher};
pub use state::{ConversationDialogue, State};
