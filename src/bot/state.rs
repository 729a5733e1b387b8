use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

/// Conversation phase of one chat
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    /// No session: never started, cancelled, or lost on restart
    #[default]
    Idle,
    /// `/start` was sent, waiting for the secret key
    AwaitingAuth,
    /// Authorized, the next regular message is published
    AwaitingContent,
}

/// Per-chat dialogue backed by the in-memory state store
pub type ConversationDialogue = Dialogue<State, InMemStorage<State>>;
