//! Conversation gate
//!
//! Decides, from the chat's current [`State`] and the text it sent, whether
//! the message is a key attempt, a menu command or content to publish.
//! [`decide`] is pure; [`advance`] applies its transition to the dialogue.

use super::state::{ConversationDialogue, State};
use super::views::{Prompt, CANCEL_LABEL, COMPOSE_LABEL};
use anyhow::{anyhow, Result};
use tracing::{info, warn};

/// State change requested by the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Leave the state as is
    Keep,
    /// Switch to the given state
    Enter(State),
    /// Drop the conversation state entirely
    Clear,
}

/// What the caller should do after the transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    /// Answer the operator with a prompt
    Reply(Prompt),
    /// Hand the submission to the publisher
    Publish,
}

/// Transition plus follow-up action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutcome {
    /// State change to apply first
    pub transition: Transition,
    /// Follow-up action
    pub action: GateAction,
}

/// Outcome of `/start`: always (re)enter key entry.
#[must_use]
pub const fn begin() -> GateOutcome {
    GateOutcome {
        transition: Transition::Enter(State::AwaitingAuth),
        action: GateAction::Reply(Prompt::EnterKey),
    }
}

/// Routes a message by the conversation's current state.
///
/// `text` is the plain message text, `None` for media and albums. The key
/// comparison is exact and case-sensitive.
#[must_use]
pub fn decide(state: &State, text: Option<&str>, secret: &str) -> GateOutcome {
    match state {
        State::Idle => GateOutcome {
            transition: Transition::Keep,
            action: GateAction::Reply(Prompt::StartRequired),
        },
        State::AwaitingAuth if text == Some(secret) => GateOutcome {
            transition: Transition::Enter(State::AwaitingContent),
            action: GateAction::Reply(Prompt::Authorized),
        },
        State::AwaitingAuth => GateOutcome {
            transition: Transition::Keep,
            action: GateAction::Reply(Prompt::WrongKey),
        },
        State::AwaitingContent => match text {
            Some(CANCEL_LABEL) => GateOutcome {
                transition: Transition::Clear,
                action: GateAction::Reply(Prompt::Cancelled),
            },
            Some(COMPOSE_LABEL) => GateOutcome {
                transition: Transition::Enter(State::AwaitingContent),
                action: GateAction::Reply(Prompt::SendContent),
            },
            _ => GateOutcome {
                transition: Transition::Keep,
                action: GateAction::Publish,
            },
        },
    }
}

/// Writes a transition to the dialogue storage.
///
/// # Errors
///
/// Returns an error if the dialogue storage fails.
pub async fn apply(dialogue: &ConversationDialogue, transition: &Transition) -> Result<()> {
    match transition {
        Transition::Keep => Ok(()),
        Transition::Enter(state) => dialogue
            .update(state.clone())
            .await
            .map_err(|e| anyhow!(e.to_string())),
        Transition::Clear => dialogue.exit().await.map_err(|e| anyhow!(e.to_string())),
    }
}

/// Runs the gate for one message and persists the resulting state.
///
/// # Errors
///
/// Returns an error if the dialogue storage fails.
pub async fn advance(
    dialogue: &ConversationDialogue,
    text: Option<&str>,
    secret: &str,
) -> Result<GateAction> {
    let state = dialogue
        .get_or_default()
        .await
        .map_err(|e| anyhow!(e.to_string()))?;
    let outcome = decide(&state, text, secret);
    let chat_id = dialogue.chat_id();

    match (&state, &outcome.action) {
        (State::AwaitingAuth, GateAction::Reply(Prompt::Authorized)) => {
            info!(chat_id = %chat_id, "Operator authorized");
        }
        (State::AwaitingAuth, GateAction::Reply(Prompt::WrongKey)) => {
            warn!(chat_id = %chat_id, "Rejected authorization attempt");
        }
        (_, GateAction::Reply(Prompt::Cancelled)) => {
            info!(chat_id = %chat_id, "Session cancelled by operator");
        }
        (State::Idle, _) => {
            info!(chat_id = %chat_id, "Ignoring message from chat without a session");
        }
        _ => {}
    }

    apply(dialogue, &outcome.transition).await?;
    Ok(outcome.action)
}
