use super::gate::{self, GateAction, Transition};
use super::resilient::send_reply_resilient;
use super::state::{ConversationDialogue, State};
use super::views::Prompt;
use crate::content::Submission;
use crate::publisher::{ChannelTransport, ContentPublisher, PublishError, PublishOutcome};
use anyhow::Result;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{error, info};

/// Supported commands
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    /// Start a session; a deep-link payload is accepted and ignored
    #[command(description = "start a posting session")]
    Start(String),
}

/// Handle the /start command
///
/// Any previous session is discarded and the operator is asked for the key.
///
/// # Errors
///
/// Returns an error if the state cannot be updated or the reply cannot be sent.
pub async fn start(bot: &Bot, dialogue: &ConversationDialogue) -> Result<()> {
    let outcome = gate::begin();
    gate::apply(dialogue, &outcome.transition).await?;
    info!(chat_id = %dialogue.chat_id(), "Session started");

    if let GateAction::Reply(prompt) = outcome.action {
        send_prompt(bot, dialogue.chat_id(), prompt).await?;
    }
    Ok(())
}

/// Routes a message or a released album through the conversation gate.
///
/// # Errors
///
/// Returns an error if the state cannot be updated or a reply cannot be sent.
/// Publish failures are reported to the operator, not returned.
pub async fn handle_submission<C: ChannelTransport>(
    bot: &Bot,
    dialogue: &ConversationDialogue,
    submission: &Submission,
    publisher: &ContentPublisher<C>,
    secret: &str,
) -> Result<()> {
    match gate::advance(dialogue, submission.command_text(), secret).await? {
        GateAction::Reply(prompt) => send_prompt(bot, dialogue.chat_id(), prompt).await,
        GateAction::Publish => publish_and_report(bot, dialogue, submission, publisher).await,
    }
}

async fn publish_and_report<C: ChannelTransport>(
    bot: &Bot,
    dialogue: &ConversationDialogue,
    submission: &Submission,
    publisher: &ContentPublisher<C>,
) -> Result<()> {
    let prompt = finish_publish(dialogue, submission, publisher).await?;
    send_prompt(bot, dialogue.chat_id(), prompt).await
}

/// Runs one publish cycle and reopens the session for the next post.
///
/// Publish errors are logged and turned into [`Prompt::PublishFailed`]. The
/// state is set to `AwaitingContent` after every cycle, even if the session
/// was cancelled while the cycle was running.
///
/// # Errors
///
/// Returns an error only if the dialogue storage fails.
pub async fn finish_publish<C: ChannelTransport>(
    dialogue: &ConversationDialogue,
    submission: &Submission,
    publisher: &ContentPublisher<C>,
) -> Result<Prompt> {
    let result = publisher.publish(submission).await;
    if let Err(e) = &result {
        error!(chat_id = %dialogue.chat_id(), "Publish failed: {e}");
    }

    gate::apply(dialogue, &Transition::Enter(State::AwaitingContent)).await?;
    Ok(outcome_prompt(&result))
}

/// Operator feedback for a finished publish cycle.
#[must_use]
pub fn outcome_prompt(result: &Result<PublishOutcome, PublishError>) -> Prompt {
    match result {
        Ok(PublishOutcome::Photos(_) | PublishOutcome::Text) => Prompt::Published,
        Ok(PublishOutcome::Nothing) => Prompt::NothingPublished,
        Err(_) => Prompt::PublishFailed,
    }
}

/// Sends a prompt together with its keyboard.
///
/// # Errors
///
/// Returns an error if the message cannot be delivered after retries.
pub async fn send_prompt(bot: &Bot, chat_id: ChatId, prompt: Prompt) -> Result<()> {
    send_reply_resilient(bot, chat_id, prompt.text(), prompt.menu().map(|m| m.markup())).await?;
    Ok(())
}
