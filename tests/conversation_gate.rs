use channel_poster::bot::gate::{self, GateAction};
use channel_poster::bot::views::{Prompt, CANCEL_LABEL, COMPOSE_LABEL};
use channel_poster::bot::{ConversationDialogue, State};
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::types::ChatId;

const SECRET: &str = "correct horse";

#[tokio::test]
async fn full_session_walkthrough() -> anyhow::Result<()> {
    let storage = InMemStorage::<State>::new();
    let dialogue = ConversationDialogue::new(storage.clone(), ChatId(100));

    // Nothing is accepted before /start
    assert_eq!(
        gate::advance(&dialogue, Some(SECRET), SECRET).await?,
        GateAction::Reply(Prompt::StartRequired)
    );

    gate::apply(&dialogue, &gate::begin().transition).await?;
    assert_eq!(
        gate::advance(&dialogue, Some("Correct Horse"), SECRET).await?,
        GateAction::Reply(Prompt::WrongKey)
    );
    assert_eq!(
        gate::advance(&dialogue, Some(SECRET), SECRET).await?,
        GateAction::Reply(Prompt::Authorized)
    );

    assert_eq!(
        gate::advance(&dialogue, Some(COMPOSE_LABEL), SECRET).await?,
        GateAction::Reply(Prompt::SendContent)
    );
    assert_eq!(
        gate::advance(&dialogue, Some("Hello, channel"), SECRET).await?,
        GateAction::Publish
    );
    // Albums carry no command text and are published as well
    assert_eq!(gate::advance(&dialogue, None, SECRET).await?, GateAction::Publish);
    assert_eq!(dialogue.get().await?, Some(State::AwaitingContent));

    assert_eq!(
        gate::advance(&dialogue, Some(CANCEL_LABEL), SECRET).await?,
        GateAction::Reply(Prompt::Cancelled)
    );
    assert_eq!(
        gate::advance(&dialogue, Some("Hello again"), SECRET).await?,
        GateAction::Reply(Prompt::StartRequired)
    );
    Ok(())
}

#[tokio::test]
async fn sessions_are_isolated_per_chat() -> anyhow::Result<()> {
    let storage = InMemStorage::<State>::new();
    let operator = ConversationDialogue::new(storage.clone(), ChatId(1));
    let stranger = ConversationDialogue::new(storage.clone(), ChatId(2));

    gate::apply(&operator, &gate::begin().transition).await?;
    gate::advance(&operator, Some(SECRET), SECRET).await?;

    assert_eq!(
        gate::advance(&stranger, Some("post this"), SECRET).await?,
        GateAction::Reply(Prompt::StartRequired)
    );
    assert_eq!(
        gate::advance(&operator, Some("post this"), SECRET).await?,
        GateAction::Publish
    );
    Ok(())
}

#[tokio::test]
async fn restart_discards_an_authorized_session() -> anyhow::Result<()> {
    let dialogue = ConversationDialogue::new(InMemStorage::<State>::new(), ChatId(3));
    gate::apply(&dialogue, &gate::begin().transition).await?;
    gate::advance(&dialogue, Some(SECRET), SECRET).await?;

    gate::apply(&dialogue, &gate::begin().transition).await?;
    assert_eq!(dialogue.get().await?, Some(State::AwaitingAuth));
    assert_eq!(
        gate::advance(&dialogue, Some("not the key"), SECRET).await?,
        GateAction::Reply(Prompt::WrongKey)
    );
    Ok(())
}
