//! Bot wiring and update dispatch
//!
//! Ungrouped messages are handled inline by the dispatcher. Album items are
//! buffered by the aggregator and come back through the release channel, where
//! a forwarding task runs each album through the same gate and publisher.

use crate::album::{Admission, Album, AlbumAggregator};
use crate::bot::handlers::{self, Command};
use crate::bot::inbound::inbound_item;
use crate::bot::{ConversationDialogue, State, TelegramChannel, TelegramPublisher};
use crate::config::Settings;
use crate::content::{InboundItem, Submission};
use crate::publisher::{sweep_stale_artifacts, ContentPublisher};
use crate::watermark::Watermarker;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

type MessageAggregator = AlbumAggregator<InboundItem>;

/// How long shutdown waits for buffered and in-flight albums
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Starts the bot and blocks until it is stopped with Ctrl-C.
///
/// # Errors
///
/// Returns an error if the working directory for transient files cannot be
/// created.
pub async fn run_bot(settings: Arc<Settings>) -> Result<()> {
    tokio::fs::create_dir_all(&settings.temp_dir)
        .await
        .with_context(|| format!("Failed to create {}", settings.temp_dir.display()))?;

    match sweep_stale_artifacts(&settings.temp_dir).await {
        Ok(0) => {}
        Ok(removed) => info!(removed, "Removed artifacts left by a previous run"),
        Err(e) => warn!("Failed to sweep {}: {e}", settings.temp_dir.display()),
    }

    if !tokio::fs::try_exists(&settings.watermark_path)
        .await
        .unwrap_or(false)
    {
        warn!(
            path = %settings.watermark_path.display(),
            "Watermark asset not found, photos will be dropped until it exists"
        );
    }

    let bot = Bot::new(settings.bot_token.clone());
    let storage = InMemStorage::<State>::new();

    let channel = Arc::new(TelegramChannel::new(
        bot.clone(),
        settings.channel_recipient(),
    ));
    let publisher: Arc<TelegramPublisher> = Arc::new(ContentPublisher::new(
        channel,
        Watermarker::new(settings.watermark_path.clone()),
        settings.temp_dir.clone(),
    ));

    let (aggregator, released) = MessageAggregator::new(settings.album_config());
    let aggregator = Arc::new(aggregator);

    let mut forwarder = tokio::spawn(forward_albums(
        released,
        bot.clone(),
        storage.clone(),
        publisher.clone(),
        settings.clone(),
    ));

    info!(
        album_latency_ms = settings.album_latency_ms,
        temp_dir = %settings.temp_dir.display(),
        "Bot is running..."
    );

    Dispatcher::builder(bot, setup_handler())
        .dependencies(dptree::deps![settings, storage, publisher, aggregator])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    // The dispatcher dropped its aggregator handle, so the release channel
    // closes once pending albums are flushed and their publishes finish.
    info!("Draining in-flight albums...");
    if tokio::time::timeout(SHUTDOWN_GRACE, &mut forwarder)
        .await
        .is_err()
    {
        warn!("Album publishes did not finish in time, aborting");
        forwarder.abort();
    }
    info!("Bot stopped");
    Ok(())
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        .enter_dialogue::<Message, InMemStorage<State>, State>()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(dptree::endpoint(handle_message))
}

async fn handle_command(
    bot: Bot,
    cmd: Command,
    dialogue: ConversationDialogue,
) -> Result<(), teloxide::RequestError> {
    let res = match cmd {
        Command::Start(_) => handlers::start(&bot, &dialogue).await,
    };
    if let Err(e) = res {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_message(
    bot: Bot,
    msg: Message,
    dialogue: ConversationDialogue,
    aggregator: Arc<MessageAggregator>,
    publisher: Arc<TelegramPublisher>,
    settings: Arc<Settings>,
) -> Result<(), teloxide::RequestError> {
    let item = match aggregator.admit(inbound_item(&msg)).await {
        Admission::PassThrough(item) => item,
        Admission::Buffered => return respond(()),
    };

    let submission = Submission::Single(item);
    if let Err(e) = handlers::handle_submission(
        &bot,
        &dialogue,
        &submission,
        publisher.as_ref(),
        &settings.secret_key,
    )
    .await
    {
        error!("Message handler error: {}", e);
    }
    respond(())
}

async fn forward_albums(
    mut released: UnboundedReceiver<Album<InboundItem>>,
    bot: Bot,
    storage: Arc<InMemStorage<State>>,
    publisher: Arc<TelegramPublisher>,
    settings: Arc<Settings>,
) {
    let mut in_flight = JoinSet::new();

    while let Some(album) = released.recv().await {
        // Reap finished publishes so the set does not grow unbounded
        while in_flight.try_join_next().is_some() {}

        let group_id = album.group_id;
        let submission = Submission::Album(album.items);
        let Some(chat_id) = submission.chat_id() else {
            continue;
        };

        let dialogue = ConversationDialogue::new(storage.clone(), ChatId(chat_id));
        let bot = bot.clone();
        let publisher = publisher.clone();
        let settings = settings.clone();

        in_flight.spawn(async move {
            if let Err(e) = handlers::handle_submission(
                &bot,
                &dialogue,
                &submission,
                publisher.as_ref(),
                &settings.secret_key,
            )
            .await
            {
                error!(group_id = %group_id, "Album handler error: {}", e);
            }
        });
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            error!("Album task failed: {e}");
        }
    }
}
