use channel_poster::album::{Admission, AlbumAggregator, AlbumConfig};
use channel_poster::content::{InboundItem, Submission};
use std::time::Duration;
use tokio::time::{sleep, timeout};

fn config() -> AlbumConfig {
    AlbumConfig {
        window: Duration::from_millis(100),
        max_wait: None,
    }
}

#[tokio::test(start_paused = true)]
async fn album_burst_becomes_one_ordered_submission() {
    let (aggregator, mut released) = AlbumAggregator::<InboundItem>::new(config());

    // Telegram may deliver album members out of order
    let burst = [
        InboundItem::photo(7, 102, "file-c", None).in_group("album-1"),
        InboundItem::photo(7, 100, "file-a", Some("Weekend <b>report</b>")).in_group("album-1"),
        InboundItem::photo(7, 101, "file-b", None).in_group("album-1"),
    ];
    for item in burst {
        assert_eq!(aggregator.admit(item).await, Admission::Buffered);
        sleep(Duration::from_millis(30)).await;
    }

    let album = timeout(Duration::from_secs(5), released.recv())
        .await
        .expect("album not released")
        .expect("release channel closed");
    assert_eq!(album.group_id, "album-1");

    let submission = Submission::Album(album.items);
    assert_eq!(submission.chat_id(), Some(7));
    assert_eq!(submission.photo_file_ids(), vec!["file-a", "file-b", "file-c"]);
    assert_eq!(submission.photo_caption(), Some("Weekend <b>report</b>"));
    assert_eq!(submission.command_text(), None);
}

#[tokio::test(start_paused = true)]
async fn plain_messages_are_not_held_back_by_a_pending_album() {
    let (aggregator, mut released) = AlbumAggregator::<InboundItem>::new(config());

    aggregator
        .admit(InboundItem::photo(7, 200, "file-x", None).in_group("album-2"))
        .await;

    let text = InboundItem::text(9, 5, "standalone");
    match aggregator.admit(text.clone()).await {
        Admission::PassThrough(item) => assert_eq!(item, text),
        Admission::Buffered => panic!("text message must not be buffered"),
    }
    assert_eq!(aggregator.pending_groups().await, 1);

    let album = timeout(Duration::from_secs(5), released.recv())
        .await
        .expect("album not released")
        .expect("release channel closed");
    assert_eq!(album.items.len(), 1);
    assert_eq!(aggregator.pending_groups().await, 0);
}
