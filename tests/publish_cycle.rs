use async_trait::async_trait;
use channel_poster::content::{InboundItem, Submission};
use channel_poster::publisher::{
    ChannelTransport, ContentPublisher, OutboundPhoto, PublishError, PublishOutcome,
};
use channel_poster::watermark::Watermarker;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
enum Sent {
    Photos(Vec<(Option<String>, (u32, u32))>),
    Text(String),
}

/// In-memory channel: serves fixture photos and records what was posted.
#[derive(Default)]
struct RecordingChannel {
    files: HashMap<String, Vec<u8>>,
    sent: Mutex<Vec<Sent>>,
}

impl RecordingChannel {
    fn with_file(mut self, file_id: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(file_id.to_string(), bytes);
        self
    }

    fn sent(&self) -> Vec<Sent> {
        self.sent.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl ChannelTransport for RecordingChannel {
    async fn download(&self, file_id: &str, destination: &Path) -> Result<(), PublishError> {
        let bytes = self
            .files
            .get(file_id)
            .ok_or_else(|| PublishError::Download(format!("file {file_id} not found")))?;
        tokio::fs::write(destination, bytes).await?;
        Ok(())
    }

    async fn send_photos(&self, photos: Vec<OutboundPhoto>) -> Result<(), PublishError> {
        let mut posted = Vec::new();
        for photo in photos {
            // Files are removed after the cycle, so inspect them now
            let img = image::open(&photo.path)
                .map_err(|e| PublishError::Dispatch(format!("unreadable upload: {e}")))?;
            posted.push((photo.caption, img.dimensions()));
        }
        self.sent
            .lock()
            .expect("lock poisoned")
            .push(Sent::Photos(posted));
        Ok(())
    }

    async fn send_text(&self, text: String) -> Result<(), PublishError> {
        self.sent
            .lock()
            .expect("lock poisoned")
            .push(Sent::Text(text));
        Ok(())
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        Rgba([40, 90, 160, 255]),
    ));
    let mut bytes = std::io::Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageOutputFormat::Png)
        .expect("encode fixture");
    bytes.into_inner()
}

struct Fixture {
    _dir: tempfile::TempDir,
    work_dir: PathBuf,
    asset: PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let work_dir = dir.path().join("temp");
    std::fs::create_dir_all(&work_dir).expect("work dir");
    let asset = dir.path().join("watermark.png");
    std::fs::write(&asset, png(60, 20)).expect("asset");
    Fixture {
        _dir: dir,
        work_dir,
        asset,
    }
}

fn leftovers(dir: &Path) -> usize {
    std::fs::read_dir(dir).map_or(0, Iterator::count)
}

#[tokio::test]
async fn album_is_watermarked_and_posted_as_one_group() -> anyhow::Result<()> {
    let fx = fixture();
    let channel = Arc::new(
        RecordingChannel::default()
            .with_file("p1", png(640, 480))
            .with_file("p2", png(800, 600))
            .with_file("p3", png(300, 300)),
    );
    let publisher = ContentPublisher::new(channel.clone(), Watermarker::new(&fx.asset), &fx.work_dir);

    let submission = Submission::Album(vec![
        InboundItem::photo(1, 10, "p1", Some("Caption")).in_group("g"),
        InboundItem::photo(1, 11, "p2", None).in_group("g"),
        InboundItem::photo(1, 12, "p3", None).in_group("g"),
    ]);

    assert_eq!(publisher.publish(&submission).await?, PublishOutcome::Photos(3));
    assert_eq!(
        channel.sent(),
        vec![Sent::Photos(vec![
            (Some("Caption".to_string()), (640, 480)),
            (None, (800, 600)),
            (None, (300, 300)),
        ])]
    );
    assert_eq!(leftovers(&fx.work_dir), 0);
    Ok(())
}

#[tokio::test]
async fn unreadable_photo_is_skipped() -> anyhow::Result<()> {
    let fx = fixture();
    let channel = Arc::new(
        RecordingChannel::default()
            .with_file("broken", b"not an image".to_vec())
            .with_file("good", png(400, 300)),
    );
    let publisher = ContentPublisher::new(channel.clone(), Watermarker::new(&fx.asset), &fx.work_dir);

    let submission = Submission::Album(vec![
        InboundItem::photo(1, 10, "broken", Some("Caption")).in_group("g"),
        InboundItem::photo(1, 11, "good", None).in_group("g"),
    ]);

    assert_eq!(publisher.publish(&submission).await?, PublishOutcome::Photos(1));
    assert_eq!(
        channel.sent(),
        vec![Sent::Photos(vec![(Some("Caption".to_string()), (400, 300))])]
    );
    assert_eq!(leftovers(&fx.work_dir), 0);
    Ok(())
}

#[tokio::test]
async fn text_message_is_posted_verbatim() -> anyhow::Result<()> {
    let fx = fixture();
    let channel = Arc::new(RecordingChannel::default());
    let publisher = ContentPublisher::new(channel.clone(), Watermarker::new(&fx.asset), &fx.work_dir);

    let submission = Submission::Single(InboundItem::text(1, 10, "<i>Breaking</i> news"));
    assert_eq!(publisher.publish(&submission).await?, PublishOutcome::Text);
    assert_eq!(
        channel.sent(),
        vec![Sent::Text("<i>Breaking</i> news".to_string())]
    );
    Ok(())
}

#[tokio::test]
async fn missing_download_aborts_and_cleans_up() {
    let fx = fixture();
    let channel = Arc::new(RecordingChannel::default().with_file("p1", png(640, 480)));
    let publisher = ContentPublisher::new(channel.clone(), Watermarker::new(&fx.asset), &fx.work_dir);

    let submission = Submission::Album(vec![
        InboundItem::photo(1, 10, "p1", None).in_group("g"),
        InboundItem::photo(1, 11, "gone", None).in_group("g"),
    ]);

    let result = publisher.publish(&submission).await;
    assert!(matches!(result, Err(PublishError::Download(_))));
    assert!(channel.sent().is_empty());
    assert_eq!(leftovers(&fx.work_dir), 0);
}

/// Writes the original and then never completes the transfer.
struct StalledDownload;

#[async_trait]
impl ChannelTransport for StalledDownload {
    async fn download(&self, _file_id: &str, destination: &Path) -> Result<(), PublishError> {
        tokio::fs::write(destination, b"partial").await?;
        std::future::pending::<()>().await;
        Ok(())
    }

    async fn send_photos(&self, _photos: Vec<OutboundPhoto>) -> Result<(), PublishError> {
        Ok(())
    }

    async fn send_text(&self, _text: String) -> Result<(), PublishError> {
        Ok(())
    }
}

#[tokio::test]
async fn cancelled_cycle_leaves_no_files_behind() {
    let fx = fixture();
    let publisher = ContentPublisher::new(
        Arc::new(StalledDownload),
        Watermarker::new(&fx.asset),
        &fx.work_dir,
    );
    let submission = Submission::Single(InboundItem::photo(1, 10, "a", None));

    let cycle = tokio::time::timeout(
        std::time::Duration::from_millis(200),
        publisher.publish(&submission),
    )
    .await;

    assert!(cycle.is_err(), "download never finishes");
    assert_eq!(leftovers(&fx.work_dir), 0);
}
