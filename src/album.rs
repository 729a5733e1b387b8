//! Media group aggregation
//!
//! Telegram delivers an album as a burst of separate messages that share a
//! media group ID, with no hint of how many will follow. The aggregator
//! buffers each group and releases it as one [`Album`] once the group has
//! been quiet for a full debounce window.
//!
//! Every group owns a timer task. Each new arrival resets that timer, so the
//! release happens one window after the *last* item. Without a `max_wait`
//! ceiling a stream that keeps adding items faster than the window will never
//! be released; with a ceiling the group is cut at `max_wait` after its first
//! item and later items start a fresh buffer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Items the aggregator can correlate and order.
pub trait Groupable: Send + 'static {
    /// Group (album) the item belongs to; `None` for standalone items.
    fn group_id(&self) -> Option<&str>;
    /// Intrinsic sequence number used to order a released group.
    fn sequence(&self) -> i64;
}

/// Debounce parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlbumConfig {
    /// Quiet period after the latest arrival before a group is released
    pub window: Duration,
    /// Optional ceiling measured from the first item of a group
    pub max_wait: Option<Duration>,
}

impl Default for AlbumConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(crate::config::DEFAULT_ALBUM_LATENCY_MS),
            max_wait: None,
        }
    }
}

/// A released group, ordered by ascending sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album<T> {
    /// Shared group identifier
    pub group_id: String,
    /// Group members in sequence order
    pub items: Vec<T>,
}

/// Result of handing an item to the aggregator.
#[derive(Debug, PartialEq, Eq)]
pub enum Admission<T> {
    /// Item has no group and must be handled right away by the caller
    PassThrough(T),
    /// Item was buffered; its group will arrive on the release channel
    Buffered,
}

struct PendingAlbum<T> {
    epoch: u64,
    items: Vec<T>,
    reset: Arc<Notify>,
}

struct Buffers<T> {
    pending: HashMap<String, PendingAlbum<T>>,
    next_epoch: u64,
}

struct Shared<T> {
    buffers: Mutex<Buffers<T>>,
    config: AlbumConfig,
    released: mpsc::UnboundedSender<Album<T>>,
}

/// Debounce buffer keyed by media group ID
pub struct AlbumAggregator<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for AlbumAggregator<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Groupable> AlbumAggregator<T> {
    /// Creates an aggregator and the channel on which released albums appear.
    #[must_use]
    pub fn new(config: AlbumConfig) -> (Self, mpsc::UnboundedReceiver<Album<T>>) {
        let (released, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            buffers: Mutex::new(Buffers {
                pending: HashMap::new(),
                next_epoch: 0,
            }),
            config,
            released,
        });
        (Self { shared }, rx)
    }

    /// Accepts an inbound item.
    ///
    /// Ungrouped items are returned immediately. Grouped items are appended to
    /// their group's buffer and the group's timer is reset; this call never
    /// waits for the debounce window.
    pub async fn admit(&self, item: T) -> Admission<T> {
        let Some(group_id) = item.group_id().map(ToString::to_string) else {
            return Admission::PassThrough(item);
        };

        let mut buffers = self.shared.buffers.lock().await;
        if let Some(album) = buffers.pending.get_mut(&group_id) {
            album.items.push(item);
            album.reset.notify_one();
            debug!(
                group_id = %group_id,
                buffered = album.items.len(),
                "Album item buffered, timer reset"
            );
            return Admission::Buffered;
        }

        let epoch = buffers.next_epoch;
        buffers.next_epoch += 1;
        let reset = Arc::new(Notify::new());
        buffers.pending.insert(
            group_id.clone(),
            PendingAlbum {
                epoch,
                items: vec![item],
                reset: Arc::clone(&reset),
            },
        );
        debug!(group_id = %group_id, "New album buffer opened");

        tokio::spawn(run_timer(Arc::clone(&self.shared), group_id, epoch, reset));
        Admission::Buffered
    }

    /// Releases a group immediately.
    ///
    /// Returns `false` without side effects if the group is not buffered,
    /// e.g. because it was already released.
    pub async fn flush(&self, group_id: &str) -> bool {
        self.shared.release(group_id, None).await
    }

    /// Number of groups currently buffered.
    pub async fn pending_groups(&self) -> usize {
        self.shared.buffers.lock().await.pending.len()
    }
}

impl<T: Groupable> Shared<T> {
    /// Removes and emits the buffer for `group_id`.
    ///
    /// With `epoch` set, only the buffer opened at that epoch is released, so
    /// a timer outliving its buffer cannot cut a newer buffer of the same group.
    async fn release(&self, group_id: &str, epoch: Option<u64>) -> bool {
        let album = {
            let mut buffers = self.buffers.lock().await;
            let current = buffers
                .pending
                .get(group_id)
                .is_some_and(|album| epoch.is_none_or(|e| e == album.epoch));
            if current {
                buffers.pending.remove(group_id)
            } else {
                None
            }
        };

        let Some(mut album) = album else {
            debug!(group_id = %group_id, "Album already released, nothing to do");
            return false;
        };

        album.items.sort_by_key(|item| item.sequence());
        info!(
            group_id = %group_id,
            items = album.items.len(),
            "Album released"
        );

        let released = Album {
            group_id: group_id.to_string(),
            items: album.items,
        };
        if self.released.send(released).is_err() {
            warn!(group_id = %group_id, "Album receiver is gone, dropping album");
        }
        true
    }
}

async fn run_timer<T: Groupable>(
    shared: Arc<Shared<T>>,
    group_id: String,
    epoch: u64,
    reset: Arc<Notify>,
) {
    let max_wait = shared.config.max_wait;
    let ceiling = async move {
        match max_wait {
            Some(limit) => sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(ceiling);

    loop {
        tokio::select! {
            () = reset.notified() => {}
            () = sleep(shared.config.window) => break,
            () = &mut ceiling => {
                debug!(group_id = %group_id, "Album hit max wait, releasing early");
                break;
            }
        }
    }

    shared.release(&group_id, Some(epoch)).await;
}
