use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use log::{debug, info};
use tokio::sync::{watch, RwLock};

use crate::metrics;
use crate::models::{map_pool_to_token, Category, FeedSnapshot, FeedUpdate, InitialPools};
use super::reconcile::{apply_updates, sort_and_truncate};

/// In-memory holder of the three live lists. Every published snapshot is fanned
/// out to all subscribers; while paused the lists keep updating but nothing is
/// published until the pause is lifted.
#[derive(Debug)]
pub struct FeedStore {
    data: RwLock<Arc<FeedSnapshot>>,
    priority: Option<String>,
    paused: AtomicBool,
    connected: AtomicBool,
    publisher: watch::Sender<Arc<FeedSnapshot>>,
}

impl FeedStore {
    pub fn new(priority: Option<String>) -> Self {
        let initial = Arc::new(FeedSnapshot::default());
        let (publisher, _) = watch::channel(initial.clone());
        Self {
            data: RwLock::new(initial),
            priority: priority.filter(|p| !p.is_empty()),
            paused: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            publisher,
        }
    }

    pub fn priority(&self) -> Option<&str> {
        self.priority.as_deref()
    }

    /// Latest state, including changes held back by a pause.
    pub async fn snapshot(&self) -> Arc<FeedSnapshot> {
        self.data.read().await.clone()
    }

    /// New subscription; its first `recv` yields the last published snapshot.
    pub fn subscribe(&self) -> FeedSubscription {
        FeedSubscription {
            rx: self.publisher.subscribe(),
            primed: false,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.publisher.receiver_count()
    }

    fn publish(&self, snapshot: Arc<FeedSnapshot>) {
        self.publisher.send_replace(snapshot);
    }

    /// Replaces the lists with the aggregator's initial listing and publishes
    /// the result, paused or not.
    pub async fn load_initial(&self, pools: InitialPools) {
        let lists = FeedSnapshot {
            recent: pools.recent.iter().map(|p| map_pool_to_token(p, Category::New)).collect(),
            about_to_graduate: pools
                .about_to_graduate
                .iter()
                .map(|p| map_pool_to_token(p, Category::Soon))
                .collect(),
            graduated: pools
                .graduated
                .iter()
                .map(|p| map_pool_to_token(p, Category::Bonded))
                .collect(),
        };
        let sorted = Arc::new(sort_and_truncate(lists, self.priority()));
        info!(
            "Loaded initial feed: {} new, {} about to graduate, {} graduated",
            sorted.recent.len(),
            sorted.about_to_graduate.len(),
            sorted.graduated.len()
        );

        let mut data = self.data.write().await;
        *data = sorted.clone();
        self.publish(sorted);
    }

    /// Reconciles a batch of stream events into the lists.
    pub async fn apply(&self, updates: &[FeedUpdate]) -> Arc<FeedSnapshot> {
        let mut data = self.data.write().await;
        let next = Arc::new(apply_updates(&data, updates, self.priority()));
        *data = next.clone();

        metrics::FEED_EVENTS.inc_by(updates.len() as u64);
        if self.is_paused() {
            debug!("Feed paused, holding back {} events", updates.len());
        } else {
            self.publish(next.clone());
        }
        next
    }

    /// Publishes happen under the data lock so a resume cannot overtake a
    /// newer batch.
    pub async fn set_paused(&self, paused: bool) {
        let data = self.data.write().await;
        let was_paused = self.paused.swap(paused, Ordering::SeqCst);
        if was_paused && !paused {
            self.publish(data.clone());
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
        metrics::STREAM_CONNECTED.set(i64::from(connected));
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Receiving side of the store's fan-out.
#[derive(Debug)]
pub struct FeedSubscription {
    rx: watch::Receiver<Arc<FeedSnapshot>>,
    primed: bool,
}

impl FeedSubscription {
    /// Waits for the next published snapshot. Returns `None` once the store
    /// is dropped.
    pub async fn recv(&mut self) -> Option<Arc<FeedSnapshot>> {
        if !self.primed {
            self.primed = true;
            return Some(self.rx.borrow_and_update().clone());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
