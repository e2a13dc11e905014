pub mod reconcile;
pub mod store;
pub mod stream;

pub use reconcile::{apply_updates, sort_and_truncate, MAX_LIST_SIZE};
pub use store::{FeedStore, FeedSubscription};
pub use stream::{FeedStream, SubscribeMessage};
