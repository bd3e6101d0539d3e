mod messages;
mod subscribers;

pub use messages::{MessageCounts, MessageRepo, SqliteMessageRepo};
pub use subscribers::{SqliteSubscriberRepo, SubscriberRepo};
