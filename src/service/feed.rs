// service/feed.rs
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use uuid::Uuid;

/// Row-level change event on the message ledger. The feed does not filter by
/// chat or user; subscribers recompute whatever derived state they keep.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageEvent {
    Inserted { chat_id: Uuid, message_id: Uuid },
    Updated { chat_id: Uuid },
}

type EventCallback = Box<dyn Fn(&MessageEvent) + Send + Sync>;

/// In-process change feed over the message ledger. The ledger publishes after
/// every successful insert or read-flag update; subscribers hold a
/// `Subscription` handle and stop receiving the moment it is dropped or
/// explicitly unsubscribed.
#[derive(Default)]
pub struct MessageFeed {
    subscribers: DashMap<Uuid, EventCallback>,
}

impl MessageFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&MessageEvent) + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        self.subscribers.insert(id, Box::new(callback));

        Subscription {
            id,
            feed: Arc::downgrade(self),
        }
    }

    pub fn publish(&self, event: MessageEvent) {
        for entry in self.subscribers.iter() {
            (entry.value())(&event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Live registration on the feed. Detaching is synchronous: once
/// `unsubscribe` returns (or the handle is dropped), the callback will not be
/// invoked again.
pub struct Subscription {
    id: Uuid,
    feed: Weak<MessageFeed>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the detaching.
    }

    fn detach(&self) {
        if let Some(feed) = self.feed.upgrade() {
            feed.subscribers.remove(&self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}
