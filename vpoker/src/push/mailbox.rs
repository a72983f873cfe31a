//! Per-player outbound event channel.
//!
//! A [`Mailbox`] is shared between the player's record on the table and
//! every fan-out list built from it. At most one [`Subscription`] is
//! attached at a time: subscribing again closes the previous channel,
//! which tells the superseded connection loop to stop.
//!
//! Attaching, detaching and dispatching all go through the same short
//! lock, so a dispatch can never race with a detach. Dispatch never
//! waits on the receiver: each subscription buffers a bounded number of
//! events and drops the oldest when a viewer falls behind.

use std::{
    fmt,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::broadcast;

use super::messages::Push;
use crate::table::config::MAX_PUSH_BUFFER;

/// Identifies one attachment of a mailbox.
pub type SubscriptionId = u64;

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

struct Attached {
    id: SubscriptionId,
    sender: broadcast::Sender<Arc<Push>>,
}

/// Shared handle to a player's outbound channel.
#[derive(Clone, Default)]
pub struct Mailbox {
    slot: Arc<Mutex<Option<Attached>>>,
}

/// Receiving end handed to a viewer connection.
pub struct Subscription {
    pub id: SubscriptionId,
    pub receiver: broadcast::Receiver<Arc<Push>>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Mailbox {
    fn slot(&self) -> MutexGuard<'_, Option<Attached>> {
        // Nothing under this lock can leave the slot half-written.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach a fresh channel holding up to `capacity` pending events,
    /// clamped to `1..=MAX_PUSH_BUFFER`. Any previously attached channel
    /// is closed.
    pub fn subscribe(&self, capacity: usize) -> Subscription {
        let (sender, receiver) = broadcast::channel(capacity.clamp(1, MAX_PUSH_BUFFER));
        let id = NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed);

        let previous = self.slot().replace(Attached { id, sender });
        if let Some(previous) = previous {
            log::debug!("subscription {} superseded by {}", previous.id, id);
        }

        Subscription { id, receiver }
    }

    /// Detach `id` if it is still the attached subscription. A stale id
    /// (already superseded) leaves the newer subscription alone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut slot = self.slot();
        match slot.as_ref() {
            Some(attached) if attached.id == id => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// Detach whatever is attached.
    pub fn close(&self) {
        self.slot().take();
    }

    pub fn is_attached(&self) -> bool {
        self.slot().is_some()
    }

    /// Enqueue `push` for the attached viewer. Returns `false` when nobody
    /// is listening, in which case the event is dropped.
    pub fn dispatch(&self, push: Arc<Push>) -> bool {
        let slot = self.slot();
        let Some(attached) = slot.as_ref() else {
            return false;
        };
        match attached.sender.send(push) {
            Ok(_) => true,
            Err(_) => {
                log::warn!(
                    "subscription {} has no live receiver, event dropped",
                    attached.id
                );
                false
            }
        }
    }
}

impl fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    #[test]
    fn test_dispatch_without_subscriber_is_dropped() {
        let mailbox = Mailbox::default();
        assert!(!mailbox.dispatch(Arc::new(Push::Refresh)));
    }

    #[tokio::test]
    async fn test_dispatch_reaches_subscriber() {
        let mailbox = Mailbox::default();
        let mut sub = mailbox.subscribe(4);

        assert!(mailbox.dispatch(Arc::new(Push::Refresh)));
        let push = sub.receiver.recv().await.unwrap();
        assert_eq!(*push, Push::Refresh);
    }

    #[tokio::test]
    async fn test_new_subscription_closes_old_one() {
        let mailbox = Mailbox::default();
        let mut old = mailbox.subscribe(4);
        let mut new = mailbox.subscribe(4);

        assert!(matches!(old.receiver.recv().await, Err(RecvError::Closed)));

        mailbox.dispatch(Arc::new(Push::Refresh));
        assert!(new.receiver.recv().await.is_ok());
    }

    #[test]
    fn test_stale_unsubscribe_keeps_newer_subscription() {
        let mailbox = Mailbox::default();
        let old = mailbox.subscribe(4);
        let new = mailbox.subscribe(4);

        assert!(!mailbox.unsubscribe(old.id));
        assert!(mailbox.is_attached());

        assert!(mailbox.unsubscribe(new.id));
        assert!(!mailbox.is_attached());
    }

    #[test]
    fn test_full_buffer_drops_oldest_without_blocking() {
        let mailbox = Mailbox::default();
        let mut sub = mailbox.subscribe(2);

        for n in 0..5u32 {
            let push = Push::update_items(vec![crate::table::entities::TableItem::dealer(
                n, 0, 0,
            )]);
            assert!(mailbox.dispatch(Arc::new(push)));
        }

        assert!(matches!(sub.receiver.try_recv(), Err(TryRecvError::Lagged(3))));
        let next = sub.receiver.try_recv().unwrap();
        assert_eq!(next.items()[0].id, 3);
    }

    #[test]
    fn test_out_of_range_capacity_is_clamped() {
        let mailbox = Mailbox::default();
        let mut sub = mailbox.subscribe(0);
        assert!(mailbox.dispatch(Arc::new(Push::Refresh)));
        assert!(sub.receiver.try_recv().is_ok());

        // Beyond what the channel accepts.
        let _sub = mailbox.subscribe(usize::MAX);
        assert!(mailbox.is_attached());
    }

    #[test]
    fn test_clones_share_attachment() {
        let mailbox = Mailbox::default();
        let handle = mailbox.clone();
        let _sub = mailbox.subscribe(1);
        assert!(handle.is_attached());
        handle.close();
        assert!(!mailbox.is_attached());
    }
}
