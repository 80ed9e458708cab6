//! Cancellable push subscriptions.
//!
//! A repository hands out a [`Subscription`] backed by an unbounded channel
//! plus a cancel hook. Every notification carries the full current result set.
//! Dropping the subscription runs the cancel hook, so a view that owns its
//! subscriptions releases them simply by being dropped.

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::StreamExt;

use chat_types::{ChatError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionEvent<T> {
    Snapshot(Vec<T>),
    /// Terminal: nothing follows an error.
    Error(ChatError),
}

/// Producer half, held by the repository's listener registry.
pub struct SubscriptionSender<T> {
    tx: UnboundedSender<SubscriptionEvent<T>>,
}

impl<T> Clone for SubscriptionSender<T> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

impl<T> SubscriptionSender<T> {
    /// Returns false once the subscriber is gone.
    pub fn send_snapshot(&self, items: Vec<T>) -> bool {
        self.tx.unbounded_send(SubscriptionEvent::Snapshot(items)).is_ok()
    }

    /// Deliver a terminal error and close the channel.
    pub fn send_error(&self, error: ChatError) {
        let _ = self.tx.unbounded_send(SubscriptionEvent::Error(error));
        self.tx.close_channel();
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half, owned by a view.
pub struct Subscription<T> {
    rx: UnboundedReceiver<SubscriptionEvent<T>>,
    cancel: Option<Box<dyn FnOnce()>>,
    /// Producer went away after queuing a snapshot; reported on the next poll.
    closed_pending: bool,
    dead: bool,
}

impl<T> Subscription<T> {
    /// New subscription; `cancel` runs exactly once, on drop or [`Subscription::cancel`].
    pub fn channel(cancel: impl FnOnce() + 'static) -> (SubscriptionSender<T>, Subscription<T>) {
        let (tx, rx) = mpsc::unbounded();
        let sub = Subscription {
            rx,
            cancel: Some(Box::new(cancel)),
            closed_pending: false,
            dead: false,
        };
        (SubscriptionSender { tx }, sub)
    }

    /// Drain queued notifications without waiting.
    ///
    /// Returns the newest snapshot if any arrived. A delivered error (or the
    /// producer going away) is reported once, on the poll after the last
    /// snapshot, after which the subscription is dead and always yields
    /// `Ok(None)`.
    pub fn poll_latest(&mut self) -> Result<Option<Vec<T>>> {
        if self.dead {
            return Ok(None);
        }
        if self.closed_pending {
            self.closed_pending = false;
            self.dead = true;
            return Err(ChatError::SubscriptionClosed);
        }
        let mut latest = None;
        loop {
            match self.rx.try_next() {
                Ok(Some(SubscriptionEvent::Snapshot(items))) => latest = Some(items),
                Ok(Some(SubscriptionEvent::Error(err))) => {
                    self.dead = true;
                    return Err(err);
                }
                Ok(None) => {
                    if latest.is_none() {
                        self.dead = true;
                        return Err(ChatError::SubscriptionClosed);
                    }
                    self.closed_pending = true;
                    break;
                }
                Err(_) => break,
            }
        }
        Ok(latest)
    }

    /// Wait for the next notification. `None` once the subscription is dead.
    pub async fn next(&mut self) -> Option<SubscriptionEvent<T>> {
        if self.dead {
            return None;
        }
        let event = self.rx.next().await;
        if !matches!(event, Some(SubscriptionEvent::Snapshot(_))) {
            self.dead = true;
        }
        event
    }

    pub fn is_dead(&self) -> bool {
        self.dead || self.closed_pending
    }

    /// Unsubscribe now rather than at drop.
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        self.rx.close();
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.release();
    }
}
