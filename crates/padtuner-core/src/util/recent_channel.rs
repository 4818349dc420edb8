//! A channel that only ever holds the most recent message. Senders never
//! block; an unread message is silently overwritten by the next one.
//! Built from a shared slot plus a capacity-one notifier channel.

use std::{sync::Arc, time::Duration};

use crossbeam::{atomic::AtomicCell, channel};

pub type RecvTimeoutError = channel::RecvTimeoutError;
pub type TryRecvError = channel::TryRecvError;

pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
    let slot = Arc::new(AtomicCell::new(None));
    let (notifier, notified) = channel::bounded(1);

    (
        Sender {
            notifier,
            slot: slot.clone(),
        },
        Receiver {
            notified,
            slot,
        },
    )
}

pub struct Sender<T> {
    notifier: channel::Sender<()>,
    slot: Arc<AtomicCell<Option<T>>>,
}

impl<T> Sender<T> {
    /// Stores `msg` as the latest value, replacing any unread one.
    pub fn try_send(&self, msg: T) -> Result<(), TrySendError<T>> {
        self.slot.store(Some(msg));
        match self.notifier.try_send(()) {
            // A pending notification means the receiver will pick up the
            // replacement value anyway.
            Ok(()) | Err(channel::TrySendError::Full(())) => Ok(()),
            Err(channel::TrySendError::Disconnected(())) => {
                Err(TrySendError::Disconnected(self.take()))
            }
        }
    }

    fn take(&self) -> T {
        self.slot.swap(None).unwrap()
    }
}

pub struct Receiver<T> {
    notified: channel::Receiver<()>,
    slot: Arc<AtomicCell<Option<T>>>,
}

impl<T> Receiver<T> {
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        self.notified.recv_timeout(timeout).map(|()| self.take())
    }

    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.notified.try_recv().map(|()| self.take())
    }

    fn take(&self) -> T {
        self.slot.swap(None).unwrap()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrySendError<T> {
    #[error("sending on a disconnected channel")]
    Disconnected(T),
}
