use crate::Exchange;
use adx_core::models::BidEvent;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

/// A cloneable handle to one [`Exchange`], shared between request handlers
/// and background tasks.
///
/// Every operation runs under the lock, so concurrent callers are applied one
/// at a time in the order they acquire it. Operations never block internally,
/// which keeps the critical section short.
pub struct SharedExchange<R, L, C> {
    inner: Arc<Mutex<Exchange<R, L, C>>>,
    events: broadcast::Sender<BidEvent>,
}

impl<R, L, C> Clone for SharedExchange<R, L, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            events: self.events.clone(),
        }
    }
}

impl<R, L, C> SharedExchange<R, L, C> {
    /// Take exclusive access to the exchange.
    ///
    /// A panic in another holder does not leave the exchange half-updated
    /// (state is only committed after every fallible step), so a poisoned
    /// lock is recovered rather than propagated.
    pub fn lock(&self) -> MutexGuard<'_, Exchange<R, L, C>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Receive every notification published after this call, without taking
    /// the lock.
    pub fn subscribe(&self) -> broadcast::Receiver<BidEvent> {
        self.events.subscribe()
    }
}

impl<R, L, C> From<Exchange<R, L, C>> for SharedExchange<R, L, C> {
    fn from(exchange: Exchange<R, L, C>) -> Self {
        let events = exchange.notifier.sender();
        Self {
            inner: Arc::new(Mutex::new(exchange)),
            events,
        }
    }
}
