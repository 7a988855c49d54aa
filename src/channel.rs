//! Bounded, ownership-transferring message channel.
//!
//! A thin policy layer over `embassy_sync::channel::Channel`:
//!
//! - `post` never waits; when the buffer is full the *new* value is
//!   dropped and `false` is returned (existing entries are never
//!   overwritten).
//! - `drain_*` never waits either; consumers call them from their own
//!   periodic tick.
//!
//! Values are moved in on post and moved out on drain, so between those
//! two points the channel is the only owner.  The raw mutex `M` guards
//! the buffer; use `CriticalSectionRawMutex` whenever producers live in
//! another task or interrupt.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, TrySendError};

pub struct MessageChannel<M: RawMutex, T, const N: usize> {
    inner: Channel<M, T, N>,
    dropped: AtomicU32,
}

impl<M: RawMutex, T, const N: usize> MessageChannel<M, T, N> {
    /// Create an empty channel. `const` so it can back a `static`.
    pub const fn new() -> Self {
        Self {
            inner: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Enqueue `value` without blocking.
    ///
    /// Returns `false` and drops `value` if the channel is at capacity.
    pub fn post(&self, value: T) -> bool {
        match self.inner.try_send(value) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("channel full ({} slots), newest value dropped", N);
                false
            }
        }
    }

    /// Remove and return the oldest entry, if any.
    pub fn drain_one(&self) -> Option<T> {
        self.inner.try_receive().ok()
    }

    /// Drain everything currently queued, oldest first, handing each value
    /// to `visit`. Returns how many values were drained.
    pub fn drain_all(&self, mut visit: impl FnMut(T)) -> usize {
        let mut count = 0;
        while let Some(value) = self.drain_one() {
            visit(value);
            count += 1;
        }
        count
    }

    /// Drain everything and keep only the newest value.
    ///
    /// Older values in the batch are discarded unseen.
    pub fn drain_latest(&self) -> Option<T> {
        let mut latest = None;
        let drained = self.drain_all(|value| latest = Some(value));
        if drained > 1 {
            trace!("collapsed {} queued values into the latest", drained);
        }
        latest
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of values rejected because the channel was full.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<M: RawMutex, T, const N: usize> Default for MessageChannel<M, T, N> {
    fn default() -> Self {
        Self::new()
    }
}
