//! Partitioned last-value-wins mailbox.
//!
//! Any number of producers [`put`](CoalescingQueue::put) values keyed by
//! partition; a single consumer waits on [`ready`](CoalescingQueue::ready)
//! and takes everything pending with [`drain`](CoalescingQueue::drain).
//! Values put for a partition between two drains overwrite each other, so
//! memory is bounded by the number of partitions, not the update rate.
//!
//! The wake-up signal is a capacity-1 channel that carries no data. A token
//! is sent only when the pending map goes from empty to non-empty, which
//! keeps the invariant: while anything is pending, either a token is
//! buffered or the consumer has taken one and is about to drain.
//!
//! # Example
//!
//! ```ignore
//! let queue = Arc::new(CoalescingQueue::new());
//!
//! let consumer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || {
//!         for () in queue.ready().iter() {
//!             for (stream, position) in queue.drain() {
//!                 println!("{} is at {}", stream, position);
//!             }
//!         }
//!     })
//! };
//!
//! queue.put("/tenants/foo".to_string(), "1:0:42".to_string());
//! queue.close();
//! consumer.join().unwrap();
//! ```

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;

struct Pending<K, V> {
    values: HashMap<K, V>,
    /// Dropped on close so the receiver disconnects.
    signal: Option<Sender<()>>,
}

/// Lossy, partition-keyed queue with a coalesced wake-up signal.
pub struct CoalescingQueue<K, V> {
    pending: Mutex<Pending<K, V>>,
    ready: Receiver<()>,
}

impl<K: Eq + Hash, V> CoalescingQueue<K, V> {
    pub fn new() -> Self {
        let (signal, ready) = bounded(1);
        Self {
            pending: Mutex::new(Pending {
                values: HashMap::new(),
                signal: Some(signal),
            }),
            ready,
        }
    }

    /// Record `value` as the latest for `key`.
    ///
    /// Never blocks on the consumer. A no-op once the queue is closed.
    pub fn put(&self, key: K, value: V) {
        let mut guard = self.pending.lock();
        let pending = &mut *guard;
        let Some(signal) = &pending.signal else {
            return;
        };

        let was_empty = pending.values.is_empty();
        pending.values.insert(key, value);

        if was_empty {
            // Full means a wake-up is already buffered.
            let _ = signal.try_send(());
        }
    }

    /// Signal the consumer waits on.
    ///
    /// Yields one `()` per wake-up and disconnects after [`close`] once
    /// the last buffered wake-up has been received, so
    /// `for () in queue.ready().iter()` ends on its own.
    ///
    /// [`close`]: CoalescingQueue::close
    pub fn ready(&self) -> Receiver<()> {
        self.ready.clone()
    }

    /// Take everything pending. Returns an empty map if nothing is.
    pub fn drain(&self) -> HashMap<K, V> {
        let mut pending = self.pending.lock();
        std::mem::take(&mut pending.values)
    }

    /// Stop accepting values. Pending values stay drainable.
    pub fn close(&self) {
        self.pending.lock().signal = None;
    }

    pub fn is_closed(&self) -> bool {
        self.pending.lock().signal.is_none()
    }

    /// Number of partitions with a value waiting.
    pub fn pending_len(&self) -> usize {
        self.pending.lock().values.len()
    }
}

impl<K: Eq + Hash, V> Default for CoalescingQueue<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
