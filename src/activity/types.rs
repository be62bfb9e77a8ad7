//! Activity hub configuration and subscriber handles.

use crate::types::SubscriberId;
use crossbeam_channel::{Receiver, RecvError, RecvTimeoutError, TryRecvError};
use std::time::Duration;

/// Configuration for an [`ActivityHub`](super::ActivityHub).
#[derive(Clone, Debug)]
pub struct HubConfig {
    /// Max undelivered activity lines before a subscriber is dropped.
    /// Default: 1000
    pub buffer_size: usize,

    /// Max stream paths one subscriber may follow.
    /// Default: 1024
    pub max_paths_per_subscriber: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1000,
            max_paths_per_subscriber: 1024,
        }
    }
}

/// A connected subscriber's end of the hub.
///
/// Each received item is a complete `.SubscriptionActivity {...}\n` line.
/// The channel disconnects when the subscriber is dropped or the hub stops.
pub struct SubscriberHandle {
    pub id: SubscriberId,
    pub receiver: Receiver<String>,
}

impl SubscriberHandle {
    /// Receive the next activity line (blocking).
    pub fn recv(&self) -> Result<String, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an activity line (non-blocking).
    pub fn try_recv(&self) -> Result<String, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<String, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}
