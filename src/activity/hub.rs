//! Activity hub: coalesces stream positions and fans them out to subscribers.

use crate::coalesce::CoalescingQueue;
use crate::control::{Activity, ControlEvent};
use crate::error::Result;
use crate::types::SubscriberId;
use crate::wire::{self, Command, Reply};
use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

use super::types::{HubConfig, SubscriberHandle};

/// Internal subscriber state.
struct Subscriber {
    paths: HashSet<String>,
    sender: Sender<String>,
}

impl Subscriber {
    /// Try to deliver a line. Returns false if the subscriber should be dropped.
    fn try_send(&self, line: String) -> bool {
        match self.sender.try_send(line) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// The part of a drained batch this subscriber follows.
    fn select(&self, batch: &HashMap<String, String>) -> Activity {
        batch
            .iter()
            .filter(|(path, _)| self.paths.contains(*path))
            .map(|(path, position)| (path.clone(), position.clone()))
            .collect()
    }
}

/// Fans coalesced stream positions out to subscribers.
///
/// Writers call [`report`](ActivityHub::report) on every tail advance. One
/// consumer thread ([`run`](ActivityHub::run)) drains the latest position
/// per stream and sends each subscriber a single `SubscriptionActivity`
/// line covering the streams it follows.
pub struct ActivityHub {
    positions: CoalescingQueue<String, String>,
    subscribers: RwLock<HashMap<SubscriberId, Subscriber>>,
    /// Lifecycle events not yet taken by the log writer.
    journal: Mutex<Vec<ControlEvent>>,
    next_id: AtomicU64,
    config: HubConfig,
}

impl ActivityHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            positions: CoalescingQueue::new(),
            subscribers: RwLock::new(HashMap::new()),
            journal: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            config,
        }
    }

    /// Record that `path` has advanced to `position`.
    ///
    /// Never blocks. Ignored once the hub is closed.
    pub fn report(&self, path: impl Into<String>, position: impl Into<String>) {
        self.positions.put(path.into(), position.into());
    }

    /// Register a new subscriber that follows no streams yet.
    ///
    /// Once the hub is closed the returned handle is already disconnected
    /// and nothing is registered.
    pub fn connect(&self) -> SubscriberHandle {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(self.config.buffer_size);

        // Checked under the write lock so the shutdown sweep in `run` sees
        // every subscriber admitted before close.
        let mut subs = self.subscribers.write();
        if self.positions.is_closed() {
            debug!(subscriber = %id, "refusing subscriber, hub is closed");
            return SubscriberHandle { id, receiver };
        }

        subs.insert(
            id,
            Subscriber {
                paths: HashSet::new(),
                sender,
            },
        );
        self.journal.lock().push(ControlEvent::subscribed(id));
        debug!(subscriber = %id, "subscriber connected");

        SubscriberHandle { id, receiver }
    }

    /// Remove a subscriber. Returns false if it was not connected.
    pub fn disconnect(&self, id: SubscriberId) -> bool {
        let mut subs = self.subscribers.write();
        let removed = subs.remove(&id).is_some();
        if removed {
            self.journal.lock().push(ControlEvent::unsubscribed(id));
            debug!(subscriber = %id, "subscriber disconnected");
        }
        removed
    }

    /// Execute one wire line sent by subscriber `id`.
    pub fn handle(&self, id: SubscriberId, line: &str) -> Reply {
        let tokens = wire::decode(line);
        match Command::from_tokens(&tokens) {
            Command::Sub(paths) => self.subscribe_paths(id, paths),
            Command::Unsub(paths) => self.unsubscribe_paths(id, paths),
            Command::Ping if self.is_connected(id) => Reply::Pong,
            Command::Bye if self.disconnect(id) => Reply::Bye,
            Command::Ping | Command::Bye => Reply::Err("unknown-subscriber".to_string()),
            Command::Unknown(verb) => {
                debug!(subscriber = %id, verb = %verb, "unknown command");
                Reply::Err("unknown-command".to_string())
            }
        }
    }

    fn subscribe_paths(&self, id: SubscriberId, paths: Vec<String>) -> Reply {
        if paths.is_empty() {
            return Reply::Err("missing-path".to_string());
        }

        let mut subs = self.subscribers.write();
        let Some(sub) = subs.get_mut(&id) else {
            return Reply::Err("unknown-subscriber".to_string());
        };

        let added: HashSet<&String> = paths.iter().filter(|p| !sub.paths.contains(*p)).collect();
        if sub.paths.len() + added.len() > self.config.max_paths_per_subscriber {
            return Reply::Err("too-many-paths".to_string());
        }

        debug!(subscriber = %id, paths = ?paths, "subscribed");
        sub.paths.extend(paths);
        Reply::Ok
    }

    fn unsubscribe_paths(&self, id: SubscriberId, paths: Vec<String>) -> Reply {
        if paths.is_empty() {
            return Reply::Err("missing-path".to_string());
        }

        let mut subs = self.subscribers.write();
        let Some(sub) = subs.get_mut(&id) else {
            return Reply::Err("unknown-subscriber".to_string());
        };

        for path in &paths {
            sub.paths.remove(path);
        }
        debug!(subscriber = %id, paths = ?paths, "unsubscribed");
        Reply::Ok
    }

    /// Send one drained batch to every subscriber that follows part of it.
    ///
    /// Subscribers whose buffer is full or whose handle is gone are dropped.
    /// Returns the number of lines delivered.
    pub fn dispatch(&self, batch: &HashMap<String, String>) -> usize {
        let mut delivered = 0;
        let mut to_remove = Vec::new();

        {
            let subs = self.subscribers.read();
            for (id, sub) in subs.iter() {
                let activity = sub.select(batch);
                if activity.is_empty() {
                    continue;
                }

                let line = match ControlEvent::subscription_activity(activity).to_line() {
                    Ok(line) => line,
                    Err(error) => {
                        warn!(subscriber = %id, %error, "failed to encode activity");
                        continue;
                    }
                };

                if sub.try_send(line) {
                    delivered += 1;
                } else {
                    to_remove.push(*id);
                }
            }
        }

        if !to_remove.is_empty() {
            let mut subs = self.subscribers.write();
            let mut journal = self.journal.lock();
            for id in to_remove {
                if subs.remove(&id).is_some() {
                    warn!(subscriber = %id, "dropping slow or disconnected subscriber");
                    journal.push(ControlEvent::unsubscribed(id));
                }
            }
        }

        delivered
    }

    /// Consumer loop. Returns once the hub is closed and fully drained.
    ///
    /// Every subscriber is disconnected on the way out.
    pub fn run(&self) {
        debug!("activity hub started");

        for () in self.positions.ready().iter() {
            let batch = self.positions.drain();
            if !batch.is_empty() {
                self.dispatch(&batch);
            }
        }

        let mut subs = self.subscribers.write();
        let mut journal = self.journal.lock();
        for (id, _) in subs.drain() {
            journal.push(ControlEvent::unsubscribed(id));
            debug!(subscriber = %id, "subscriber disconnected");
        }
        debug!("activity hub stopped");
    }

    /// Run the consumer loop on its own thread.
    pub fn spawn(self: &Arc<Self>) -> Result<JoinHandle<()>> {
        let hub = Arc::clone(self);
        let handle = thread::Builder::new()
            .name("activity-hub".to_string())
            .spawn(move || hub.run())?;
        Ok(handle)
    }

    /// Stop accepting reports. [`run`](ActivityHub::run) delivers what is
    /// still pending and then returns.
    pub fn close(&self) {
        self.positions.close();
    }

    pub fn is_closed(&self) -> bool {
        self.positions.is_closed()
    }

    /// Take the `Subscribed`/`Unsubscribed` events raised since the last call.
    pub fn take_journal(&self) -> Vec<ControlEvent> {
        std::mem::take(&mut *self.journal.lock())
    }

    pub fn is_connected(&self, id: SubscriberId) -> bool {
        self.subscribers.read().contains_key(&id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }
}

impl Default for ActivityHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control;
    use std::time::Duration;

    fn activity_of(line: &str) -> Activity {
        match control::parse(line).unwrap() {
            ControlEvent::SubscriptionActivity(a) => a.activity,
            other => panic!("Expected SubscriptionActivity, got {:?}", other),
        }
    }

    #[test]
    fn test_connect_disconnect() {
        let hub = ActivityHub::default();

        let handle = hub.connect();
        assert_eq!(hub.subscriber_count(), 1);

        assert!(hub.disconnect(handle.id));
        assert!(!hub.disconnect(handle.id));
        assert_eq!(hub.subscriber_count(), 0);

        let journal = hub.take_journal();
        assert_eq!(journal.len(), 2);
        assert!(matches!(&journal[0], ControlEvent::Subscribed(s) if s.id == handle.id));
        assert!(matches!(&journal[1], ControlEvent::Unsubscribed(u) if u.id == handle.id));
        assert!(hub.take_journal().is_empty());
    }

    #[test]
    fn test_handle_commands() {
        let hub = ActivityHub::default();
        let handle = hub.connect();

        assert_eq!(hub.handle(handle.id, "SUB /tenants/foo\n"), Reply::Ok);
        assert_eq!(hub.handle(handle.id, "UNSUB /tenants/foo\n"), Reply::Ok);
        assert_eq!(hub.handle(handle.id, "PING\n"), Reply::Pong);
        assert_eq!(
            hub.handle(handle.id, "SUB\n"),
            Reply::Err("missing-path".to_string())
        );
        assert_eq!(
            hub.handle(handle.id, "JUMP\n"),
            Reply::Err("unknown-command".to_string())
        );
        assert_eq!(hub.handle(handle.id, ""), Reply::Err("unknown-command".to_string()));
        assert_eq!(hub.handle(handle.id, "BYE\n"), Reply::Bye);
        assert!(!hub.is_connected(handle.id));
        assert_eq!(
            hub.handle(handle.id, "PING\n"),
            Reply::Err("unknown-subscriber".to_string())
        );
        assert_eq!(
            hub.handle(handle.id, "BYE\n"),
            Reply::Err("unknown-subscriber".to_string())
        );
    }

    #[test]
    fn test_path_limit() {
        let hub = ActivityHub::new(HubConfig {
            max_paths_per_subscriber: 2,
            ..Default::default()
        });
        let handle = hub.connect();

        assert_eq!(hub.handle(handle.id, "SUB /a /b\n"), Reply::Ok);
        // Re-subscribing to followed paths does not count against the limit.
        assert_eq!(hub.handle(handle.id, "SUB /a\n"), Reply::Ok);
        assert_eq!(
            hub.handle(handle.id, "SUB /c\n"),
            Reply::Err("too-many-paths".to_string())
        );
    }

    #[test]
    fn test_dispatch_filters_by_path() {
        let hub = ActivityHub::default();
        let foo = hub.connect();
        let bar = hub.connect();
        let idle = hub.connect();
        hub.handle(foo.id, "SUB /tenants/foo\n");
        hub.handle(bar.id, "SUB /tenants/bar /tenants/foo\n");

        hub.report("/tenants/foo", "1:0:10");
        hub.report("/tenants/foo", "1:0:11");
        hub.report("/tenants/bar", "2:0:3");
        hub.report("/tenants/baz", "9");

        let delivered = hub.dispatch(&hub.positions.drain());
        assert_eq!(delivered, 2);

        let line = foo.recv_timeout(Duration::from_millis(100)).unwrap();
        let activity = activity_of(&line);
        assert_eq!(activity.len(), 1);
        assert_eq!(activity["/tenants/foo"], "1:0:11");

        let activity = activity_of(&bar.recv_timeout(Duration::from_millis(100)).unwrap());
        assert_eq!(activity.len(), 2);
        assert_eq!(activity["/tenants/bar"], "2:0:3");

        assert!(idle.try_recv().is_err());
    }

    #[test]
    fn test_drop_slow_subscriber() {
        let hub = ActivityHub::new(HubConfig {
            buffer_size: 2,
            ..Default::default()
        });
        let handle = hub.connect();
        hub.handle(handle.id, "SUB /a\n");
        hub.take_journal();

        for i in 0..5 {
            hub.report("/a", i.to_string());
            hub.dispatch(&hub.positions.drain());
        }

        assert_eq!(hub.subscriber_count(), 0);
        let journal = hub.take_journal();
        assert_eq!(journal.len(), 1);
        assert!(matches!(&journal[0], ControlEvent::Unsubscribed(_)));
    }

    #[test]
    fn test_drop_vanished_subscriber() {
        let hub = ActivityHub::default();
        let handle = hub.connect();
        hub.handle(handle.id, "SUB /a\n");
        drop(handle);

        hub.report("/a", "1");
        assert_eq!(hub.dispatch(&hub.positions.drain()), 0);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_run_exits_after_close() {
        let hub = Arc::new(ActivityHub::default());
        let handle = hub.connect();
        hub.handle(handle.id, "SUB /a\n");

        let worker = hub.spawn().unwrap();
        hub.report("/a", "1");
        hub.close();
        hub.report("/a", "2");
        worker.join().unwrap();

        let lines: Vec<String> = handle.receiver.iter().collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(activity_of(&lines[0])["/a"], "1");
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_connect_after_shutdown_is_disconnected() {
        let hub = Arc::new(ActivityHub::default());
        let worker = hub.spawn().unwrap();
        hub.close();
        worker.join().unwrap();
        hub.take_journal();

        let handle = hub.connect();
        assert!(!hub.is_connected(handle.id));
        assert_eq!(hub.subscriber_count(), 0);
        assert!(matches!(
            handle.recv_timeout(Duration::from_millis(200)),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected)
        ));
        assert!(hub.take_journal().is_empty());
        assert_eq!(
            hub.handle(handle.id, "SUB /a\n"),
            Reply::Err("unknown-subscriber".to_string())
        );
    }

    #[test]
    fn test_shutdown_journal_follows_connects() {
        let hub = Arc::new(ActivityHub::default());
        let worker = hub.spawn().unwrap();

        let connectors: Vec<_> = (0..4)
            .map(|_| {
                let hub = Arc::clone(&hub);
                thread::spawn(move || hub.connect())
            })
            .collect();
        hub.close();
        let handles: Vec<SubscriberHandle> =
            connectors.into_iter().map(|c| c.join().unwrap()).collect();
        worker.join().unwrap();

        // Every admitted subscriber is subscribed before it is unsubscribed,
        // and the shutdown sweep leaves no channel open.
        let journal = hub.take_journal();
        let mut subscribed = HashSet::new();
        for event in &journal {
            match event {
                ControlEvent::Subscribed(s) => assert!(subscribed.insert(s.id)),
                ControlEvent::Unsubscribed(u) => assert!(subscribed.remove(&u.id)),
                other => panic!("Unexpected journal entry {:?}", other),
            }
        }
        assert!(subscribed.is_empty());
        for handle in handles {
            assert!(handle.receiver.iter().next().is_none());
        }
        assert_eq!(hub.subscriber_count(), 0);
    }
}
