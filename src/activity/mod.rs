//! Subscription activity broadcasting.
//!
//! Writers report stream tail positions as they advance; subscribers ask
//! for the streams they care about over the wire protocol and receive
//! `.SubscriptionActivity {...}` lines carrying the latest position of each.
//!
//! - Reports never block, however slow the subscribers are
//! - Intermediate positions between two deliveries are dropped
//! - A subscriber whose buffer fills up is disconnected
//!
//! # Example
//!
//! ```ignore
//! let hub = Arc::new(ActivityHub::new(HubConfig::default()));
//! let worker = hub.spawn()?;
//!
//! let handle = hub.connect();
//! hub.handle(handle.id, "SUB /tenants/foo\n");
//!
//! hub.report("/tenants/foo", "1:0:42");
//! let line = handle.recv()?; // .SubscriptionActivity {"activity":{"/tenants/foo":"1:0:42"},...}
//!
//! hub.close();
//! worker.join().unwrap();
//! ```

mod hub;
mod types;

pub use hub::ActivityHub;
pub use types::{HubConfig, SubscriberHandle};
