//! # Eventline
//!
//! Notification and framing core for append-only, chunked event streams.
//!
//! ## Core Concepts
//!
//! - **Framing**: Data and control lines share one text log, kept apart by
//!   a one-character escape
//! - **Control events**: Typed stream metadata (rotation, authority,
//!   subscriptions) with forward-compatible parsing
//! - **Coalescing queue**: Last-value-wins mailbox that never blocks writers
//! - **Wire protocol**: Space-separated token lines between subscribers and
//!   the activity hub
//!
//! ## Example
//!
//! ```ignore
//! use eventline::{SegmentReader, SegmentWriter, ControlEvent, Entry};
//!
//! let mut writer = SegmentWriter::new(Vec::new());
//! writer.append_event(&ControlEvent::initialized())?;
//! writer.append_data(".payload that looks like a control line")?;
//! writer.append_event(&ControlEvent::rotated("/tenants/foo:1:0:127.0.0.1"))?;
//!
//! let bytes = writer.into_inner();
//! for entry in SegmentReader::new(&bytes[..]) {
//!     match entry? {
//!         Entry::Data(data) => println!("data: {}", data),
//!         Entry::Control(event) => println!("control: {}", event.kind()),
//!     }
//! }
//! ```

pub mod activity;
pub mod coalesce;
pub mod control;
pub mod error;
pub mod framing;
pub mod segment;
pub mod types;
pub mod wire;

// Re-exports
pub use activity::{ActivityHub, HubConfig, SubscriberHandle};
pub use coalesce::CoalescingQueue;
pub use control::{Activity, ControlEvent};
pub use error::{FrameError, LinePosition, Result};
pub use framing::{classify, escape_for_append, Line};
pub use segment::{Entry, SegmentReader, SegmentWriter};
pub use types::{SubscriberId, Timestamp};
pub use wire::{Command, Reply};
