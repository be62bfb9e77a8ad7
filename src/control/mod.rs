//! Control events embedded in stream logs.
//!
//! Control lines record facts about the stream itself rather than
//! application payload:
//! - Stream creation and chunk rotation
//! - Authority (replication peer set) changes
//! - Child stream creation
//! - Subscription lifecycle and activity
//!
//! Every line has the form `.Kind {json}`. Kinds this crate does not know
//! parse as [`ControlEvent::Unrecognized`] so older readers keep working
//! when newer writers add event types.
//!
//! # Example
//!
//! ```ignore
//! let line = ControlEvent::rotated("/tenants/foo:1:0:127.0.0.1").to_line()?;
//! match control::parse(&line)? {
//!     ControlEvent::Rotated(r) => println!("next chunk: {}", r.next),
//!     ControlEvent::Unrecognized(u) => println!("skipping {}", u.kind),
//!     _ => {}
//! }
//! ```

mod events;
mod parse;

pub use events::{
    Activity, AuthorityChanged, ChildCreated, ControlEvent, Initialized, Rotated, Subscribed,
    SubscriptionActivity, Unrecognized, Unsubscribed,
};
pub use parse::parse;
