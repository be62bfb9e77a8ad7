//! Line protocol between subscribers and the activity hub.
//!
//! A message is one line of space-separated tokens; the first token is the
//! verb. Activity pushes travel on the same connection as control lines
//! (`.SubscriptionActivity {...}`), which a client tells apart from replies
//! with [`crate::framing::classify`].

mod codec;
mod command;

pub use codec::{decode, encode};
pub use command::{Command, Reply};
