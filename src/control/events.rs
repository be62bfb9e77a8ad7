//! Control event types.

use crate::error::Result;
use crate::types::{SubscriberId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stream path to latest position.
pub type Activity = BTreeMap<String, String>;

/// A stream was created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Initialized {
    pub ts: Timestamp,
}

/// The stream continues in another chunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rotated {
    /// Locator of the next chunk.
    pub next: String,
    pub ts: Timestamp,
}

/// The set of peers authoritative for the stream changed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityChanged {
    pub peers: Vec<String>,
    pub ts: Timestamp,
}

/// A child stream was created under this one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildCreated {
    pub child: String,
    pub ts: Timestamp,
}

/// A subscriber connected to the activity hub.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscribed {
    pub id: SubscriberId,
    pub ts: Timestamp,
}

/// A subscriber left or was dropped by the activity hub.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unsubscribed {
    pub id: SubscriberId,
    pub ts: Timestamp,
}

/// Latest positions of the streams that moved since the previous batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionActivity {
    pub activity: Activity,
    pub ts: Timestamp,
}

/// A control line whose kind this reader does not know.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unrecognized {
    pub kind: String,
    /// The line as read, without its trailing newline.
    pub raw: String,
}

/// Every control event that can appear in a log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlEvent {
    Initialized(Initialized),
    Rotated(Rotated),
    AuthorityChanged(AuthorityChanged),
    ChildCreated(ChildCreated),
    Subscribed(Subscribed),
    Unsubscribed(Unsubscribed),
    SubscriptionActivity(SubscriptionActivity),
    /// Written by a newer producer; kept verbatim.
    Unrecognized(Unrecognized),
}

impl ControlEvent {
    pub fn initialized() -> Self {
        ControlEvent::Initialized(Initialized { ts: Timestamp::now() })
    }

    pub fn rotated(next: impl Into<String>) -> Self {
        ControlEvent::Rotated(Rotated {
            next: next.into(),
            ts: Timestamp::now(),
        })
    }

    pub fn authority_changed(peers: Vec<String>) -> Self {
        ControlEvent::AuthorityChanged(AuthorityChanged {
            peers,
            ts: Timestamp::now(),
        })
    }

    pub fn child_created(child: impl Into<String>) -> Self {
        ControlEvent::ChildCreated(ChildCreated {
            child: child.into(),
            ts: Timestamp::now(),
        })
    }

    pub fn subscribed(id: SubscriberId) -> Self {
        ControlEvent::Subscribed(Subscribed {
            id,
            ts: Timestamp::now(),
        })
    }

    pub fn unsubscribed(id: SubscriberId) -> Self {
        ControlEvent::Unsubscribed(Unsubscribed {
            id,
            ts: Timestamp::now(),
        })
    }

    pub fn subscription_activity(activity: Activity) -> Self {
        ControlEvent::SubscriptionActivity(SubscriptionActivity {
            activity,
            ts: Timestamp::now(),
        })
    }

    /// The identifier written after the leading `.`.
    pub fn kind(&self) -> &str {
        match self {
            ControlEvent::Initialized(_) => "Initialized",
            ControlEvent::Rotated(_) => "Rotated",
            ControlEvent::AuthorityChanged(_) => "AuthorityChanged",
            ControlEvent::ChildCreated(_) => "ChildCreated",
            ControlEvent::Subscribed(_) => "Subscribed",
            ControlEvent::Unsubscribed(_) => "Unsubscribed",
            ControlEvent::SubscriptionActivity(_) => "SubscriptionActivity",
            ControlEvent::Unrecognized(u) => &u.kind,
        }
    }

    /// When the event was raised. `None` for unrecognized events.
    pub fn timestamp(&self) -> Option<Timestamp> {
        match self {
            ControlEvent::Initialized(e) => Some(e.ts),
            ControlEvent::Rotated(e) => Some(e.ts),
            ControlEvent::AuthorityChanged(e) => Some(e.ts),
            ControlEvent::ChildCreated(e) => Some(e.ts),
            ControlEvent::Subscribed(e) => Some(e.ts),
            ControlEvent::Unsubscribed(e) => Some(e.ts),
            ControlEvent::SubscriptionActivity(e) => Some(e.ts),
            ControlEvent::Unrecognized(_) => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, ControlEvent::Unrecognized(_))
    }

    /// Render as a canonical control line, `.Kind {json}\n`.
    ///
    /// Unrecognized events are written back exactly as they were read.
    pub fn to_line(&self) -> Result<String> {
        let body = match self {
            ControlEvent::Initialized(e) => serde_json::to_string(e)?,
            ControlEvent::Rotated(e) => serde_json::to_string(e)?,
            ControlEvent::AuthorityChanged(e) => serde_json::to_string(e)?,
            ControlEvent::ChildCreated(e) => serde_json::to_string(e)?,
            ControlEvent::Subscribed(e) => serde_json::to_string(e)?,
            ControlEvent::Unsubscribed(e) => serde_json::to_string(e)?,
            ControlEvent::SubscriptionActivity(e) => serde_json::to_string(e)?,
            ControlEvent::Unrecognized(u) => {
                let mut line = u.raw.clone();
                line.push('\n');
                return Ok(line);
            }
        };

        let kind = self.kind();
        let mut line = String::with_capacity(kind.len() + body.len() + 3);
        line.push('.');
        line.push_str(kind);
        line.push(' ');
        line.push_str(&body);
        line.push('\n');
        Ok(line)
    }
}
