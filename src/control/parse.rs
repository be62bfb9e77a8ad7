//! Control line parsing.

use super::events::{
    AuthorityChanged, ChildCreated, ControlEvent, Initialized, Rotated, Subscribed,
    SubscriptionActivity, Unrecognized, Unsubscribed,
};
use crate::error::{FrameError, Result};
use serde::de::{DeserializeOwned, Error as _};
use serde_json::Value;

/// Field some producers duplicate from the line prefix into the body.
const TYPE_FIELD: &str = "type";

/// Parse a control line into a typed event.
///
/// The line must look like `.Identifier {json}`, optionally followed by one
/// `\n`. Identifiers this reader does not know come back as
/// [`ControlEvent::Unrecognized`] without their body being inspected.
pub fn parse(line: &str) -> Result<ControlEvent> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let (kind, body) = split(line)?;

    let event = match kind {
        "Initialized" => ControlEvent::Initialized(decode::<Initialized>(kind, body, line)?),
        "Rotated" => ControlEvent::Rotated(decode::<Rotated>(kind, body, line)?),
        "AuthorityChanged" => {
            ControlEvent::AuthorityChanged(decode::<AuthorityChanged>(kind, body, line)?)
        }
        "ChildCreated" => ControlEvent::ChildCreated(decode::<ChildCreated>(kind, body, line)?),
        "Subscribed" => ControlEvent::Subscribed(decode::<Subscribed>(kind, body, line)?),
        "Unsubscribed" => ControlEvent::Unsubscribed(decode::<Unsubscribed>(kind, body, line)?),
        "SubscriptionActivity" => ControlEvent::SubscriptionActivity(
            decode::<SubscriptionActivity>(kind, body, line)?,
        ),
        _ => ControlEvent::Unrecognized(Unrecognized {
            kind: kind.to_string(),
            raw: line.to_string(),
        }),
    };

    Ok(event)
}

/// Split `.Identifier body` into its identifier and body.
fn split(line: &str) -> Result<(&str, &str)> {
    let violation = |reason| FrameError::FramingViolation {
        line: line.to_string(),
        reason,
    };

    let rest = line
        .strip_prefix('.')
        .ok_or_else(|| violation("missing control prefix"))?;

    let ident_len = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .count();
    if ident_len == 0 {
        return Err(violation("empty identifier"));
    }

    let (kind, rest) = rest.split_at(ident_len);
    let body = match rest.strip_prefix(' ') {
        Some(body) => body,
        None if rest.is_empty() => return Err(violation("missing body")),
        None => return Err(violation("identifier must be letters followed by a space")),
    };
    if body.is_empty() {
        return Err(violation("missing body"));
    }

    Ok((kind, body))
}

fn decode<T: DeserializeOwned>(kind: &str, body: &str, line: &str) -> Result<T> {
    let body_error = |source| FrameError::BodyDecode {
        kind: kind.to_string(),
        line: line.to_string(),
        source,
    };

    let value: Value = serde_json::from_str(body).map_err(body_error)?;
    let fields = value
        .as_object()
        .ok_or_else(|| body_error(serde_json::Error::custom("body is not a JSON object")))?;

    if let Some(tag) = fields.get(TYPE_FIELD) {
        if tag.as_str() != Some(kind) {
            return Err(FrameError::TagMismatch {
                prefix: kind.to_string(),
                body: tag.to_string(),
                line: line.to_string(),
            });
        }
    }

    serde_json::from_value(value).map_err(body_error)
}
