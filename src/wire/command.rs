//! Commands a subscriber sends and the replies it gets back.

use super::codec::encode;

/// A decoded subscriber command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `SUB <path>...`
    Sub(Vec<String>),
    /// `UNSUB <path>...`
    Unsub(Vec<String>),
    /// `PING`
    Ping,
    /// `BYE`
    Bye,
    /// Any other verb, including the empty one.
    Unknown(String),
}

impl Command {
    /// Interpret decoded tokens. Verbs are upper case and case-sensitive.
    pub fn from_tokens(tokens: &[&str]) -> Self {
        let (verb, args) = match tokens.split_first() {
            Some((verb, args)) => (*verb, args),
            None => return Command::Unknown(String::new()),
        };
        let paths = || -> Vec<String> {
            args.iter()
                .filter(|a| !a.is_empty())
                .map(|a| a.to_string())
                .collect()
        };

        match verb {
            "SUB" => Command::Sub(paths()),
            "UNSUB" => Command::Unsub(paths()),
            "PING" => Command::Ping,
            "BYE" => Command::Bye,
            other => Command::Unknown(other.to_string()),
        }
    }

    pub fn verb(&self) -> &str {
        match self {
            Command::Sub(_) => "SUB",
            Command::Unsub(_) => "UNSUB",
            Command::Ping => "PING",
            Command::Bye => "BYE",
            Command::Unknown(verb) => verb,
        }
    }

    /// Encode as a wire line.
    pub fn encode(&self) -> String {
        match self {
            Command::Sub(paths) | Command::Unsub(paths) => {
                let mut tokens = Vec::with_capacity(paths.len() + 1);
                tokens.push(self.verb());
                tokens.extend(paths.iter().map(String::as_str));
                encode(&tokens)
            }
            _ => encode(&[self.verb()]),
        }
    }
}

/// Reply to a [`Command`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Pong,
    Bye,
    Err(String),
}

impl Reply {
    /// Encode as a wire line. Error text is sent as a single token.
    pub fn encode(&self) -> String {
        match self {
            Reply::Ok => encode(&["OK"]),
            Reply::Pong => encode(&["PONG"]),
            Reply::Bye => encode(&["BYE"]),
            Reply::Err(reason) => encode(&["ERR", reason.as_str()]),
        }
    }
}
