//! Action vocabulary understood by the actuator.
//!
//! `stop`, `unload` and `loadup` take no parameter; `go`, `right` and `left`
//! carry an integer after a `:` (`go:2`, `right:90`).

use std::fmt;
use std::str::FromStr;

use crate::error::ActionError;

/// A directive for the actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Stop,
    Unload,
    Loadup,
    /// Drive forward at the given wheel speed.
    Go(i64),
    /// Turn right by the given cumulative angle in degrees.
    Right(i64),
    /// Turn left by the given cumulative angle in degrees.
    Left(i64),
}

impl Command {
    /// Parses `verb` or `verb:integer`.
    pub fn parse(action: &str) -> Result<Self, ActionError> {
        let Some((verb, value)) = action.split_once(':') else {
            return match action {
                "stop" => Ok(Command::Stop),
                "unload" => Ok(Command::Unload),
                "loadup" => Ok(Command::Loadup),
                _ => Err(ActionError::UnknownVerb {
                    action: action.to_string(),
                }),
            };
        };

        let build: fn(i64) -> Command = match verb {
            "go" => Command::Go,
            "right" => Command::Right,
            "left" => Command::Left,
            _ => {
                return Err(ActionError::UnknownVerb {
                    action: action.to_string(),
                })
            }
        };

        value
            .parse::<i64>()
            .map(build)
            .map_err(|_| ActionError::BadParameter {
                action: action.to_string(),
                value: value.to_string(),
            })
    }
}

impl FromStr for Command {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::parse(s)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Stop => f.write_str("stop"),
            Command::Unload => f.write_str("unload"),
            Command::Loadup => f.write_str("loadup"),
            Command::Go(v) => write!(f, "go:{v}"),
            Command::Right(v) => write!(f, "right:{v}"),
            Command::Left(v) => write!(f, "left:{v}"),
        }
    }
}
