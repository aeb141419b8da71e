//! Configuration-time error types shared by all protocols

use std::num::ParseIntError;

use thiserror::Error;

/// Result type for command construction
pub type CommandResult<T> = Result<T, CommandError>;

/// Errors raised while building a command from its configuration
///
/// Every variant is fatal for the one command being built and nothing else.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Verb name is not part of the protocol
    #[error("No such command: {0}")]
    UnknownCommand(String),

    /// A property the verb cannot work without is absent
    #[error("Command {command} requires a '{property}' property")]
    MissingProperty {
        command: String,
        property: &'static str,
    },

    /// A numeric property did not parse
    #[error("Invalid {property} '{value}'")]
    InvalidNumber {
        property: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// The address text did not parse
    #[error("Invalid address '{address}'")]
    InvalidAddress {
        address: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The address parsed but names the wrong kind of device for the verb
    #[error("Address {address} is not a valid {capability} address")]
    WrongCapability {
        address: String,
        capability: &'static str,
    },

    /// A status filter expression did not compile
    #[error("Invalid status filter '{pattern}'")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CommandError {
    pub fn missing(command: impl Into<String>, property: &'static str) -> Self {
        Self::MissingProperty {
            command: command.into(),
            property,
        }
    }

    /// Parse `value` as a decimal integer, tagging failures with `property`
    pub fn parse_number<T>(property: &'static str, value: &str) -> CommandResult<T>
    where
        T: std::str::FromStr<Err = ParseIntError>,
    {
        value
            .trim()
            .parse()
            .map_err(|source| Self::InvalidNumber {
                property,
                value: value.to_string(),
                source,
            })
    }
}

/// A cached device exists at the key but has a different type
#[derive(Debug, Clone, Error)]
#[error("Device at {key} is not a {expected}")]
pub struct DeviceError {
    pub key: String,
    pub expected: &'static str,
}
