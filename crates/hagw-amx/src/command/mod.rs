//! AMX NI commands
//!
//! | verbs                            | command          |
//! |----------------------------------|------------------|
//! | ON, OFF, PULSE, CHANNEL_STATUS   | [`ChannelCommand`] |
//! | SEND_LEVEL, LEVEL_STATUS         | [`LevelCommand`]   |
//! | SEND_STRING, STRING_READ         | [`TextCommand`] (strings)  |
//! | SEND_COMMAND, COMMAND_READ       | [`TextCommand`] (commands) |

mod channel;
mod filter;
mod level;
mod text;

pub use channel::{ChannelCommand, ChannelVerb};
pub use filter::StatusFilter;
pub use level::{LevelCommand, LevelVerb};
pub use text::{TextCommand, TextKind, TextVerb};

use std::fmt;
use std::sync::Arc;

use hagw_core::{Command, DeviceError, SensorKind, SharedSensor};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmxVerb {
    Channel(ChannelVerb),
    Level(LevelVerb),
    Text(TextKind, TextVerb),
}

impl AmxVerb {
    /// Case-insensitive lookup
    pub fn from_name(name: &str) -> Option<Self> {
        let verb = match name.trim().to_ascii_uppercase().as_str() {
            "ON" => AmxVerb::Channel(ChannelVerb::On),
            "OFF" => AmxVerb::Channel(ChannelVerb::Off),
            "PULSE" => AmxVerb::Channel(ChannelVerb::Pulse),
            "CHANNEL_STATUS" => AmxVerb::Channel(ChannelVerb::Status),
            "SEND_LEVEL" => AmxVerb::Level(LevelVerb::Send),
            "LEVEL_STATUS" => AmxVerb::Level(LevelVerb::Status),
            "SEND_STRING" => AmxVerb::Text(TextKind::String, TextVerb::Send),
            "STRING_READ" => AmxVerb::Text(TextKind::String, TextVerb::Read),
            "SEND_COMMAND" => AmxVerb::Text(TextKind::Command, TextVerb::Send),
            "COMMAND_READ" => AmxVerb::Text(TextKind::Command, TextVerb::Read),
            _ => return None,
        };
        Some(verb)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AmxVerb::Channel(v) => v.as_str(),
            AmxVerb::Level(v) => v.as_str(),
            AmxVerb::Text(kind, verb) => kind.verb_name(*verb),
        }
    }
}

impl fmt::Display for AmxVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Push a device value into a sensor according to the sensor's kind
///
/// Switch and custom sensors take the text as is; range sensors need an
/// integer and level sensors get it clamped to 0..=100.
pub fn update_sensor_with_value(sensor: &SharedSensor, value: &str) {
    match sensor.kind() {
        SensorKind::Switch | SensorKind::Custom => sensor.update(value),
        SensorKind::Range | SensorKind::Level => match value.trim().parse::<i64>() {
            Ok(number) => {
                let number = if sensor.kind() == SensorKind::Level {
                    number.clamp(0, 100)
                } else {
                    number
                };
                sensor.update(&number.to_string());
            }
            Err(_) => warn!(
                sensor = sensor.id(),
                value, "Value is not a number, sensor not updated"
            ),
        },
    }
}

/// A built AMX command of any family
#[derive(Clone)]
pub enum AmxCommand {
    Channel(Arc<ChannelCommand>),
    Level(Arc<LevelCommand>),
    Text(Arc<TextCommand>),
}

impl Command for AmxCommand {
    fn name(&self) -> &str {
        match self {
            AmxCommand::Channel(c) => c.verb().as_str(),
            AmxCommand::Level(c) => c.verb().as_str(),
            AmxCommand::Text(c) => c.kind().verb_name(c.verb()),
        }
    }

    fn send(&self) {
        match self {
            AmxCommand::Channel(c) => c.send(),
            AmxCommand::Level(c) => c.send(),
            AmxCommand::Text(c) => c.send(),
        }
    }

    fn set_sensor(&self, sensor: SharedSensor) -> Result<(), DeviceError> {
        match self {
            AmxCommand::Channel(c) => c.set_sensor(sensor),
            AmxCommand::Level(c) => c.set_sensor(sensor),
            AmxCommand::Text(c) => c.set_sensor(sensor),
        }
    }

    fn stop(&self, sensor: &SharedSensor) {
        match self {
            AmxCommand::Channel(c) => c.stop(sensor),
            AmxCommand::Level(c) => c.stop(sensor),
            AmxCommand::Text(c) => c.stop(sensor),
        }
    }
}

impl fmt::Debug for AmxCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index = match self {
            AmxCommand::Channel(c) => c.device_index(),
            AmxCommand::Level(c) => c.device_index(),
            AmxCommand::Text(c) => c.device_index(),
        };
        f.debug_struct("AmxCommand")
            .field("verb", &self.name())
            .field("device_index", &index)
            .finish()
    }
}
