use std::sync::{Arc, Weak};

use hagw_core::{CommandError, CommandResult, DeviceError, SensorSet, SharedSensor};
use tracing::{debug, warn};

use super::{update_sensor_with_value, StatusFilter};
use crate::gateway::AmxGateway;
use crate::message::AmxMessage;

/// Strings and commands travel the same way on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKind {
    String,
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextVerb {
    Send,
    Read,
}

impl TextKind {
    pub fn verb_name(&self, verb: TextVerb) -> &'static str {
        match (self, verb) {
            (TextKind::String, TextVerb::Send) => "SEND_STRING",
            (TextKind::String, TextVerb::Read) => "STRING_READ",
            (TextKind::Command, TextVerb::Send) => "SEND_COMMAND",
            (TextKind::Command, TextVerb::Read) => "COMMAND_READ",
        }
    }
}

/// Sends a string or command to a device index, or forwards what it reads
pub struct TextCommand {
    kind: TextKind,
    verb: TextVerb,
    device_index: u32,
    value: Option<String>,
    filter: Option<StatusFilter>,
    gateway: AmxGateway,
    sensors: SensorSet,
    this: Weak<TextCommand>,
}

impl TextCommand {
    pub fn build(
        kind: TextKind,
        verb: TextVerb,
        device_index: u32,
        value: Option<&str>,
        filter: Option<StatusFilter>,
        gateway: AmxGateway,
    ) -> CommandResult<Arc<Self>> {
        let name = kind.verb_name(verb);
        let value = match verb {
            TextVerb::Send => Some(
                value
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| CommandError::missing(name, "value"))?
                    .to_string(),
            ),
            TextVerb::Read => None,
        };
        let filter = match (verb, filter) {
            (TextVerb::Send, Some(filter)) => {
                warn!(verb = name, pattern = filter.pattern(), "Status filter ignored");
                None
            }
            (_, filter) => filter,
        };
        Ok(Arc::new_cyclic(|this| Self {
            kind,
            verb,
            device_index,
            value,
            filter,
            gateway,
            sensors: SensorSet::new(),
            this: this.clone(),
        }))
    }

    pub fn kind(&self) -> TextKind {
        self.kind
    }

    pub fn verb(&self) -> TextVerb {
        self.verb
    }

    pub fn device_index(&self) -> u32 {
        self.device_index
    }

    pub fn filter(&self) -> Option<&StatusFilter> {
        self.filter.as_ref()
    }

    pub fn send(&self) {
        match &self.value {
            Some(value) => self.gateway.send_command(
                AmxMessage::new(self.kind.verb_name(self.verb), self.device_index).field(value),
            ),
            None => debug!(device_index = self.device_index, "Nothing to send"),
        }
    }

    /// Reads cannot be queried, so no initial status is requested
    pub fn set_sensor(&self, sensor: SharedSensor) -> Result<(), DeviceError> {
        let device = self.gateway.text_device(self.device_index, self.kind)?;
        if self.sensors.add(sensor) {
            device.add_command(self.this.clone());
        }
        Ok(())
    }

    pub fn stop(&self, sensor: &SharedSensor) {
        if self.sensors.remove(sensor) {
            match self.gateway.text_device(self.device_index, self.kind) {
                Ok(device) => device.remove_command(&self.this),
                Err(e) => warn!(%e, "Cannot deregister from device"),
            }
        }
    }

    pub fn update_sensors(&self, text: &str) {
        let forwarded = match &self.filter {
            Some(filter) => match filter.apply(text) {
                Some(matched) => matched,
                None => return,
            },
            None => text,
        };
        for sensor in self.sensors.snapshot() {
            update_sensor_with_value(&sensor, forwarded);
        }
    }
}
